use crate::api::labels::{LabelRequest, LabelResponse};
use crate::api::{ApiJson, ErrorResponse};
use crate::auth::AuthUser;
use crate::catalog::resolver::resolve_label;
use crate::catalog::validation::validate_label_text;
use crate::config::Config;
use crate::error::{AppError, FieldErrors};
use crate::models::LabelKind;
use crate::store::Store;
use axum::{extract::State, http::StatusCode, Extension, Json};
use std::sync::Arc;

/// Only mounted when the router's capabilities include `create`. An existing
/// label with the same text is returned instead of a duplicate.
#[utoipa::path(
    post,
    path = "/api/tags",
    tag = "tags",
    operation_id = "create_tag",
    request_body = LabelRequest,
    responses(
        (status = 201, description = "Label created or found", body = LabelResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_label(
    AuthUser { user, .. }: AuthUser,
    Extension(kind): Extension<LabelKind>,
    State(store): State<Store>,
    State(config): State<Arc<Config>>,
    ApiJson(request): ApiJson<LabelRequest>,
) -> Result<(StatusCode, Json<LabelResponse>), AppError> {
    let field = kind.text_field();
    let text = request
        .text(kind)
        .ok_or_else(|| AppError::Validation(FieldErrors::single(field, "This field is required.")))?;
    let text =
        validate_label_text(&text).map_err(|e| AppError::Validation(FieldErrors::single(field, e)))?;

    let owner = user.id;
    let mode = config.label_match;
    let label = store
        .transaction(move |repo| Ok(resolve_label(repo, kind, owner, &text, mode)?))
        .await?;

    Ok((StatusCode::CREATED, Json(LabelResponse::new(kind, label))))
}
