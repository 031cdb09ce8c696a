use crate::api::labels::{LabelRequest, LabelResponse};
use crate::api::{ApiJson, ErrorResponse};
use crate::auth::AuthUser;
use crate::catalog::validation::validate_label_text;
use crate::error::{AppError, FieldErrors};
use crate::models::LabelKind;
use crate::store::Store;
use axum::{
    extract::{Path, State},
    Extension, Json,
};

/// Rename the label. With `full`, the text field is required; otherwise an
/// absent field leaves the label as it is.
async fn apply_update(
    kind: LabelKind,
    owner: i64,
    id: i64,
    request: LabelRequest,
    full: bool,
    store: Store,
) -> Result<Json<LabelResponse>, AppError> {
    let field = kind.text_field();
    let text = match request.text(kind) {
        Some(text) => {
            Some(validate_label_text(&text).map_err(|e| AppError::Validation(FieldErrors::single(field, e)))?)
        }
        None if full => {
            return Err(AppError::Validation(FieldErrors::single(
                field,
                "This field is required.",
            )))
        }
        None => None,
    };

    let label = store
        .transaction(move |repo| {
            Ok(match text {
                Some(text) => repo.rename_label(kind, owner, id, &text)?,
                None => repo.find_label(kind, owner, id)?,
            })
        })
        .await?
        .ok_or(AppError::NotFound(kind.display_name()))?;

    Ok(Json(LabelResponse::new(kind, label)))
}

#[utoipa::path(
    put,
    path = "/api/tags/{id}",
    tag = "tags",
    operation_id = "update_tag",
    params(
        ("id" = i64, Path, description = "Tag ID")
    ),
    request_body = LabelRequest,
    responses(
        (status = 200, description = "Renamed label", body = LabelResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Not found or not owned by the caller", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_label(
    AuthUser { user, .. }: AuthUser,
    Extension(kind): Extension<LabelKind>,
    State(store): State<Store>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<LabelRequest>,
) -> Result<Json<LabelResponse>, AppError> {
    apply_update(kind, user.id, id, request, true, store).await
}

#[utoipa::path(
    patch,
    path = "/api/tags/{id}",
    tag = "tags",
    operation_id = "partial_update_tag",
    params(
        ("id" = i64, Path, description = "Tag ID")
    ),
    request_body = LabelRequest,
    responses(
        (status = 200, description = "Updated label", body = LabelResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Not found or not owned by the caller", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn partial_update_label(
    AuthUser { user, .. }: AuthUser,
    Extension(kind): Extension<LabelKind>,
    State(store): State<Store>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<LabelRequest>,
) -> Result<Json<LabelResponse>, AppError> {
    apply_update(kind, user.id, id, request, false, store).await
}
