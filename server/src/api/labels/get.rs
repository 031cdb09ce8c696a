use crate::api::labels::LabelResponse;
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::LabelKind;
use crate::store::Store;
use axum::{
    extract::{Path, State},
    Extension, Json,
};

#[utoipa::path(
    get,
    path = "/api/tags/{id}",
    tag = "tags",
    operation_id = "get_tag",
    params(
        ("id" = i64, Path, description = "Tag ID")
    ),
    responses(
        (status = 200, description = "The label", body = LabelResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Not found or not owned by the caller", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_label(
    AuthUser { user, .. }: AuthUser,
    Extension(kind): Extension<LabelKind>,
    State(store): State<Store>,
    Path(id): Path<i64>,
) -> Result<Json<LabelResponse>, AppError> {
    let owner = user.id;
    let label = store
        .transaction(move |repo| Ok(repo.find_label(kind, owner, id)?))
        .await?
        .ok_or(AppError::NotFound(kind.display_name()))?;

    Ok(Json(LabelResponse::new(kind, label)))
}
