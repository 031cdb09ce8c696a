use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::LabelKind;
use crate::store::Store;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension,
};

/// Removes the label and detaches it from every recipe that carried it.
#[utoipa::path(
    delete,
    path = "/api/tags/{id}",
    tag = "tags",
    operation_id = "delete_tag",
    params(
        ("id" = i64, Path, description = "Tag ID")
    ),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Not found or not owned by the caller", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_label(
    AuthUser { user, .. }: AuthUser,
    Extension(kind): Extension<LabelKind>,
    State(store): State<Store>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let owner = user.id;
    let deleted = store
        .transaction(move |repo| Ok(repo.delete_label(kind, owner, id)?))
        .await?;

    if !deleted {
        return Err(AppError::NotFound(kind.display_name()));
    }

    tracing::info!(user_id = owner, label_id = id, "{} deleted", kind.display_name());
    Ok(StatusCode::NO_CONTENT)
}
