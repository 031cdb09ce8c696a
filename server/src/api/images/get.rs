use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::store::Store;
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use uuid::Uuid;

/// Raw bytes of an uploaded recipe image, served only to its owner.
#[utoipa::path(
    get,
    path = "/api/images/{id}",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Image ID")
    ),
    responses(
        (status = 200, description = "Image bytes", content_type = "application/octet-stream"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Image not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_image(
    AuthUser { user, .. }: AuthUser,
    State(store): State<Store>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let owner = user.id;
    let image = store
        .transaction(move |repo| Ok(repo.find_image(owner, id)?))
        .await?
        .ok_or(AppError::NotFound("Image"))?;

    Ok((
        [
            (header::CONTENT_TYPE, image.content_type),
            (header::CACHE_CONTROL, "private, max-age=86400".to_string()),
        ],
        image.data,
    ))
}
