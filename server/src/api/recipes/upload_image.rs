use crate::api::recipes::RecipeDetail;
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::catalog::writer;
use crate::config::Config;
use crate::error::{AppError, FieldErrors};
use crate::images::processing::validate_image;
use crate::store::Store;
use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, Path, State,
    },
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use utoipa::ToSchema;

const FIELD: &str = "image";

#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadImageRequest {
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}

fn image_error(message: impl Into<String>) -> AppError {
    AppError::Validation(FieldErrors::single(FIELD, message))
}

fn multipart_error(e: MultipartError, max_bytes: usize) -> AppError {
    tracing::warn!("Multipart read error: {}", e);
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        image_error(format!("Image too large. Maximum size is {} bytes", max_bytes))
    } else {
        AppError::BadRequest(format!("Failed to read multipart data: {}", e.body_text()))
    }
}

/// First `image` field in the form, if any.
async fn read_image_field(
    multipart: &mut Multipart,
    max_bytes: usize,
) -> Result<Option<Bytes>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_bytes))?
    {
        if field.name() == Some(FIELD) {
            let data = field
                .bytes()
                .await
                .map_err(|e| multipart_error(e, max_bytes))?;
            return Ok(Some(data));
        }
    }
    Ok(None)
}

/// Replace the recipe's image. The previous image is not deleted.
#[utoipa::path(
    post,
    path = "/api/recipes/{id}/upload-image",
    tag = "recipes",
    params(
        ("id" = i64, Path, description = "Recipe ID")
    ),
    request_body(content_type = "multipart/form-data", content = UploadImageRequest),
    responses(
        (status = 200, description = "Image attached", body = RecipeDetail),
        (status = 400, description = "Missing, oversized or undecodable image", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_image(
    AuthUser { user, .. }: AuthUser,
    State(store): State<Store>,
    State(config): State<Arc<Config>>,
    Path(id): Path<i64>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<RecipeDetail>, AppError> {
    let max_bytes = config.max_image_bytes;
    let data = match multipart {
        Ok(mut multipart) => read_image_field(&mut multipart, max_bytes).await?,
        Err(rejection) => {
            tracing::warn!("Upload without a multipart body: {}", rejection.body_text());
            None
        }
    };

    let owner = user.id;
    let recipe = store
        .transaction(move |repo| {
            if repo.find_recipe(owner, id)?.is_none() {
                return Err(AppError::NotFound("Recipe"));
            }
            let Some(data) = data else {
                return Err(image_error("No file was submitted."));
            };
            let content_type = validate_image(&data, max_bytes).map_err(|e| {
                tracing::warn!(user_id = owner, recipe_id = id, "Rejected image upload: {}", e);
                image_error(e)
            })?;
            writer::attach_image(repo, owner, id, &content_type, &data)
        })
        .await?;

    tracing::info!(
        user_id = owner,
        recipe_id = id,
        image_id = ?recipe.row.image_id,
        "Image attached"
    );

    Ok(Json(recipe.into()))
}
