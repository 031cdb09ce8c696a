use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::catalog::writer;
use crate::error::AppError;
use crate::store::Store;
use axum::{
    extract::{Path, State},
    http::StatusCode,
};

/// Tags, ingredients and the image blob are kept.
#[utoipa::path(
    delete,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_recipe(
    AuthUser { user, .. }: AuthUser,
    State(store): State<Store>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let owner = user.id;
    store
        .transaction(move |repo| writer::delete_recipe(repo, owner, id))
        .await?;

    tracing::info!(user_id = owner, recipe_id = id, "Recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}
