use crate::api::recipes::RecipeDetail;
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::catalog::writer;
use crate::error::AppError;
use crate::store::Store;
use axum::{
    extract::{Path, State},
    Json,
};

#[utoipa::path(
    get,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe with description", body = RecipeDetail),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_recipe(
    AuthUser { user, .. }: AuthUser,
    State(store): State<Store>,
    Path(id): Path<i64>,
) -> Result<Json<RecipeDetail>, AppError> {
    let owner = user.id;
    let recipe = store
        .transaction(move |repo| writer::load_recipe(repo, owner, id))
        .await?;

    Ok(Json(recipe.into()))
}
