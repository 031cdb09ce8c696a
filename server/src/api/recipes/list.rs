use crate::api::recipes::RecipeSummary;
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::catalog::writer;
use crate::error::AppError;
use crate::store::Store;
use axum::{extract::State, Json};

#[utoipa::path(
    get,
    path = "/api/recipes",
    tag = "recipes",
    responses(
        (status = 200, description = "The caller's recipes, newest first", body = Vec<RecipeSummary>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_recipes(
    AuthUser { user, .. }: AuthUser,
    State(store): State<Store>,
) -> Result<Json<Vec<RecipeSummary>>, AppError> {
    let owner = user.id;
    let recipes = store
        .transaction(move |repo| writer::list_recipes(repo, owner))
        .await?;

    Ok(Json(recipes.into_iter().map(Into::into).collect()))
}
