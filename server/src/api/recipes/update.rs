use crate::api::recipes::{RecipeDetail, RecipeRequest};
use crate::api::{ApiJson, ErrorResponse};
use crate::auth::AuthUser;
use crate::catalog::validation::RecipeInput;
use crate::catalog::writer;
use crate::config::Config;
use crate::error::AppError;
use crate::store::Store;
use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

/// Someone else's recipe is a 404 even when the body is also invalid.
async fn apply_update(
    owner: i64,
    id: i64,
    request: RecipeRequest,
    full: bool,
    store: Store,
    config: &Config,
) -> Result<Json<RecipeDetail>, AppError> {
    let input = RecipeInput::from(request);

    let mode = config.label_match;
    let recipe = store
        .transaction(move |repo| {
            if repo.find_recipe(owner, id)?.is_none() {
                return Err(AppError::NotFound("Recipe"));
            }
            let patch = input.validate_update(full)?;
            writer::update_recipe(repo, owner, id, &patch, mode)
        })
        .await?;

    Ok(Json(recipe.into()))
}

/// Full update: `title`, `time_minutes` and `price` are required.
#[utoipa::path(
    put,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = i64, Path, description = "Recipe ID")
    ),
    request_body = RecipeRequest,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeDetail),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_recipe(
    AuthUser { user, .. }: AuthUser,
    State(store): State<Store>,
    State(config): State<Arc<Config>>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<RecipeRequest>,
) -> Result<Json<RecipeDetail>, AppError> {
    apply_update(user.id, id, request, true, store, &config).await
}

#[utoipa::path(
    patch,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = i64, Path, description = "Recipe ID")
    ),
    request_body = RecipeRequest,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeDetail),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn partial_update_recipe(
    AuthUser { user, .. }: AuthUser,
    State(store): State<Store>,
    State(config): State<Arc<Config>>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<RecipeRequest>,
) -> Result<Json<RecipeDetail>, AppError> {
    apply_update(user.id, id, request, false, store, &config).await
}
