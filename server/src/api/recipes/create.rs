use crate::api::recipes::{RecipeDetail, RecipeRequest};
use crate::api::{ApiJson, ErrorResponse};
use crate::auth::AuthUser;
use crate::catalog::validation::RecipeInput;
use crate::catalog::writer;
use crate::config::Config;
use crate::error::AppError;
use crate::store::Store;
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/api/recipes",
    tag = "recipes",
    request_body(
        content = RecipeRequest,
        example = json!({
            "title": "Thai prawn curry",
            "time_minutes": 30,
            "price": "12.50",
            "tags": [{"title": "Thai"}, {"title": "Dinner"}],
            "ingredients": [{"name": "Prawns"}, {"name": "Coconut milk"}]
        })
    ),
    responses(
        (status = 201, description = "Recipe created", body = RecipeDetail),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_recipe(
    AuthUser { user, .. }: AuthUser,
    State(store): State<Store>,
    State(config): State<Arc<Config>>,
    ApiJson(request): ApiJson<RecipeRequest>,
) -> Result<(StatusCode, Json<RecipeDetail>), AppError> {
    let draft = RecipeInput::from(request).validate_new()?;

    let owner = user.id;
    let mode = config.label_match;
    let recipe = store
        .transaction(move |repo| writer::create_recipe(repo, owner, &draft, mode))
        .await?;

    tracing::info!(
        user_id = owner,
        recipe_id = recipe.row.id,
        tags = recipe.tags.len(),
        ingredients = recipe.ingredients.len(),
        "Recipe created"
    );

    Ok((StatusCode::CREATED, Json(recipe.into())))
}
