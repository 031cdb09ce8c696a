pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod update;
pub mod upload_image;

use crate::api::labels::{IngredientResponse, TagResponse};
use crate::api::nullable;
use crate::catalog::validation::RecipeInput;
use crate::catalog::writer::Recipe;
use crate::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

/// Room for multipart boundaries and headers on top of the image itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Returns the router for /api/recipes endpoints (mounted at /api/recipes)
pub fn router(max_image_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(list::list_recipes).post(create::create_recipe))
        .route(
            "/{id}",
            get(get::get_recipe)
                .put(update::update_recipe)
                .patch(update::partial_update_recipe)
                .delete(delete::delete_recipe),
        )
        .route(
            "/{id}/upload-image",
            post(upload_image::upload_image).layer(DefaultBodyLimit::max(
                max_image_bytes.saturating_add(MULTIPART_OVERHEAD),
            )),
        )
}

pub fn image_url(id: Uuid) -> String {
    format!("/api/images/{}", id)
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TagRequest {
    pub title: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IngredientRequest {
    pub name: String,
}

/// Body for create, PUT and PATCH.
///
/// Omitting `tags` or `ingredients` leaves them untouched on update; an empty
/// list clears them. Only `description` and `link` may be set to `null`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RecipeRequest {
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<i64>)]
    pub time_minutes: Option<Option<i64>>,
    /// Decimal with at most two fraction digits, as a string or a number
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, example = "5.25")]
    pub price: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub link: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<Vec<TagRequest>>)]
    pub tags: Option<Option<Vec<TagRequest>>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<Vec<IngredientRequest>>)]
    pub ingredients: Option<Option<Vec<IngredientRequest>>>,
}

/// Unwraps a field that does not accept `null`, noting it in `nulls` if it was.
fn non_null<T>(
    nulls: &mut Vec<&'static str>,
    field: &'static str,
    value: Option<Option<T>>,
) -> Option<T> {
    match value {
        Some(None) => {
            nulls.push(field);
            None
        }
        value => value.flatten(),
    }
}

impl From<RecipeRequest> for RecipeInput {
    fn from(request: RecipeRequest) -> Self {
        let mut nulls = Vec::new();
        let title = non_null(&mut nulls, "title", request.title);
        let time_minutes = non_null(&mut nulls, "time_minutes", request.time_minutes);
        let price = non_null(&mut nulls, "price", request.price);
        let tags = non_null(&mut nulls, "tags", request.tags);
        let ingredients = non_null(&mut nulls, "ingredients", request.ingredients);

        RecipeInput {
            title,
            description: request.description,
            time_minutes,
            price,
            link: request.link,
            tags: tags.map(|tags| tags.into_iter().map(|t| t.title).collect()),
            ingredients: ingredients
                .map(|ingredients| ingredients.into_iter().map(|i| i.name).collect()),
            nulls,
        }
    }
}

/// List view of a recipe. `description` is only in [`RecipeDetail`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecipeSummary {
    pub id: i64,
    pub title: String,
    pub time_minutes: i32,
    #[schema(value_type = String, example = "5.25")]
    pub price: Decimal,
    pub link: Option<String>,
    /// URL of the attached image
    pub image: Option<String>,
    pub tags: Vec<TagResponse>,
    pub ingredients: Vec<IngredientResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecipeDetail {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub time_minutes: i32,
    #[schema(value_type = String, example = "5.25")]
    pub price: Decimal,
    pub link: Option<String>,
    pub image: Option<String>,
    pub tags: Vec<TagResponse>,
    pub ingredients: Vec<IngredientResponse>,
}

impl From<Recipe> for RecipeSummary {
    fn from(recipe: Recipe) -> Self {
        let row = recipe.row;
        Self {
            id: row.id,
            title: row.title,
            time_minutes: row.time_minutes,
            price: row.price,
            link: row.link,
            image: row.image_id.map(image_url),
            tags: recipe.tags.into_iter().map(Into::into).collect(),
            ingredients: recipe.ingredients.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<Recipe> for RecipeDetail {
    fn from(recipe: Recipe) -> Self {
        let row = recipe.row;
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            time_minutes: row.time_minutes,
            price: row.price,
            link: row.link,
            image: row.image_id.map(image_url),
            tags: recipe.tags.into_iter().map(Into::into).collect(),
            ingredients: recipe.ingredients.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list::list_recipes,
        create::create_recipe,
        get::get_recipe,
        update::update_recipe,
        update::partial_update_recipe,
        delete::delete_recipe,
        upload_image::upload_image,
    ),
    components(schemas(
        RecipeRequest,
        TagRequest,
        IngredientRequest,
        RecipeSummary,
        RecipeDetail,
        upload_image::UploadImageRequest,
    ))
)]
pub struct ApiDoc;
