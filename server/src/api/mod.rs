pub mod images;
pub mod labels;
pub mod public;
pub mod recipes;
pub mod testing;
pub mod users;


use std::collections::BTreeMap;

use axum::extract::FromRequest;
use axum::Router;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{OpenApi, ToSchema};

use crate::config::Config;
use crate::error::AppError;
use crate::models::LabelKind;
use crate::AppState;
use labels::Capabilities;

/// Shared error response used by all endpoints
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Validation messages keyed by request field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, Vec<String>>>,
}

impl ErrorResponse {
    pub fn new(error: String) -> Self {
        Self {
            error,
            fields: None,
        }
    }
}

/// `axum::Json` whose rejection is a 400 [`ErrorResponse`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Tells an omitted field (`None`) apart from an explicit `null` (`Some(None)`).
/// Pair with `#[serde(default)]`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Every route the service exposes, without state or middleware.
pub fn router(config: &Config) -> Router<AppState> {
    let label_caps = Capabilities::READ_WRITE;

    Router::new()
        .merge(public::router())
        .merge(users::router())
        .nest("/api/test", testing::router())
        .nest("/api/recipes", recipes::router(config.max_image_bytes))
        .nest("/api/images", images::router())
        .nest("/api/tags", labels::router(LabelKind::Tag, label_caps))
        .nest(
            "/api/ingredients",
            labels::router(LabelKind::Ingredient, label_caps),
        )
}

/// Generate the complete OpenAPI spec by merging all module specs
pub fn openapi() -> utoipa::openapi::OpenApi {
    #[derive(OpenApi)]
    #[openapi(components(schemas(ErrorResponse)))]
    struct BaseApi;

    let mut spec = BaseApi::openapi();

    if let Some(components) = spec.components.as_mut() {
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }

    let modules: Vec<utoipa::openapi::OpenApi> = vec![
        public::ApiDoc::openapi(),
        testing::ApiDoc::openapi(),
        users::ApiDoc::openapi(),
        recipes::ApiDoc::openapi(),
        images::ApiDoc::openapi(),
        labels::openapi(),
    ];

    for module_spec in modules {
        spec.paths.paths.extend(module_spec.paths.paths);

        if let Some(module_components) = module_spec.components {
            if let Some(spec_components) = spec.components.as_mut() {
                spec_components.schemas.extend(module_components.schemas);
            }
        }
    }

    spec
}
