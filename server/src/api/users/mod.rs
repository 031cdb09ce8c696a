pub mod logout;

use crate::AppState;
use axum::routing::post;
use axum::Router;
use utoipa::OpenApi;

/// Authenticated account endpoints. Register and login live in [`super::public`].
pub fn router() -> Router<AppState> {
    Router::new().route("/api/users/logout", post(logout::logout))
}

#[derive(OpenApi)]
#[openapi(paths(logout::logout), components(schemas(logout::LogoutResponse)))]
pub struct ApiDoc;
