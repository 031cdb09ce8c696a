pub mod testing;
pub mod users;

use crate::AppState;
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for public endpoints (no auth required)
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/test/unauthed-ping",
            get(testing::unauthed_ping::unauthed_ping),
        )
        .route("/api/users", post(users::register::register))
        .route("/api/users/login", post(users::login::login))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        users::login::login,
        users::register::register,
        testing::unauthed_ping::unauthed_ping,
    ),
    components(schemas(
        users::login::LoginRequest,
        users::login::LoginResponse,
        users::register::RegisterRequest,
        users::register::RegisterResponse,
        testing::unauthed_ping::UnauthedPingResponse,
    ))
)]
pub struct ApiDoc;
