use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PingResponse {
    pub message: String,
    pub user_id: i64,
}

#[utoipa::path(
    get,
    path = "/api/test/ping",
    tag = "testing",
    responses(
        (status = 200, description = "Authenticated ping response", body = PingResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn ping(AuthUser { user, .. }: AuthUser) -> Json<PingResponse> {
    Json(PingResponse {
        message: "ping".to_string(),
        user_id: user.id,
    })
}
