use crate::api::ErrorResponse;
use crate::auth::{self, AuthUser};
use crate::error::AppError;
use crate::store::Store;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LogoutResponse {
    pub detail: String,
}

/// Revokes the token used for this request. Other tokens of the same user stay valid.
#[utoipa::path(
    post,
    path = "/api/users/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Token revoked", body = LogoutResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn logout(
    AuthUser { user, token_hash }: AuthUser,
    State(store): State<Store>,
) -> Result<Json<LogoutResponse>, AppError> {
    store
        .transaction(move |repo| Ok(auth::logout(repo, &token_hash)?))
        .await?;

    tracing::info!(user_id = user.id, "User logged out");
    Ok(Json(LogoutResponse {
        detail: "Successfully logged out.".to_string(),
    }))
}
