use crate::api::{ApiJson, ErrorResponse};
use crate::auth;
use crate::config::Config;
use crate::error::{AppError, FieldErrors};
use crate::store::Store;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

#[utoipa::path(
    post,
    path = "/api/users/login",
    tag = "auth",
    request_body(content = LoginRequest, example = json!({"email": "cook@example.com", "password": "s3cret-pass"})),
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing fields or invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(store): State<Store>,
    State(config): State<Arc<Config>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let mut missing = FieldErrors::new();
    let email = req.email.filter(|e| !e.trim().is_empty());
    let password = req.password.filter(|p| !p.is_empty());
    if email.is_none() {
        missing.add("email", "This field is required.");
    }
    if password.is_none() {
        missing.add("password", "This field is required.");
    }
    let (Some(email), Some(password)) = (email, password) else {
        return Err(AppError::Validation(missing));
    };

    let user = store
        .transaction(move |repo| auth::find_login_user(repo, &email))
        .await?;
    let user = auth::verify_credentials(user, password).await?;

    let (user_id, ttl_days) = (user.id, config.token_ttl_days);
    let token = store
        .transaction(move |repo| auth::start_session(repo, user_id, ttl_days))
        .await?;

    tracing::info!(user_id = user.id, "User logged in");
    Ok(Json(LoginResponse { token }))
}
