use crate::api::{ApiJson, ErrorResponse};
use crate::auth::{self, validate_registration};
use crate::config::Config;
use crate::error::AppError;
use crate::store::Store;
use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    /// Must repeat `password`
    pub password2: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    pub id: i64,
    pub email: String,
    pub date_joined: DateTime<Utc>,
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "auth",
    request_body(
        content = RegisterRequest,
        example = json!({"email": "cook@example.com", "password": "s3cret-pass", "password2": "s3cret-pass"})
    ),
    responses(
        (status = 201, description = "User created", body = RegisterResponse),
        (status = 400, description = "Invalid fields or email already registered", body = ErrorResponse)
    )
)]
pub async fn register(
    State(store): State<Store>,
    State(config): State<Arc<Config>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let registration = validate_registration(req.email, req.password, req.password2)?;

    let password_hash =
        auth::hash_new_password(registration.password, config.insecure_password_hashing).await?;

    let email = registration.email;
    let user = store
        .transaction(move |repo| auth::register(repo, &email, &password_hash))
        .await?;

    tracing::info!(user_id = user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            email: user.email,
            date_joined: user.date_joined,
        }),
    ))
}
