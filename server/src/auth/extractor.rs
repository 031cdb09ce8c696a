use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::Utc;

use super::crypto::hash_token;
use crate::error::AppError;
use crate::models::User;
use crate::store::Store;

/// Extractor that validates the Authorization header and provides the authenticated user.
///
/// Accepts `Bearer <token>` and `Token <token>`.
/// ```ignore
/// async fn my_handler(AuthUser { user, .. }: AuthUser) -> impl IntoResponse {
///     // user is the authenticated User
/// }
/// ```
pub struct AuthUser {
    pub user: User,
    /// Digest of the presented token, needed to revoke it.
    pub token_hash: String,
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or(AppError::Unauthorized("Missing Authorization header"))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header"))?;

    auth_str
        .strip_prefix("Bearer ")
        .or_else(|| auth_str.strip_prefix("Token "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AppError::Unauthorized("Invalid Authorization header format"))
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Store: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let store = Store::from_ref(state);
        let token_hash = hash_token(bearer_token(parts)?);

        let lookup = token_hash.clone();
        let user = store
            .transaction(move |repo| Ok(repo.find_user_by_token(&lookup, Utc::now())?))
            .await?
            .ok_or(AppError::Unauthorized("Invalid or expired token"))?;

        Ok(AuthUser { user, token_hash })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(header_value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/recipes");
        if let Some(value) = header_value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_accepts_bearer_and_token_schemes() {
        assert_eq!(bearer_token(&parts(Some("Bearer abc"))).unwrap(), "abc");
        assert_eq!(bearer_token(&parts(Some("Token abc"))).unwrap(), "abc");
    }

    #[test]
    fn test_rejects_missing_or_malformed_header() {
        assert!(matches!(
            bearer_token(&parts(None)),
            Err(AppError::Unauthorized("Missing Authorization header"))
        ));
        assert!(matches!(
            bearer_token(&parts(Some("Basic abc"))),
            Err(AppError::Unauthorized("Invalid Authorization header format"))
        ));
        assert!(bearer_token(&parts(Some("Bearer "))).is_err());
    }
}
