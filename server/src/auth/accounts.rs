use chrono::{Duration, Utc};

use super::crypto::{generate_token, hash_password, hash_token, verify_password};
use crate::error::{AppError, FieldErrors};
use crate::models::User;
use crate::store::{Repository, StoreError};

const PASSWORD_MIN_LEN: usize = 8;
const INVALID_CREDENTIALS: &str = "Unable to authenticate with provided credentials.";

/// Checked registration input.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub email: String,
    pub password: String,
}

/// `local@domain` with no whitespace. The domain part is lowercased.
pub fn normalize_email(email: &str) -> Result<String, String> {
    let email = email.trim();
    let invalid = || "Enter a valid email address.".to_string();

    let (local, domain) = email.rsplit_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.is_empty()
        || domain.contains('@')
        || email.chars().any(char::is_whitespace)
    {
        return Err(invalid());
    }
    Ok(format!("{}@{}", local, domain.to_lowercase()))
}

pub fn check_password(password: &str, email: &str) -> Vec<String> {
    let mut problems = Vec::new();

    if password.chars().count() < PASSWORD_MIN_LEN {
        problems.push(format!(
            "This password is too short. It must contain at least {} characters.",
            PASSWORD_MIN_LEN
        ));
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        problems.push("This password is entirely numeric.".to_string());
    }

    let lowered = password.to_lowercase();
    let email = email.to_lowercase();
    let local = email.split('@').next().unwrap_or_default();
    if lowered == email || (!local.is_empty() && lowered == local) {
        problems.push("The password is too similar to the email.".to_string());
    }

    problems
}

pub fn validate_registration(
    email: Option<String>,
    password: Option<String>,
    password2: Option<String>,
) -> Result<Registration, AppError> {
    let mut errors = FieldErrors::new();

    let email = match email {
        Some(email) if !email.trim().is_empty() => match normalize_email(&email) {
            Ok(email) => Some(email),
            Err(message) => {
                errors.add("email", message);
                None
            }
        },
        _ => {
            errors.add("email", "This field is required.");
            None
        }
    };

    let password = match password {
        Some(password) if !password.is_empty() => Some(password),
        _ => {
            errors.add("password", "This field is required.");
            None
        }
    };

    if let Some(password) = &password {
        for problem in check_password(password, email.as_deref().unwrap_or_default()) {
            errors.add("password", problem);
        }
        if password2.as_deref() != Some(password.as_str()) {
            errors.add("password2", "Passwords must match.");
        }
    }

    errors.into_result()?;

    match (email, password) {
        (Some(email), Some(password)) => Ok(Registration { email, password }),
        _ => Err(AppError::Internal("registration validated without fields".to_string())),
    }
}

/// Hash a new password on a blocking worker, outside any transaction.
pub async fn hash_new_password(
    password: String,
    insecure_hashing: bool,
) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password, insecure_hashing))
        .await
        .map_err(|e| AppError::Internal(format!("hashing worker failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))
}

/// Create the account from an already hashed password. A taken email is
/// reported on the `email` field.
pub fn register(
    repo: &mut dyn Repository,
    email: &str,
    password_hash: &str,
) -> Result<User, AppError> {
    match repo.insert_user(email, password_hash) {
        Ok(user) => Ok(user),
        Err(StoreError::Conflict(_)) => Err(email_taken()),
        Err(e) => Err(e.into()),
    }
}

fn email_taken() -> AppError {
    AppError::Validation(FieldErrors::single(
        "email",
        "user with this email already exists.",
    ))
}

fn rejected() -> AppError {
    AppError::Validation(FieldErrors::single("non_field_errors", INVALID_CREDENTIALS))
}

/// Account a login attempt is checked against.
pub fn find_login_user(repo: &mut dyn Repository, email: &str) -> Result<User, AppError> {
    let Ok(email) = normalize_email(email) else {
        return Err(rejected());
    };
    repo.find_user_by_email(&email)?.ok_or_else(rejected)
}

/// Wrong password and inactive account fail the same way as an unknown email.
pub fn check_credentials(user: User, password: &str) -> Result<User, AppError> {
    if user.is_active && verify_password(password, &user.password_hash) {
        Ok(user)
    } else {
        Err(rejected())
    }
}

/// [`check_credentials`] on a blocking worker.
pub async fn verify_credentials(user: User, password: String) -> Result<User, AppError> {
    tokio::task::spawn_blocking(move || check_credentials(user, &password))
        .await
        .map_err(|e| AppError::Internal(format!("hashing worker failed: {}", e)))?
}

/// Issue a token valid for `ttl_days` and record the login. Expired tokens
/// of every user are purged first.
pub fn start_session(
    repo: &mut dyn Repository,
    user_id: i64,
    ttl_days: i64,
) -> Result<String, AppError> {
    let now = Utc::now();
    let expires_at = Duration::try_days(ttl_days)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| {
            AppError::Internal(format!("token lifetime out of range: {} days", ttl_days))
        })?;

    let purged = repo.delete_expired_tokens(now)?;
    if purged > 0 {
        tracing::debug!(purged, "Removed expired tokens");
    }

    let token = issue_token(repo, user_id, expires_at)?;
    repo.record_login(user_id, now)?;
    Ok(token)
}

pub fn issue_token(
    repo: &mut dyn Repository,
    user_id: i64,
    expires_at: chrono::DateTime<Utc>,
) -> Result<String, StoreError> {
    let token = generate_token();
    repo.insert_token(user_id, &hash_token(&token), expires_at)?;
    Ok(token)
}

/// Only the presented token is revoked; other sessions stay valid.
pub fn logout(repo: &mut dyn Repository, token_hash: &str) -> Result<(), StoreError> {
    repo.delete_token(token_hash)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRepository;

    fn keys(err: AppError) -> Vec<String> {
        match err {
            AppError::Validation(fields) => fields.into_map().into_keys().collect(),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    fn registration(email: &str, password: &str) -> Registration {
        validate_registration(
            Some(email.to_string()),
            Some(password.to_string()),
            Some(password.to_string()),
        )
        .unwrap()
    }

    fn sign_up(
        repo: &mut MemoryRepository,
        email: &str,
        password: &str,
    ) -> Result<User, AppError> {
        let registration = registration(email, password);
        let password_hash = hash_password(&registration.password, true).unwrap();
        register(repo, &registration.email, &password_hash)
    }

    fn log_in(
        repo: &mut MemoryRepository,
        email: &str,
        password: &str,
        ttl_days: i64,
    ) -> Result<(User, String), AppError> {
        let user = check_credentials(find_login_user(repo, email)?, password)?;
        let token = start_session(repo, user.id, ttl_days)?;
        Ok((user, token))
    }

    #[test]
    fn test_normalize_email_lowercases_domain_only() {
        assert_eq!(
            normalize_email("Jane.Doe@EXAMPLE.com").unwrap(),
            "Jane.Doe@example.com"
        );
        assert!(normalize_email("no-at-sign").is_err());
        assert!(normalize_email("@example.com").is_err());
        assert!(normalize_email("a b@example.com").is_err());
        assert!(normalize_email("user@").is_err());
    }

    #[test]
    fn test_password_rules() {
        assert!(check_password("s3cret-pass", "cook@example.com").is_empty());
        assert_eq!(check_password("short", "cook@example.com").len(), 1);
        assert_eq!(check_password("12345678", "cook@example.com").len(), 1);
        assert_eq!(check_password("cookbook", "cookbook@example.com").len(), 1);
        assert_eq!(
            check_password("COOK@example.com", "cook@example.com").len(),
            1
        );
    }

    #[test]
    fn test_registration_reports_every_field() {
        let err = validate_registration(None, Some("1234".to_string()), Some("4321".to_string()))
            .unwrap_err();
        assert_eq!(keys(err), vec!["email", "password", "password2"]);
    }

    #[test]
    fn test_register_and_login() {
        let mut repo = MemoryRepository::default();
        let user = sign_up(&mut repo, "cook@Example.com", "s3cret-pass").unwrap();
        assert_eq!(user.email, "cook@example.com");
        assert_ne!(user.password_hash, "s3cret-pass");

        let (logged_in, token) = log_in(&mut repo, "cook@example.com", "s3cret-pass", 30).unwrap();
        assert_eq!(logged_in.id, user.id);

        let resolved = repo
            .find_user_by_token(&hash_token(&token), Utc::now())
            .unwrap()
            .unwrap();
        assert_eq!(resolved.id, user.id);
        assert!(resolved.last_login.is_some());
    }

    #[test]
    fn test_duplicate_email_is_a_field_error() {
        let mut repo = MemoryRepository::default();
        sign_up(&mut repo, "cook@example.com", "s3cret-pass").unwrap();

        let err = sign_up(&mut repo, "cook@EXAMPLE.COM", "0ther-pass").unwrap_err();
        assert_eq!(keys(err), vec!["email"]);
    }

    #[test]
    fn test_bad_credentials_are_non_field_errors() {
        let mut repo = MemoryRepository::default();
        sign_up(&mut repo, "cook@example.com", "s3cret-pass").unwrap();

        let wrong_password = log_in(&mut repo, "cook@example.com", "nope-nope", 30).unwrap_err();
        assert_eq!(keys(wrong_password), vec!["non_field_errors"]);

        let unknown = log_in(&mut repo, "nobody@example.com", "s3cret-pass", 30).unwrap_err();
        assert_eq!(keys(unknown), vec!["non_field_errors"]);

        let malformed = log_in(&mut repo, "not-an-email", "s3cret-pass", 30).unwrap_err();
        assert_eq!(keys(malformed), vec!["non_field_errors"]);
    }

    #[test]
    fn test_out_of_range_ttl_is_an_error() {
        let mut repo = MemoryRepository::default();
        let user = sign_up(&mut repo, "cook@example.com", "s3cret-pass").unwrap();

        for ttl_days in [1_000_000_000, i64::MAX] {
            let err = start_session(&mut repo, user.id, ttl_days).unwrap_err();
            assert!(matches!(err, AppError::Internal(_)), "got {:?}", err);
        }
    }

    #[test]
    fn test_login_purges_expired_tokens() {
        let mut repo = MemoryRepository::default();
        let user = sign_up(&mut repo, "cook@example.com", "s3cret-pass").unwrap();
        let past = Utc::now() - Duration::days(1);
        for i in 0..5 {
            repo.insert_token(user.id, &format!("expired-{}", i), past)
                .unwrap();
        }

        let (_, token) = log_in(&mut repo, "cook@example.com", "s3cret-pass", 30).unwrap();

        assert_eq!(repo.delete_expired_tokens(Utc::now()).unwrap(), 0);
        assert!(repo
            .find_user_by_token(&hash_token(&token), Utc::now())
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_hashing_runs_off_the_store() {
        let password_hash = hash_new_password("s3cret-pass".to_string(), true)
            .await
            .unwrap();

        let mut repo = MemoryRepository::default();
        let user = register(&mut repo, "cook@example.com", &password_hash).unwrap();

        let verified = verify_credentials(user.clone(), "s3cret-pass".to_string())
            .await
            .unwrap();
        assert_eq!(verified.id, user.id);

        let err = verify_credentials(user, "wrong-pass".to_string())
            .await
            .unwrap_err();
        assert_eq!(keys(err), vec!["non_field_errors"]);
    }

    #[test]
    fn test_logout_revokes_only_that_token() {
        let mut repo = MemoryRepository::default();
        sign_up(&mut repo, "cook@example.com", "s3cret-pass").unwrap();
        let (_, first) = log_in(&mut repo, "cook@example.com", "s3cret-pass", 30).unwrap();
        let (_, second) = log_in(&mut repo, "cook@example.com", "s3cret-pass", 30).unwrap();

        logout(&mut repo, &hash_token(&first)).unwrap();

        let now = Utc::now();
        assert!(repo
            .find_user_by_token(&hash_token(&first), now)
            .unwrap()
            .is_none());
        assert!(repo
            .find_user_by_token(&hash_token(&second), now)
            .unwrap()
            .is_some());
    }
}
