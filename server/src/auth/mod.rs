mod accounts;
mod crypto;
mod extractor;

pub use accounts::{
    find_login_user, hash_new_password, logout, register, start_session, validate_registration,
    verify_credentials,
};
pub use extractor::AuthUser;
