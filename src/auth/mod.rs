//! Passwords, session tokens, and the session issuer/verifier pair.

pub mod identity;
pub mod issuer;
pub mod password;
pub mod token;
pub mod verifier;

pub use identity::ResolvedIdentity;
pub use issuer::{IssuedSession, NewAccount, SessionIssuer};
pub use password::PasswordHasher;
pub use token::{SessionClaims, SessionTokens, SESSION_TTL_DAYS};
pub use verifier::SessionVerifier;

use thiserror::Error;

use crate::database::StoreError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("session token is invalid")]
    TokenInvalid,

    #[error("session token has expired")]
    TokenExpired,

    #[error("session user no longer exists")]
    IdentityNotFound,

    #[error("account is inactive")]
    AccountInactive,

    #[error("an account with email '{0}' already exists")]
    EmailTaken(String),

    #[error("default role '{0}' is missing")]
    DefaultRoleMissing(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("token signing failed: {0}")]
    Signing(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Short label for logs; never sent to clients.
    pub fn cause(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::TokenInvalid => "token_invalid",
            AuthError::TokenExpired => "token_expired",
            AuthError::IdentityNotFound => "identity_not_found",
            AuthError::AccountInactive => "account_inactive",
            AuthError::EmailTaken(_) => "email_taken",
            AuthError::DefaultRoleMissing(_) => "default_role_missing",
            AuthError::Hashing(_) => "hashing",
            AuthError::Signing(_) => "signing",
            AuthError::Store(_) => "store",
        }
    }
}
