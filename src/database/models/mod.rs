pub mod role;
pub mod user;

pub use role::{NewRole, Role, RoleGrant, RoleId, RoleUpdate};
pub use user::{AccountStatus, NewUser, UserId, UserRecord, UserUpdate};

/// A single field that failed validation at the store boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}
