// handlers/validation.rs - Input rules shared by the account and admin handlers

use std::collections::HashMap;

use crate::error::ApiError;

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 32;
pub const PASSWORD_MIN: usize = 8;
/// bcrypt ignores input past 72 bytes.
pub const PASSWORD_MAX_BYTES: usize = 72;
const EMAIL_MAX: usize = 254;

/// Collects per-field failures and turns them into one `VALIDATION_ERROR`.
#[derive(Debug, Default)]
pub struct FieldErrors(HashMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, field: &str, result: Result<(), String>) -> &mut Self {
        if let Err(message) = result {
            self.0.entry(field.to_string()).or_insert(message);
        }
        self
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error("Validation failed", Some(self.0)))
        }
    }
}

pub fn username(value: &str) -> Result<(), String> {
    let value = value.trim();
    let len = value.chars().count();
    if len < USERNAME_MIN || len > USERNAME_MAX {
        return Err(format!(
            "Username must be between {} and {} characters",
            USERNAME_MIN, USERNAME_MAX
        ));
    }
    if !value
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ' '))
    {
        return Err("Username may only contain letters, digits, spaces, '.', '_' and '-'".to_string());
    }
    Ok(())
}

pub fn email(value: &str) -> Result<(), String> {
    let value = value.trim();
    if value.is_empty() || value.len() > EMAIL_MAX {
        return Err("Invalid email format".to_string());
    }
    let Some((local, domain)) = value.split_once('@') else {
        return Err("Invalid email format".to_string());
    };
    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@');
    if local.is_empty() || !domain_ok || value.chars().any(char::is_whitespace) {
        return Err("Invalid email format".to_string());
    }
    Ok(())
}

pub fn password(value: &str) -> Result<(), String> {
    if value.chars().count() < PASSWORD_MIN {
        return Err(format!("Password must be at least {} characters", PASSWORD_MIN));
    }
    if value.len() > PASSWORD_MAX_BYTES {
        return Err(format!("Password must be at most {} bytes", PASSWORD_MAX_BYTES));
    }
    let has_letter = value.chars().any(char::is_alphabetic);
    let has_digit = value.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        return Err("Password must contain at least one letter and one digit".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames() {
        assert!(username("ada").is_ok());
        assert!(username("Ada Lovelace").is_ok());
        assert!(username("ab").is_err());
        assert!(username("ada<script>").is_err());
        assert!(username(&"a".repeat(USERNAME_MAX + 1)).is_err());
    }

    #[test]
    fn emails() {
        assert!(email("ada@example.com").is_ok());
        assert!(email("ada@example").is_err());
        assert!(email("@example.com").is_err());
        assert!(email("ada@@example.com").is_err());
        assert!(email("ada @example.com").is_err());
    }

    #[test]
    fn passwords() {
        assert!(password("Passw0rd!").is_ok());
        assert!(password("short1").is_err());
        assert!(password("onlyletters").is_err());
        assert!(password("12345678").is_err());
        assert!(password(&format!("a1{}", "x".repeat(PASSWORD_MAX_BYTES))).is_err());
    }

    #[test]
    fn field_errors_keep_the_first_failure_per_field() {
        let mut errors = FieldErrors::new();
        errors
            .check("email", Err("first".into()))
            .check("email", Err("second".into()))
            .check("username", Ok(()));

        let err = errors.into_result().unwrap_err();
        let body = err.to_json();
        assert_eq!(body["field_errors"]["email"], "first");
        assert!(body["field_errors"].get("username").is_none());
    }
}
