//! Client-side checks mirroring the backend's account rules
//!
//! Requests that would certainly be rejected with a 422 are refused
//! before they reach the network.

use crate::model::{PasswordResetConfirm, ProfileUpdate, RegisterRequest};

/// Validation error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Parameter '{parameter}' length {length} is out of range ({min}..={max})")]
    LengthError {
        parameter: &'static str,
        length: usize,
        min: usize,
        max: usize,
    },

    #[error("Parameter '{parameter}' is invalid: {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: &'static str,
    },

    #[error("Required parameter '{parameter}' is missing")]
    MissingParameter { parameter: &'static str },
}

/// Trait for request types that can be checked before sending
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let length = username.chars().count();
    if length == 0 {
        return Err(ValidationError::MissingParameter { parameter: "username" });
    }
    if !(3..=50).contains(&length) {
        return Err(ValidationError::LengthError {
            parameter: "username",
            length,
            min: 3,
            max: 50,
        });
    }
    if !username.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(ValidationError::InvalidValue {
            parameter: "username",
            reason: "only letters, numbers and underscores are allowed",
        });
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::MissingParameter { parameter: "email" });
    }
    let mut parts = email.split('@');
    let valid = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => !local.is_empty() && !domain.is_empty(),
        _ => false,
    };
    if !valid || email.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidValue {
            parameter: "email",
            reason: "not a valid email address",
        });
    }
    Ok(())
}

/// Strength rules for new passwords
pub fn validate_password(parameter: &'static str, password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::MissingParameter { parameter });
    }
    if password.chars().count() < 8 {
        return Err(ValidationError::InvalidValue {
            parameter,
            reason: "must be at least 8 characters long",
        });
    }
    if !password.chars().any(char::is_uppercase) {
        return Err(ValidationError::InvalidValue {
            parameter,
            reason: "must contain at least one uppercase letter",
        });
    }
    if !password.chars().any(char::is_lowercase) {
        return Err(ValidationError::InvalidValue {
            parameter,
            reason: "must contain at least one lowercase letter",
        });
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidValue {
            parameter,
            reason: "must contain at least one digit",
        });
    }
    Ok(())
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_username(&self.username)?;
        validate_email(&self.email)?;
        validate_password("password", &self.password)
    }
}

impl Validate for ProfileUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(username) = &self.username {
            validate_username(username)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        // The backend only enforces length on profile password changes
        if let Some(password) = &self.password {
            if password.chars().count() < 8 {
                return Err(ValidationError::InvalidValue {
                    parameter: "password",
                    reason: "must be at least 8 characters long",
                });
            }
        }
        Ok(())
    }
}

impl Validate for PasswordResetConfirm {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.token.trim().is_empty() {
            return Err(ValidationError::MissingParameter { parameter: "token" });
        }
        validate_password("new_password", &self.new_password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("alice", true)]
    #[case("a_b_9", true)]
    #[case("ab", false)]
    #[case("has space", false)]
    #[case("dash-name", false)]
    #[case("", false)]
    fn test_username_rules(#[case] username: &str, #[case] ok: bool) {
        assert_eq!(validate_username(username).is_ok(), ok, "{}", username);
    }

    #[rstest]
    #[case("Secret123", true)]
    #[case("secret123", false)]
    #[case("SECRET123", false)]
    #[case("SecretPwd", false)]
    #[case("Se1", false)]
    fn test_password_rules(#[case] password: &str, #[case] ok: bool) {
        assert_eq!(validate_password("password", password).is_ok(), ok, "{}", password);
    }

    #[rstest]
    #[case("a@example.com", true)]
    #[case("no-at-sign", false)]
    #[case("two@@example.com", false)]
    #[case("@example.com", false)]
    #[case("a b@example.com", false)]
    fn test_email_rules(#[case] email: &str, #[case] ok: bool) {
        assert_eq!(validate_email(email).is_ok(), ok, "{}", email);
    }

    #[test]
    fn test_register_request_validation() {
        assert!(RegisterRequest::new("alice", "a@example.com", "Secret123").validate().is_ok());

        let err = RegisterRequest::new("alice", "a@example.com", "weak").validate().unwrap_err();
        assert!(err.to_string().contains("password"));
    }

    #[test]
    fn test_profile_update_validates_only_present_fields() {
        assert!(ProfileUpdate::new().validate().is_ok());
        assert!(ProfileUpdate::new().email("new@example.com").validate().is_ok());
        assert!(ProfileUpdate::new().username("x").validate().is_err());
        assert!(ProfileUpdate::new().password("short").validate().is_err());
    }

    #[test]
    fn test_reset_confirm_requires_token() {
        let confirm = PasswordResetConfirm {
            token: " ".to_string(),
            new_password: "Secret123".to_string(),
        };
        assert_eq!(
            confirm.validate(),
            Err(ValidationError::MissingParameter { parameter: "token" })
        );
    }
}
