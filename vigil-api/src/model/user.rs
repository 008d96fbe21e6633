//! Accounts, credentials and profile updates

use serde::{Deserialize, Serialize};

use super::event::UserId;

/// Body of a successful `POST /auth/login`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Account information returned by `/users/me` and `/auth/register`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// New account registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn new(username: impl Into<String>, email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Partial profile update for `PUT /users/me`
///
/// Only fields that are `Some` are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl ProfileUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// True when no field would be sent
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.username.is_none() && self.password.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct PasswordResetRequest<'a> {
    pub email: &'a str,
}

/// Body of `POST /auth/password-reset/request`
///
/// Development backends echo the reset token; production ones only email it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PasswordResetTicket {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

/// Body of `POST /auth/password-reset/confirm`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordResetConfirm {
    pub token: String,
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_update_sends_only_present_fields() {
        let update = ProfileUpdate::new().email("new@example.com");
        let value = serde_json::to_value(&update).unwrap();

        assert_eq!(value, serde_json::json!({"email": "new@example.com"}));
        assert!(!update.is_empty());
        assert!(ProfileUpdate::new().is_empty());
    }

    #[test]
    fn test_profile_ignores_unknown_fields() {
        let json = r#"{"id":4,"username":"alice","email":"a@example.com","is_active":true,
            "is_superuser":false,"created_at":"2024-01-01T00:00:00"}"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();

        assert_eq!(profile.id, 4);
        assert_eq!(profile.username, "alice");
        assert_eq!(profile.is_active, Some(true));
    }

    #[test]
    fn test_access_token_default_type() {
        let token: AccessToken = serde_json::from_str(r#"{"access_token":"abc"}"#).unwrap();
        assert_eq!(token.token_type, "bearer");
    }
}
