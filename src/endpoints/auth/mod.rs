pub mod calls;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::timestamp::Timestamp;

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 50;
pub const PASSWORD_MIN: usize = 6;

// MODELS

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Requester,
    Rater,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Requester => "requester",
            Role::Rater => "rater",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "requester" => Ok(Role::Requester),
            "rater" => Ok(Role::Rater),
            other => Err(ValidationError::new(
                "role",
                format!("Unknown role '{other}', expected requester or rater"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    #[serde(with = "crate::timestamp")]
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterCredentials {
    pub username: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: User,
}

// HELPER FUNCTIONS

pub fn validate_login(credentials: &LoginCredentials) -> Result<(), ValidationError> {
    if credentials.username.trim().is_empty() {
        return Err(ValidationError::new("username", "Username is required"));
    }
    if credentials.password.is_empty() {
        return Err(ValidationError::new("password", "Password is required"));
    }
    Ok(())
}

/// Checks the registration form before it is sent. `confirm` is the
/// repeated password, which never leaves the client.
pub fn validate_registration(
    credentials: &RegisterCredentials,
    confirm: &str,
) -> Result<(), ValidationError> {
    let length = credentials.username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&length) {
        return Err(ValidationError::new(
            "username",
            format!("Username must be between {USERNAME_MIN} and {USERNAME_MAX} characters"),
        ));
    }

    if credentials.password.chars().count() < PASSWORD_MIN {
        return Err(ValidationError::new(
            "password",
            format!("Password must be at least {PASSWORD_MIN} characters"),
        ));
    }

    if credentials.password != confirm {
        return Err(ValidationError::new("confirm_password", "Passwords do not match"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn register(username: &str, password: &str) -> RegisterCredentials {
        RegisterCredentials {
            username: username.to_string(),
            password: password.to_string(),
            role: Role::Rater,
        }
    }

    #[test]
    fn test_validate_registration() {
        assert!(validate_registration(&register("ann", "secret"), "secret").is_ok());

        let err = validate_registration(&register("an", "secret"), "secret").unwrap_err();
        assert_eq!(err.field, "username");

        let long = "x".repeat(51);
        assert!(validate_registration(&register(&long, "secret"), "secret").is_err());

        let err = validate_registration(&register("ann", "12345"), "12345").unwrap_err();
        assert_eq!(err.field, "password");

        let err = validate_registration(&register("ann", "secret"), "secrets").unwrap_err();
        assert_eq!(err.field, "confirm_password");
    }

    #[test]
    fn test_validate_login() {
        let empty = LoginCredentials { username: " ".into(), password: "x".into() };
        assert!(validate_login(&empty).is_err());
    }

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_value(Role::Requester).unwrap(), json!("requester"));
        assert_eq!("Rater".parse::<Role>().unwrap(), Role::Rater);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_user_accepts_naive_timestamp() {
        let user: User = serde_json::from_value(json!({
            "id": "6f1c1f43-5a8e-4f51-9a54-1f1c1d3b2a10",
            "username": "ann",
            "role": "requester",
            "created_at": "2024-05-01T10:00:00.123456"
        }))
        .unwrap();
        assert_eq!(user.role, Role::Requester);
    }
}
