use crate::core::models::profile::Profile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password: String,
    pub salt: String,
    /// Display name requested at sign up, copied into the profile on first sign in.
    pub username: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Insert {
    pub email: String,
    pub password: String,
    pub salt: String,
    pub username: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct Signup {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(
        length(min = 3, max = 20, message = "Username must be between 3 and 20 characters"),
        custom(function = "validate_username")
    )]
    pub username: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct Login {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// The signed-in account as seen by the client.
#[derive(Debug, Serialize)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    pub member_since: DateTime<Utc>,
    pub profile: Profile,
}

#[derive(Debug, Serialize)]
pub struct Authenticated {
    pub token: String,
    #[serde(flatten)]
    pub session: Session,
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Ok(());
    }
    let mut err = ValidationError::new("username_charset");
    err.message = Some("Username can only contain letters, numbers, and underscores".into());
    Err(err)
}
