//! User accounts.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{require_text, Role, ValidationError};

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// bcrypt hash, never serialized
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: String,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

fn default_active() -> bool {
    true
}

/// Registration payload.
#[derive(Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("role", &self.role)
            .field("is_active", &self.is_active)
            .finish()
    }
}

impl NewUser {
    /// Check required fields and return the normalized email.
    pub fn validate(&self) -> Result<String, ValidationError> {
        let email = normalize_email(&self.email)
            .ok_or_else(|| ValidationError(format!("Invalid email address: {}", self.email)))?;
        if self.password.is_empty() {
            return Err(ValidationError("password must not be empty".into()));
        }
        require_text("first_name", &self.first_name)?;
        require_text("last_name", &self.last_name)?;
        Ok(email)
    }
}

/// Trim and lowercase an email, rejecting anything without a `local@domain` shape.
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    let (local, domain) = email.split_once('@')?;
    if local.is_empty()
        || domain.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.chars().any(char::is_whitespace)
    {
        return None;
    }
    Some(email)
}
