//! Registration, login, token verification and account administration.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::MedicalRecords;
use crate::auth::AccessToken;
use crate::error::{MedRecError, MedRecResult};
use crate::models::{normalize_email, now_rfc3339, NewUser, Role, User};

/// Identity carried by a valid token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenIdentity {
    pub is_valid: bool,
    pub email: String,
    pub role: Role,
}

impl MedicalRecords {
    /// Register a new account. ADMIN accounts cannot self-register.
    pub fn register(&self, new_user: NewUser) -> MedRecResult<User> {
        let email = new_user.validate()?;
        if new_user.role == Role::Admin {
            return Err(MedRecError::Forbidden(
                "ADMIN accounts cannot be self-registered".into(),
            ));
        }
        self.create_user(email, new_user)
    }

    fn create_user(&self, email: String, new_user: NewUser) -> MedRecResult<User> {
        if self.db()?.get_user_by_email(&email)?.is_some() {
            return Err(MedRecError::Conflict("Email already registered".into()));
        }

        // Hash without holding the database lock; the unique index catches races.
        let password_hash = self.passwords.hash(&new_user.password)?;

        let db = self.db()?;
        let mut user = User {
            id: 0,
            email,
            first_name: new_user.first_name.trim().to_string(),
            last_name: new_user.last_name.trim().to_string(),
            password_hash,
            role: new_user.role,
            is_active: new_user.is_active,
            created_at: now_rfc3339(),
        };
        user.id = db.insert_user(&user).map_err(|e| match MedRecError::from(e) {
            MedRecError::Conflict(_) => MedRecError::Conflict("Email already registered".into()),
            other => other,
        })?;

        info!(user_id = user.id, role = %user.role, "registered user");
        Ok(user)
    }

    /// Create the configured administrator if it does not exist yet.
    pub fn ensure_admin(&self, email: &str, password: &str) -> MedRecResult<User> {
        let email = normalize_email(email)
            .ok_or_else(|| MedRecError::InvalidInput(format!("Invalid admin email: {email}")))?;
        if let Some(existing) = self.db()?.get_user_by_email(&email)? {
            if existing.role != Role::Admin {
                return Err(MedRecError::Conflict(format!(
                    "{email} is registered with role {}",
                    existing.role
                )));
            }
            return Ok(existing);
        }

        let admin = NewUser {
            email: email.clone(),
            password: password.to_string(),
            first_name: "System".into(),
            last_name: "Administrator".into(),
            role: Role::Admin,
            is_active: true,
        };
        admin.validate()?;
        self.create_user(email, admin)
    }

    /// Exchange credentials for a bearer token.
    pub fn login(&self, email: &str, password: &str) -> MedRecResult<AccessToken> {
        let invalid = || MedRecError::Unauthenticated("Incorrect email or password".into());

        let email = normalize_email(email).ok_or_else(invalid)?;
        let user = self.db()?.get_user_by_email(&email)?.ok_or_else(|| {
            warn!(email = %email, "login for unknown email");
            invalid()
        })?;

        if !self.passwords.verify(password, &user.password_hash)? {
            warn!(user_id = user.id, "login with wrong password");
            return Err(invalid());
        }
        if !user.is_active {
            warn!(user_id = user.id, "login for deactivated account");
            return Err(MedRecError::Unauthenticated("Account is deactivated".into()));
        }

        info!(user_id = user.id, role = %user.role, "issued access token");
        Ok(self.tokens.issue(&user)?)
    }

    /// Report the identity behind a token.
    pub fn verify_token(&self, token: &str) -> MedRecResult<TokenIdentity> {
        let user = self.authorize(token, Role::ALL)?;
        Ok(TokenIdentity {
            is_valid: true,
            email: user.email,
            role: user.role,
        })
    }

    pub fn list_users(&self) -> MedRecResult<Vec<User>> {
        Ok(self.db()?.list_users()?)
    }

    /// Activate or deactivate an account. Admins cannot deactivate themselves.
    pub fn set_user_active(&self, caller: &User, user_id: i64, is_active: bool) -> MedRecResult<User> {
        if caller.id == user_id && !is_active {
            return Err(MedRecError::InvalidInput(
                "Administrators cannot deactivate their own account".into(),
            ));
        }
        let db = self.db()?;
        if !db.set_user_active(user_id, is_active)? {
            return Err(MedRecError::NotFound(format!("user {user_id}")));
        }
        info!(admin_id = caller.id, user_id, is_active, "changed account activation");
        db.get_user(user_id)?
            .ok_or_else(|| MedRecError::NotFound(format!("user {user_id}")))
    }
}
