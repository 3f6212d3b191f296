//! Password hashing with bcrypt.

use super::{AuthError, AuthResult};

/// bcrypt hasher with a configured work factor.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password. Input beyond bcrypt's 72-byte limit is ignored.
    pub fn hash(&self, password: &str) -> AuthResult<String> {
        bcrypt::hash(password, self.cost).map_err(|e| AuthError::Hashing(e.to_string()))
    }

    /// Verify a password against a stored hash.
    pub fn verify(&self, password: &str, hash: &str) -> AuthResult<bool> {
        if hash.is_empty() {
            return Ok(false);
        }
        bcrypt::verify(password, hash).map_err(|e| AuthError::Hashing(e.to_string()))
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}
