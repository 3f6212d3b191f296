//! Authentication: password hashing, bearer tokens and the role guard.

mod guard;
mod password;
mod token;

pub use guard::*;
pub use password::*;
pub use token::*;

use thiserror::Error;

/// Authentication errors.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Token generation failed: {0}")]
    Signing(String),
}

pub type AuthResult<T> = Result<T, AuthError>;
