use thiserror::Error;

/// Error type for password operations.
#[derive(Debug, Clone, Error)]
pub enum PasswordError {
    #[error("Invalid password input: {0}")]
    InvalidInput(String),

    #[error("Invalid Argon2 work factor: {0}")]
    InvalidWorkFactor(String),

    #[error("Password hashing failed: {0}")]
    HashingFailed(String),
}
