//! Authentication utilities library
//!
//! Provides reusable authentication infrastructure for services:
//! - Password hashing (Argon2id, tunable work factor)
//! - Signed access/refresh token issuance and verification
//!
//! Each service defines its own authentication traits and adapts these
//! implementations. The library performs no I/O; everything here is
//! bounded CPU work.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::{PasswordHasher, WorkFactor};
//!
//! let hasher = PasswordHasher::new(WorkFactor::default()).unwrap();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! assert!(!hasher.verify("not_my_password", &hash));
//! ```
//!
//! ## Tokens
//! ```
//! use auth::{TokenCodec, TokenType};
//! use chrono::Duration;
//!
//! let codec = TokenCodec::new(
//!     b"secret_key_at_least_32_bytes_long!",
//!     Duration::minutes(15),
//!     Duration::days(7),
//! );
//! let token = codec.issue("user123", "user", TokenType::Access).unwrap();
//! let claims = codec.verify(&token).unwrap();
//! assert_eq!(claims.sub, "user123");
//! assert_eq!(claims.token_type, TokenType::Access);
//! ```

pub mod password;
pub mod token;

// Re-export commonly used items
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use password::WorkFactor;
pub use token::TokenClaims;
pub use token::TokenCodec;
pub use token::TokenError;
pub use token::TokenType;
