use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher as Argon2PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::Algorithm;
use argon2::Argon2;
use argon2::Params;
use argon2::Version;

use super::errors::PasswordError;

/// Argon2id work factor.
///
/// Both knobs raise the cost of a brute-force attempt; memory cost is the
/// dominant one for GPU resistance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkFactor {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Passes over the memory
    pub iterations: u32,
}

impl Default for WorkFactor {
    fn default() -> Self {
        // OWASP-recommended Argon2id baseline (19 MiB, 2 iterations)
        Self {
            memory_kib: 19_456,
            iterations: 2,
        }
    }
}

/// Password hashing implementation.
///
/// Provides cryptographic password hashing (internally uses Argon2id) with
/// a per-hash random salt embedded in the PHC output string.
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Longest plaintext accepted, checked before any hashing work.
    const MAX_PASSWORD_BYTES: usize = 512;

    /// Create a password hasher with the given work factor.
    ///
    /// # Errors
    /// * `InvalidWorkFactor` - Parameters outside the Argon2 valid range
    pub fn new(work_factor: WorkFactor) -> Result<Self, PasswordError> {
        let params = Params::new(
            work_factor.memory_kib,
            work_factor.iterations,
            Params::DEFAULT_P_COST,
            None,
        )
        .map_err(|e| PasswordError::InvalidWorkFactor(e.to_string()))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a plaintext password securely.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to hash
    ///
    /// # Returns
    /// PHC string format hash (includes algorithm, parameters, salt, and hash)
    ///
    /// # Errors
    /// * `InvalidInput` - Password is empty or exceeds the input ceiling
    /// * `HashingFailed` - Password hashing operation failed
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        if password.is_empty() {
            return Err(PasswordError::InvalidInput(
                "password must not be empty".to_string(),
            ));
        }
        if password.len() > Self::MAX_PASSWORD_BYTES {
            return Err(PasswordError::InvalidInput(format!(
                "password exceeds {} bytes",
                Self::MAX_PASSWORD_BYTES
            )));
        }

        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// Verify a password against a stored hash.
    ///
    /// Comparison is constant-time with respect to the parameters embedded
    /// in the stored hash. A malformed stored hash verifies as `false`
    /// rather than erroring, so callers cannot tell a corrupt record from a
    /// wrong password.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(hash) else {
            return false;
        };

        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap_hasher() -> PasswordHasher {
        // Minimum-cost parameters keep the suite fast
        PasswordHasher::new(WorkFactor {
            memory_kib: 8,
            iterations: 1,
        })
        .expect("valid work factor")
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = cheap_hasher();
        let password = "my_secure_password1";

        let hash = hasher.hash(password).expect("Failed to hash password");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify(password, &hash));
        assert!(!hasher.verify("wrong_password", &hash));
    }

    #[test]
    fn test_hash_is_salted() {
        let hasher = cheap_hasher();

        let first = hasher.hash("password1").expect("Failed to hash");
        let second = hasher.hash("password1").expect("Failed to hash");

        assert_ne!(first, second);
        assert!(hasher.verify("password1", &first));
        assert!(hasher.verify("password1", &second));
    }

    #[test]
    fn test_hash_rejects_empty_password() {
        let hasher = cheap_hasher();
        let result = hasher.hash("");
        assert!(matches!(result, Err(PasswordError::InvalidInput(_))));
    }

    #[test]
    fn test_hash_rejects_oversized_password() {
        let hasher = cheap_hasher();
        let oversized = "a".repeat(PasswordHasher::MAX_PASSWORD_BYTES + 1);
        let result = hasher.hash(&oversized);
        assert!(matches!(result, Err(PasswordError::InvalidInput(_))));
    }

    #[test]
    fn test_verify_malformed_hash_is_false() {
        let hasher = cheap_hasher();
        assert!(!hasher.verify("password", "not_a_phc_string"));
        assert!(!hasher.verify("password", ""));
    }

    #[test]
    fn test_invalid_work_factor() {
        let result = PasswordHasher::new(WorkFactor {
            memory_kib: 0,
            iterations: 0,
        });
        assert!(matches!(result, Err(PasswordError::InvalidWorkFactor(_))));
    }
}
