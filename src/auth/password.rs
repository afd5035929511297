//! Password hashing and verification using Argon2id

use crate::{config::SecurityConfig, error::AppError};
use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

/// Password hasher with configurable parameters
///
/// 同时用于账户密码和验证令牌的哈希
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Create hasher with the crate's default parameters
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }

    /// Create hasher with explicit cost parameters
    pub fn with_params(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, AppError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| AppError::Config(format!("Invalid Argon2 params: {}", e)))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    pub fn from_config(config: &SecurityConfig) -> Result<Self, AppError> {
        Self::with_params(
            config.argon2_memory_kib,
            config.argon2_iterations,
            config.argon2_parallelism,
        )
    }

    /// Hash a secret with a fresh random salt
    pub fn hash(&self, plaintext: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!("Failed to hash secret: {:?}", e);
                AppError::Hashing(e.to_string())
            })?
            .to_string();

        Ok(hash)
    }

    /// Verify a secret against a stored hash
    ///
    /// 不匹配或哈希格式错误都返回 false
    pub fn verify(&self, plaintext: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!("Failed to parse stored hash: {:?}", e);
                return false;
            }
        };

        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// Validate password against policy
    pub fn validate_password_policy(password: &str, min_length: usize) -> Result<(), AppError> {
        if password.chars().count() < min_length {
            return Err(AppError::Validation(format!(
                "password must be at least {} characters",
                min_length
            )));
        }

        Ok(())
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> PasswordHasher {
        PasswordHasher::with_params(1024, 1, 1).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = fast_hasher();
        let hash = hasher.hash("pw1").unwrap();
        assert!(hasher.verify("pw1", &hash));
    }

    #[test]
    fn test_verify_fails_with_wrong_password() {
        let hasher = fast_hasher();
        let hash = hasher.hash("pw1").unwrap();
        assert!(!hasher.verify("pw2", &hash));
    }

    #[test]
    fn test_hash_is_salted() {
        let hasher = fast_hasher();
        let h1 = hasher.hash("same").unwrap();
        let h2 = hasher.hash("same").unwrap();
        assert_ne!(h1, h2);
        assert!(!h1.contains("same"));
    }

    #[test]
    fn test_malformed_hash_is_no_match() {
        let hasher = fast_hasher();
        assert!(!hasher.verify("pw1", "not-a-phc-string"));
        assert!(!hasher.verify("pw1", ""));
    }

    #[test]
    fn test_password_policy() {
        assert!(PasswordHasher::validate_password_policy("pw", 3).is_err());
        assert!(PasswordHasher::validate_password_policy("pw1", 3).is_ok());
    }

    #[test]
    fn test_invalid_params_rejected() {
        assert!(PasswordHasher::with_params(1, 0, 0).is_err());
    }
}
