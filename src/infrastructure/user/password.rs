//! Password hashing utilities using Argon2

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as Argon2PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::fmt::Debug;

use crate::domain::DomainError;

/// Trait for password hashing operations
///
/// The lifecycle service depends only on this capability pair, so the
/// concrete algorithm can be swapped for testing or migration.
pub trait PasswordHasher: Send + Sync + Debug {
    /// Hash a plaintext password into its stored form
    fn hash(&self, password: &str) -> Result<String, DomainError>;

    /// Verify a plaintext password against a stored hash
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Argon2-based password hasher
#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher;

impl Argon2Hasher {
    pub fn new() -> Self {
        Self
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, DomainError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| DomainError::internal(format!("failed to hash password: {e}")))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(h) => h,
            Err(_) => return false,
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = Argon2Hasher::new();
        let password = "longpassword1";

        let hash = hasher.hash(password).unwrap();

        assert!(hasher.verify(password, &hash));
        assert!(!hasher.verify("wrong_password", &hash));
    }

    #[test]
    fn test_hash_is_salted() {
        let hasher = Argon2Hasher::new();

        let hash1 = hasher.hash("longpassword1").unwrap();
        let hash2 = hasher.hash("longpassword1").unwrap();

        assert_ne!(hash1, hash2);
        assert!(hasher.verify("longpassword1", &hash1));
        assert!(hasher.verify("longpassword1", &hash2));
    }

    #[test]
    fn test_verify_invalid_hash() {
        let hasher = Argon2Hasher::new();

        assert!(!hasher.verify("password", "invalid_hash_format"));
        assert!(!hasher.verify("password", ""));
    }
}
