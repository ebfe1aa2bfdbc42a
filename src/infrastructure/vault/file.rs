//! Vault file store/load

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::XorCipher;
use crate::domain::DomainError;

/// Database bootstrap credentials
///
/// Exactly these two fields, both non-empty. Anything else in a vault file is
/// a validation failure, not a silently tolerated extra.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DbCredentials {
    pub user: String,
    pub password: String,
}

impl DbCredentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    fn validate(&self) -> Result<(), DomainError> {
        if self.user.is_empty() || self.password.is_empty() {
            return Err(DomainError::validation(
                "the 'user' and 'password' fields must not be empty",
            ));
        }
        Ok(())
    }
}

/// Encrypting reader/writer for the credentials file
///
/// Synchronous by design: this runs once during database bootstrap, before
/// the async runtime has anything to do.
#[derive(Debug, Clone)]
pub struct CredentialVault {
    cipher: XorCipher,
}

impl CredentialVault {
    pub fn new(cipher: XorCipher) -> Self {
        Self { cipher }
    }

    /// Validate, encrypt and write credentials to `path`
    pub fn store(&self, credentials: &DbCredentials, path: &Path) -> Result<(), DomainError> {
        credentials.validate()?;

        let plaintext = serde_json::to_vec(credentials)
            .map_err(|e| DomainError::internal(format!("failed to encode credentials: {e}")))?;

        fs::write(path, self.cipher.encrypt(&plaintext)).map_err(|e| {
            DomainError::filesystem(format!(
                "failed to write credentials file '{}': {e}",
                path.display()
            ))
        })
    }

    /// Read, decrypt and re-validate credentials from `path`
    pub fn load(&self, path: &Path) -> Result<DbCredentials, DomainError> {
        let ciphertext = fs::read(path).map_err(|e| {
            DomainError::filesystem(format!(
                "failed to read credentials file '{}': {e}",
                path.display()
            ))
        })?;

        let plaintext = self.cipher.decrypt(&ciphertext);

        let credentials: DbCredentials = serde_json::from_slice(&plaintext).map_err(|e| {
            DomainError::credential(format!("credentials file could not be decoded: {e}"))
        })?;

        credentials.validate()?;
        Ok(credentials)
    }
}
