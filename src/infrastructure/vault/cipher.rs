//! Passphrase-keyed XOR stream cipher

use std::fmt::Debug;

use sha2::{Digest, Sha256};

use crate::domain::DomainError;

const MIN_PASSPHRASE_LENGTH: usize = 8;

/// Symmetric stream cipher keyed by a passphrase-derived digest
///
/// Encryption and decryption are the same transform: XOR against the key
/// repeated to the data length. This self-inverse property is part of the
/// on-disk format contract, not an implementation accident.
#[derive(Clone)]
pub struct XorCipher {
    key: [u8; 32],
}

impl Debug for XorCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XorCipher").field("key", &"[hidden]").finish()
    }
}

impl XorCipher {
    /// Derive a cipher key from a passphrase.
    ///
    /// Passphrases shorter than 8 characters are rejected.
    pub fn new(passphrase: &str) -> Result<Self, DomainError> {
        if passphrase.len() < MIN_PASSPHRASE_LENGTH {
            return Err(DomainError::validation(format!(
                "the passphrase must be at least {MIN_PASSPHRASE_LENGTH} characters long"
            )));
        }

        let digest = Sha256::digest(passphrase.as_bytes());
        Ok(Self { key: digest.into() })
    }

    pub fn encrypt(&self, data: &[u8]) -> Vec<u8> {
        self.apply(data)
    }

    /// Decryption is encryption with the same key
    pub fn decrypt(&self, data: &[u8]) -> Vec<u8> {
        self.apply(data)
    }

    fn apply(&self, data: &[u8]) -> Vec<u8> {
        data.iter()
            .zip(self.key.iter().cycle())
            .map(|(byte, key_byte)| byte ^ key_byte)
            .collect()
    }
}
