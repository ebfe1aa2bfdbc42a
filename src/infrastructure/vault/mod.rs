//! At-rest protection for database bootstrap credentials
//!
//! A vault file is the XOR stream transform of a UTF-8 JSON object
//! `{"user": "...", "password": "..."}`, keyed by the SHA-256 digest of a
//! passphrase. The transform is deliberately self-inverse and must stay
//! byte-compatible with previously written vault files.

mod cipher;
mod file;

pub use cipher::XorCipher;
pub use file::{CredentialVault, DbCredentials};
