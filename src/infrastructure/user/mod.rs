//! User infrastructure module
//!
//! Password hashing and the user lifecycle service.

mod password;
mod service;

pub use password::{Argon2Hasher, PasswordHasher};
pub use service::{SessionVerdict, UserService};
