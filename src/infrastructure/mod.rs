//! Infrastructure layer
//!
//! Concrete implementations behind the domain's seams: token codec, attempt
//! throttle, password hashing, the user lifecycle service, record-store
//! backends, the credential vault, and logging setup.

pub mod auth;
pub mod logging;
pub mod store;
pub mod user;
pub mod vault;
