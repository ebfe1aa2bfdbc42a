//! User domain
//!
//! Domain types for user accounts: the entity mapped from store records, the
//! column naming contract, and input validation rules.

mod entity;
mod validation;

pub use entity::{columns, User};
pub use validation::{
    validate_email, validate_password, validate_username, UserValidationError,
};
