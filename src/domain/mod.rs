//! Domain layer - Core business logic and entities

pub mod error;
pub mod store;
pub mod user;

pub use error::DomainError;
pub use store::{FieldValue, Record, RecordStore};
pub use user::{
    columns, validate_email, validate_password, validate_username, User, UserValidationError,
};

#[cfg(test)]
pub use store::mock::MockRecordStore;
