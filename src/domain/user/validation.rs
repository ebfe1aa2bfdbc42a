//! User input validation

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::domain::DomainError;

/// Errors that can occur during user input validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UserValidationError {
    #[error("User name is missing")]
    EmptyUsername,

    #[error("User name is too short. Minimum length is {0} characters")]
    UsernameTooShort(usize),

    #[error("User name exceeds maximum length of {0} characters")]
    UsernameTooLong(usize),

    #[error("Password is missing")]
    EmptyPassword,

    #[error("Password is too short. Minimum length is {0} characters")]
    PasswordTooShort(usize),

    #[error("Password exceeds maximum length of {0} characters")]
    PasswordTooLong(usize),

    #[error("Email address is missing")]
    EmptyEmail,

    #[error("Invalid email address: '{0}'")]
    InvalidEmail(String),
}

impl From<UserValidationError> for DomainError {
    fn from(error: UserValidationError) -> Self {
        DomainError::validation(error.to_string())
    }
}

const MIN_USERNAME_LENGTH: usize = 5;
const MAX_USERNAME_LENGTH: usize = 24;
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 162;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email pattern"));

/// Validate a username
///
/// Rules: non-empty, between 5 and 24 characters.
pub fn validate_username(name: &str) -> Result<(), UserValidationError> {
    if name.is_empty() {
        return Err(UserValidationError::EmptyUsername);
    }

    // Bounds are in characters, not bytes; multi-byte names must not be
    // penalized by their encoding.
    let length = name.chars().count();

    if length < MIN_USERNAME_LENGTH {
        return Err(UserValidationError::UsernameTooShort(MIN_USERNAME_LENGTH));
    }

    if length > MAX_USERNAME_LENGTH {
        return Err(UserValidationError::UsernameTooLong(MAX_USERNAME_LENGTH));
    }

    Ok(())
}

/// Validate a password
///
/// Rules: non-empty, between 8 and 162 characters.
pub fn validate_password(password: &str) -> Result<(), UserValidationError> {
    if password.is_empty() {
        return Err(UserValidationError::EmptyPassword);
    }

    let length = password.chars().count();

    if length < MIN_PASSWORD_LENGTH {
        return Err(UserValidationError::PasswordTooShort(MIN_PASSWORD_LENGTH));
    }

    if length > MAX_PASSWORD_LENGTH {
        return Err(UserValidationError::PasswordTooLong(MAX_PASSWORD_LENGTH));
    }

    Ok(())
}

/// Validate an email address
///
/// Accepts the `local@domain.tld` shape; full RFC conformance is out of scope.
pub fn validate_email(email: &str) -> Result<(), UserValidationError> {
    if email.is_empty() {
        return Err(UserValidationError::EmptyEmail);
    }

    if !EMAIL_PATTERN.is_match(email) {
        return Err(UserValidationError::InvalidEmail(email.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_usernames() {
        assert!(validate_username("alice1").is_ok());
        assert!(validate_username("abcde").is_ok());
        assert!(validate_username(&"a".repeat(24)).is_ok());
    }

    #[test]
    fn test_empty_username() {
        assert_eq!(validate_username(""), Err(UserValidationError::EmptyUsername));
    }

    #[test]
    fn test_username_too_short() {
        assert_eq!(
            validate_username("abcd"),
            Err(UserValidationError::UsernameTooShort(5))
        );
    }

    #[test]
    fn test_username_too_long() {
        assert_eq!(
            validate_username(&"a".repeat(25)),
            Err(UserValidationError::UsernameTooLong(24))
        );
    }

    #[test]
    fn test_bounds_count_characters_not_bytes() {
        // 24 accented characters occupy 48 bytes but are within bounds.
        assert!(validate_username(&"é".repeat(24)).is_ok());
        assert_eq!(
            validate_username(&"é".repeat(25)),
            Err(UserValidationError::UsernameTooLong(24))
        );

        assert!(validate_password(&"é".repeat(162)).is_ok());
        assert_eq!(
            validate_password(&"é".repeat(163)),
            Err(UserValidationError::PasswordTooLong(162))
        );
        assert_eq!(
            validate_password("pässwd7"),
            Err(UserValidationError::PasswordTooShort(8))
        );
    }

    #[test]
    fn test_valid_passwords() {
        assert!(validate_password("longpassword1").is_ok());
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password(&"p".repeat(162)).is_ok());
    }

    #[test]
    fn test_password_bounds() {
        assert_eq!(
            validate_password("1234567"),
            Err(UserValidationError::PasswordTooShort(8))
        );
        assert_eq!(
            validate_password(&"p".repeat(163)),
            Err(UserValidationError::PasswordTooLong(162))
        );
        assert_eq!(validate_password(""), Err(UserValidationError::EmptyPassword));
    }

    #[test]
    fn test_valid_emails() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("a.b+c@mail.example.org").is_ok());
    }

    #[test]
    fn test_invalid_emails() {
        assert_eq!(validate_email(""), Err(UserValidationError::EmptyEmail));
        assert!(validate_email("alice").is_err());
        assert!(validate_email("alice@example").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("alice@.com").is_err());
        assert!(validate_email("a lice@example.com").is_err());
    }

    #[test]
    fn test_conversion_to_domain_error() {
        let error: DomainError = UserValidationError::PasswordTooShort(8).into();
        assert!(matches!(error, DomainError::Validation { .. }));
    }
}
