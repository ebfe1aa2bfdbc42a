use thiserror::Error;

/// Core domain errors
///
/// Every fallible operation in the crate reports through this enum so callers
/// are forced to handle each taxonomy member explicitly. Authentication
/// failures keep their precise cause internally (for logging) while
/// [`DomainError::public_message`] collapses them into the non-enumerating
/// messages shown at the boundary.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Unknown username: {message}")]
    InvalidUsername { message: String },

    #[error("Password mismatch: {message}")]
    InvalidPassword { message: String },

    #[error("Inactive user: {message}")]
    InactiveUser { message: String },

    #[error("Maximum login attempts exceeded")]
    MaxAttemptsExceeded,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token is invalid")]
    TokenInvalid,

    #[error("Credential error: {message}")]
    Credential { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Filesystem error: {message}")]
    Filesystem { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn invalid_username(message: impl Into<String>) -> Self {
        Self::InvalidUsername {
            message: message.into(),
        }
    }

    pub fn invalid_password(message: impl Into<String>) -> Self {
        Self::InvalidPassword {
            message: message.into(),
        }
    }

    pub fn inactive_user(message: impl Into<String>) -> Self {
        Self::InactiveUser {
            message: message.into(),
        }
    }

    pub fn credential(message: impl Into<String>) -> Self {
        Self::Credential {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn filesystem(message: impl Into<String>) -> Self {
        Self::Filesystem {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// The message safe to show to an end user.
    ///
    /// Wrong-name, wrong-password and bad-token outcomes all collapse into the
    /// same string so a caller cannot probe which factor failed.
    /// Infrastructure failures are reported opaquely; their detail belongs in
    /// server-side logs only.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "the submitted value does not meet the requirements",
            Self::Conflict { .. } => "an account with that name or email already exists",
            Self::NotFound { .. } => "no such user",
            Self::InvalidUsername { .. }
            | Self::InvalidPassword { .. }
            | Self::TokenExpired
            | Self::TokenInvalid => "invalid username or password",
            Self::InactiveUser { .. } => "this account has been deactivated",
            Self::MaxAttemptsExceeded => "too many failed login attempts",
            Self::Credential { .. }
            | Self::Configuration { .. }
            | Self::Storage { .. }
            | Self::Filesystem { .. }
            | Self::Internal { .. } => "an error occurred",
        }
    }

    /// Whether retrying the same call can succeed without user input.
    ///
    /// Infrastructure failures are retryable at the orchestration layer;
    /// validation and conflict outcomes never are.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Storage { .. } | Self::Filesystem { .. } | Self::Internal { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display() {
        let error = DomainError::storage("connection refused");
        assert_eq!(error.to_string(), "Storage error: connection refused");
    }

    #[test]
    fn test_auth_failures_share_public_message() {
        let name = DomainError::invalid_username("no such user: bob");
        let password = DomainError::invalid_password("mismatch for user: bob");

        assert_eq!(name.public_message(), password.public_message());
        assert_eq!(
            name.public_message(),
            DomainError::TokenInvalid.public_message()
        );
    }

    #[test]
    fn test_infrastructure_is_opaque_and_retryable() {
        let error = DomainError::storage("duplicate key value violates unique constraint");

        assert_eq!(error.public_message(), "an error occurred");
        assert!(error.is_retryable());
        assert!(!DomainError::validation("too short").is_retryable());
    }
}
