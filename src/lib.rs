//! Authgate
//!
//! Account authentication and brute-force throttling core:
//! - User lifecycle: registration with rollback, login, deactivation, deletion
//! - Signed session tokens with single-active-token revocation
//! - Per-account failed-login throttling with persisted counters and locks
//! - An encrypted vault for database bootstrap credentials

pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use domain::{DomainError, RecordStore};
use infrastructure::auth::{AttemptThrottle, TokenCodec};
use infrastructure::user::{Argon2Hasher, UserService};

/// Wire a [`UserService`] from configuration and an injected record store.
///
/// The token codec, attempt throttle and Argon2 hasher are built from
/// `config`; the store backend is the caller's choice (for example
/// [`infrastructure::store::InMemoryRecordStore`]).
pub fn create_user_service<S: RecordStore>(
    store: Arc<S>,
    config: &AppConfig,
) -> Result<UserService<S, Argon2Hasher, TokenCodec>, DomainError> {
    UserService::new(
        store,
        Arc::new(Argon2Hasher::new()),
        Arc::new(TokenCodec::new(config.token.clone())),
        Arc::new(AttemptThrottle::new(config.throttle)),
        config.storage.users_table.clone(),
        config.storage.data_root.clone(),
    )
}
