//! User lifecycle service
//!
//! Coordinates registration, login, session checks, locking and account
//! maintenance against an abstract record store, the token codec and the
//! attempt throttle. Registration is the one multi-step workflow here; it is
//! made all-or-nothing by compensating rollback, since the store exposes no
//! multi-statement transaction.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::{debug, error, info, warn};

use crate::domain::store::{FieldValue, Record, RecordStore};
use crate::domain::user::{
    columns, validate_email, validate_password, validate_username, User,
};
use crate::domain::DomainError;
use crate::infrastructure::auth::{AttemptState, AttemptThrottle, TimeRemaining, TokenIssuer};

use super::password::PasswordHasher;

/// Lifetime of the token issued at registration
const REGISTRATION_TOKEN_TTL_HOURS: u32 = 24;

/// Outcome of a session-token check
///
/// An expired token yields `Unconfirmed` rather than `Denied`: the session
/// cannot be vouched for, but nothing suggests forgery. Both ultimately deny
/// access; they are kept apart for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionVerdict {
    /// Token verified, matches the account's stored token, account active
    Live(i64),
    /// Token forged, malformed, superseded, or the account cannot use it
    Denied,
    /// Token expired; neutral outcome
    Unconfirmed,
}

impl SessionVerdict {
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live(_))
    }
}

/// User lifecycle service
///
/// Generic over the record store, password hasher and token codec so each
/// seam can be substituted in tests.
#[derive(Debug)]
pub struct UserService<S: RecordStore, H: PasswordHasher, T: TokenIssuer> {
    store: Arc<S>,
    hasher: Arc<H>,
    tokens: Arc<T>,
    throttle: Arc<AttemptThrottle>,
    table: String,
    storage_root: PathBuf,
}

impl<S: RecordStore, H: PasswordHasher, T: TokenIssuer> UserService<S, H, T> {
    pub fn new(
        store: Arc<S>,
        hasher: Arc<H>,
        tokens: Arc<T>,
        throttle: Arc<AttemptThrottle>,
        table: impl Into<String>,
        storage_root: impl Into<PathBuf>,
    ) -> Result<Self, DomainError> {
        let table = table.into();
        if table.is_empty() {
            return Err(DomainError::configuration(
                "the users table name must be provided",
            ));
        }

        Ok(Self {
            store,
            hasher,
            tokens,
            throttle,
            table,
            storage_root: storage_root.into(),
        })
    }

    pub fn throttle(&self) -> &AttemptThrottle {
        &self.throttle
    }

    /// Register a new user.
    ///
    /// Validates inputs with no side effects on first failure, checks name
    /// and email uniqueness, then creates the record, issues a 24-hour token,
    /// persists it, and provisions the user's storage directory. Any failure
    /// after record creation rolls the record back before the error is
    /// re-signaled.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(i64, String), DomainError> {
        validate_username(name)?;
        validate_password(password)?;
        validate_email(email)?;

        if !self.storage_root.is_dir() {
            return Err(DomainError::configuration(format!(
                "user data root not found: '{}'",
                self.storage_root.display()
            )));
        }

        self.ensure_account_is_free(name, email).await?;

        let password_hash = self.hasher.hash(password)?;
        let now = Utc::now();

        let user_id = self
            .store
            .create_record(
                &self.table,
                User::registration_fields(name, email, &password_hash, now),
            )
            .await?;

        let token = match self
            .tokens
            .issue_with_ttl(user_id, REGISTRATION_TOKEN_TTL_HOURS)
        {
            Ok(token) => token,
            Err(e) => {
                self.rollback_registration(user_id).await;
                return Err(e);
            }
        };

        if let Err(e) = self
            .store
            .insert_value(
                &self.table,
                columns::USER_ID,
                &user_id.into(),
                columns::USER_TOKEN,
                token.clone().into(),
            )
            .await
        {
            self.rollback_registration(user_id).await;
            return Err(e);
        }

        if let Err(e) = self.create_user_directory(user_id).await {
            self.rollback_registration(user_id).await;
            return Err(e);
        }

        // The registration instant is the account's first "attempt" for the
        // throttling window.
        self.throttle.seed(name, AttemptState::new(0, now)).await;

        info!(user_id, "user registered");
        Ok((user_id, token))
    }

    /// Authenticate a user by name and password.
    ///
    /// Every attempt against an existing account counts, successful or not;
    /// only the window rule forgives the counter. Names with no account are
    /// rejected without touching the throttle, so spraying unknown names
    /// cannot grow its per-account map. [`DomainError::MaxAttemptsExceeded`]
    /// is the caller's cue to invoke [`UserService::lock_user`].
    pub async fn login(&self, name: &str, password: &str) -> Result<i64, DomainError> {
        let record = self
            .store
            .get_record(&self.table, columns::USER_NAME, &name.into())
            .await?
            .ok_or_else(|| DomainError::invalid_username(format!("no such user: {name}")))?;

        self.hydrate_throttle(name, &record).await;

        let state = self.throttle.record_attempt(name).await?;
        if let Some(state) = state {
            self.persist_attempt_state(name, state).await?;
        }

        let user = User::from_record(&record)?;

        if !user.is_active() {
            return Err(DomainError::inactive_user(format!(
                "user '{name}' is inactive and cannot log in"
            )));
        }

        if !self.hasher.verify(password, user.password_hash()) {
            return Err(DomainError::invalid_password(format!(
                "password mismatch for user '{name}'"
            )));
        }

        debug!(user_id = user.id(), "login succeeded");
        Ok(user.id())
    }

    /// Check whether a presented token still identifies a live session.
    pub async fn authenticate(&self, token: &str) -> Result<SessionVerdict, DomainError> {
        let subject = match self.tokens.verify(token) {
            Ok(subject) => subject,
            Err(DomainError::TokenExpired) => {
                debug!("token expired; session cannot be confirmed");
                return Ok(SessionVerdict::Unconfirmed);
            }
            Err(DomainError::TokenInvalid) => {
                debug!("token failed signature or format checks");
                return Ok(SessionVerdict::Denied);
            }
            Err(e) => return Err(e),
        };

        let Some(record) = self
            .store
            .get_record(&self.table, columns::USER_ID, &subject.into())
            .await?
        else {
            return Ok(SessionVerdict::Denied);
        };

        let user = User::from_record(&record)?;

        if user.token() == Some(token) && user.is_active() {
            Ok(SessionVerdict::Live(subject))
        } else {
            Ok(SessionVerdict::Denied)
        }
    }

    /// Lock the account for the policy's lock window, returning the unlock
    /// instant.
    pub async fn lock_user(&self, name: &str) -> Result<DateTime<Utc>, DomainError> {
        let until = self.throttle.policy().lock_until(Utc::now());

        self.store
            .insert_value(
                &self.table,
                columns::USER_NAME,
                &name.into(),
                columns::USER_LOCKED_UNTIL,
                until.into(),
            )
            .await?;

        warn!(name, %until, "user account locked");
        Ok(until)
    }

    /// Unlock the account by expiring its lock immediately.
    pub async fn unlock_user(&self, name: &str) -> Result<(), DomainError> {
        self.store
            .insert_value(
                &self.table,
                columns::USER_NAME,
                &name.into(),
                columns::USER_LOCKED_UNTIL,
                Utc::now().into(),
            )
            .await?;

        info!(name, "user account unlocked");
        Ok(())
    }

    /// Whether the account's persisted lock is still in the future.
    ///
    /// Reads from the store rather than memory so the answer stays correct
    /// across process restarts.
    pub async fn user_is_locked(&self, name: &str) -> Result<bool, DomainError> {
        let record = self.require_record(columns::USER_NAME, &name.into()).await?;
        let user = User::from_record(&record)?;

        Ok(user.is_locked_at(Utc::now()))
    }

    /// Time until the account may attempt to log in again.
    ///
    /// An account with no lock on file reports zero remaining.
    pub async fn next_login_timeout(&self, name: &str) -> Result<TimeRemaining, DomainError> {
        let record = self.require_record(columns::USER_NAME, &name.into()).await?;
        let user = User::from_record(&record)?;

        let now = Utc::now();
        Ok(match user.locked_until() {
            Some(until) => TimeRemaining::until(until, now),
            None => TimeRemaining::until(now, now),
        })
    }

    /// Replace the user's password wholesale.
    pub async fn change_password(
        &self,
        user_id: i64,
        new_password: &str,
    ) -> Result<(), DomainError> {
        validate_password(new_password)?;
        self.require_record(columns::USER_ID, &user_id.into()).await?;

        let password_hash = self.hasher.hash(new_password)?;

        self.store
            .insert_value(
                &self.table,
                columns::USER_ID,
                &user_id.into(),
                columns::USER_PASSWORD,
                password_hash.into(),
            )
            .await?;

        info!(user_id, "password changed");
        Ok(())
    }

    /// Deactivate the user; deactivated accounts cannot log in or be deleted.
    pub async fn deactivate_user(&self, user_id: i64) -> Result<(), DomainError> {
        let record = self.require_record(columns::USER_ID, &user_id.into()).await?;
        let user = User::from_record(&record)?;

        if !user.is_active() {
            return Err(DomainError::inactive_user(format!(
                "user {user_id} is already inactive"
            )));
        }

        self.store
            .insert_value(
                &self.table,
                columns::USER_ID,
                &user_id.into(),
                columns::USER_ACTIVE,
                false.into(),
            )
            .await?;

        info!(user_id, "user deactivated");
        Ok(())
    }

    /// Delete the user record and the user's storage directory.
    ///
    /// The two are one logical unit: a record without its directory (or the
    /// reverse) indicates an earlier out-of-band removal and is reported as
    /// an internal defect.
    pub async fn delete_user(&self, user_id: i64) -> Result<(), DomainError> {
        let record = self.require_record(columns::USER_ID, &user_id.into()).await?;
        let user = User::from_record(&record)?;

        if !user.is_active() {
            return Err(DomainError::inactive_user(format!(
                "user {user_id} is inactive and cannot be deleted"
            )));
        }

        self.store
            .delete_record(&self.table, columns::USER_ID, &user_id.into())
            .await?;

        let dir = self.storage_root.join(user_id.to_string());
        if !dir.is_dir() {
            return Err(DomainError::internal(format!(
                "user data directory not found: '{}'",
                dir.display()
            )));
        }

        fs::remove_dir(&dir).await.map_err(|e| {
            DomainError::filesystem(format!(
                "failed to remove the user data directory '{}': {e}",
                dir.display()
            ))
        })?;

        self.throttle.forget(user.name()).await;

        info!(user_id, "user deleted");
        Ok(())
    }

    /// Probe whether a user record exists.
    pub async fn exists_user(&self, user_id: i64) -> Result<bool, DomainError> {
        Ok(self
            .store
            .get_record(&self.table, columns::USER_ID, &user_id.into())
            .await?
            .is_some())
    }

    async fn ensure_account_is_free(&self, name: &str, email: &str) -> Result<(), DomainError> {
        if self
            .store
            .get_record(&self.table, columns::USER_NAME, &name.into())
            .await?
            .is_some()
        {
            return Err(DomainError::conflict(format!(
                "an account already exists for user name: {name}"
            )));
        }

        if self
            .store
            .get_record(&self.table, columns::USER_EMAIL, &email.into())
            .await?
            .is_some()
        {
            return Err(DomainError::conflict(format!(
                "an account already exists for the email address: {email}"
            )));
        }

        Ok(())
    }

    /// Restore an account's throttle counters from the record store after a
    /// process restart.
    async fn hydrate_throttle(&self, name: &str, record: &Record) {
        if self.throttle.snapshot(name).await.is_some() {
            return;
        }

        let failed = record
            .get(columns::USER_FAILED_LOGINS)
            .and_then(FieldValue::as_i64)
            .and_then(|v| u32::try_from(v).ok());
        let last_attempt = record
            .get(columns::USER_LAST_ATTEMPT)
            .and_then(FieldValue::as_timestamp);

        if let (Some(failed), Some(last_attempt)) = (failed, last_attempt) {
            debug!(name, failed, "restoring attempt counters from the record store");
            self.throttle
                .seed(name, AttemptState::new(failed, last_attempt))
                .await;
        }
    }

    /// Write the account's counters back so throttling survives restarts.
    async fn persist_attempt_state(
        &self,
        name: &str,
        state: AttemptState,
    ) -> Result<(), DomainError> {
        let key: FieldValue = name.into();

        self.store
            .insert_value(
                &self.table,
                columns::USER_NAME,
                &key,
                columns::USER_FAILED_LOGINS,
                i64::from(state.failed_count).into(),
            )
            .await?;

        self.store
            .insert_value(
                &self.table,
                columns::USER_NAME,
                &key,
                columns::USER_LAST_ATTEMPT,
                state.last_attempt_at.into(),
            )
            .await
    }

    async fn create_user_directory(&self, user_id: i64) -> Result<(), DomainError> {
        let dir = self.storage_root.join(user_id.to_string());

        // Pre-existence means an earlier deletion bypassed the lifecycle.
        if dir.exists() {
            return Err(DomainError::internal(format!(
                "user data directory already exists: '{}'",
                dir.display()
            )));
        }

        fs::create_dir(&dir).await.map_err(|e| {
            DomainError::filesystem(format!(
                "failed to create the user data directory '{}': {e}",
                dir.display()
            ))
        })
    }

    async fn rollback_registration(&self, user_id: i64) {
        warn!(user_id, "rolling back user registration");

        if let Err(e) = self
            .store
            .delete_record(&self.table, columns::USER_ID, &user_id.into())
            .await
        {
            // The original failure is the one worth propagating; an orphaned
            // row is logged for operator attention.
            error!(user_id, error = %e, "failed to roll back the user record");
        }
    }

    async fn require_record(
        &self,
        key_column: &str,
        key: &FieldValue,
    ) -> Result<Record, DomainError> {
        self.store
            .get_record(&self.table, key_column, key)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("no user matched {key_column} = {key:?}")))
    }
}
