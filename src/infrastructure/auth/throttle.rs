//! Failed-login throttling
//!
//! Counts login attempts per account and signals when an account has burned
//! through its budget. The window rule is deliberate and unusual: an attempt
//! arriving within `window_minutes` of the previous one increments the
//! counter, while an attempt arriving after the window has elapsed resets it
//! to zero. Rapid retries are penalized; slow ones are forgiven.
//!
//! State is kept per account behind a single `RwLock`, so concurrent attempts
//! against different accounts never interfere. Callers persist the returned
//! snapshot (and the lock expiry) on the account record so throttling
//! survives a process restart.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::domain::DomainError;

/// Throttling policy knobs
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ThrottlePolicy {
    /// Maximum failed attempts inside the window. Zero disables throttling.
    pub max_attempts: u32,
    /// Minutes an attempt counts against the next one
    pub window_minutes: i64,
    /// Minutes an account stays locked once the budget is exceeded
    pub lock_minutes: i64,
}

impl ThrottlePolicy {
    pub fn new(max_attempts: u32, window_minutes: i64, lock_minutes: i64) -> Self {
        Self {
            max_attempts,
            window_minutes,
            lock_minutes,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.max_attempts == 0
    }

    /// Instant at which a lock imposed now would expire
    pub fn lock_until(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::minutes(self.lock_minutes)
    }
}

impl Default for ThrottlePolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            window_minutes: 1,
            lock_minutes: 15,
        }
    }
}

/// Per-account attempt bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptState {
    pub failed_count: u32,
    pub last_attempt_at: DateTime<Utc>,
}

impl AttemptState {
    pub fn new(failed_count: u32, last_attempt_at: DateTime<Utc>) -> Self {
        Self {
            failed_count,
            last_attempt_at,
        }
    }
}

/// Remaining lock duration, decomposed for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRemaining {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl TimeRemaining {
    /// Decompose a duration; negative durations clamp to zero.
    pub fn from_duration(duration: Duration) -> Self {
        let total = duration.num_seconds().max(0);

        Self {
            days: total / 86_400,
            hours: (total % 86_400) / 3_600,
            minutes: (total % 3_600) / 60,
            seconds: total % 60,
        }
    }

    /// Time left until `locked_until`, measured from `now`
    pub fn until(locked_until: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self::from_duration(locked_until - now)
    }

    pub fn is_zero(&self) -> bool {
        self.days == 0 && self.hours == 0 && self.minutes == 0 && self.seconds == 0
    }
}

/// Per-account sliding-window attempt throttle
#[derive(Debug)]
pub struct AttemptThrottle {
    policy: ThrottlePolicy,
    accounts: RwLock<HashMap<String, AttemptState>>,
}

impl AttemptThrottle {
    pub fn new(policy: ThrottlePolicy) -> Self {
        Self {
            policy,
            accounts: RwLock::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &ThrottlePolicy {
        &self.policy
    }

    /// Install state recovered from the record store, unless fresher
    /// in-memory state already exists for the account.
    pub async fn seed(&self, account: &str, state: AttemptState) {
        let mut accounts = self.accounts.write().await;
        accounts.entry(account.to_string()).or_insert(state);
    }

    /// Current in-memory state for an account, if any
    pub async fn snapshot(&self, account: &str) -> Option<AttemptState> {
        self.accounts.read().await.get(account).copied()
    }

    /// Drop an account's counters (e.g. after the account is deleted)
    pub async fn forget(&self, account: &str) {
        self.accounts.write().await.remove(account);
    }

    /// Record a login attempt against an account.
    ///
    /// Returns the updated state for persistence, or `None` when throttling
    /// is disabled. Signals [`DomainError::MaxAttemptsExceeded`] on the
    /// attempt that pushes the count past the budget; the caller is expected
    /// to turn that into an account lock.
    pub async fn record_attempt(&self, account: &str) -> Result<Option<AttemptState>, DomainError> {
        if self.policy.is_disabled() {
            tracing::debug!(account, "login throttling is disabled");
            return Ok(None);
        }

        let now = Utc::now();
        let window = Duration::minutes(self.policy.window_minutes);

        let mut accounts = self.accounts.write().await;
        let state = accounts
            .entry(account.to_string())
            .or_insert_with(|| AttemptState::new(0, now));

        // Within the window of the previous attempt: penalize the retry.
        // Outside it: forgive and start over.
        if state.last_attempt_at + window > now {
            state.failed_count += 1;
            tracing::debug!(account, failed_count = state.failed_count, "attempt counter incremented");
        } else {
            state.failed_count = 0;
            tracing::debug!(account, "attempt counter reset");
        }

        state.last_attempt_at = now;

        if state.failed_count > self.policy.max_attempts {
            tracing::warn!(
                account,
                failed_count = state.failed_count,
                max_attempts = self.policy.max_attempts,
                "maximum login attempts exceeded"
            );
            return Err(DomainError::MaxAttemptsExceeded);
        }

        Ok(Some(*state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn throttle(max_attempts: u32, window_minutes: i64) -> AttemptThrottle {
        AttemptThrottle::new(ThrottlePolicy::new(max_attempts, window_minutes, 15))
    }

    #[tokio::test]
    async fn test_rapid_attempts_raise_on_the_fourth() {
        let throttle = throttle(3, 1);

        for attempt in 1..=3 {
            let state = throttle.record_attempt("alice1").await.unwrap().unwrap();
            assert_eq!(state.failed_count, attempt);
        }

        let result = throttle.record_attempt("alice1").await;
        assert!(matches!(result, Err(DomainError::MaxAttemptsExceeded)));
    }

    #[tokio::test]
    async fn test_slow_attempts_reset_and_never_raise() {
        let throttle = throttle(3, 1);
        let long_ago = Utc::now() - Duration::minutes(10);

        for _ in 0..10 {
            // Backdate the previous attempt so each new one lands outside
            // the window.
            {
                let mut accounts = throttle.accounts.write().await;
                accounts.insert("alice1".to_string(), AttemptState::new(2, long_ago));
            }

            let state = throttle.record_attempt("alice1").await.unwrap().unwrap();
            assert_eq!(state.failed_count, 0);
        }
    }

    #[tokio::test]
    async fn test_disabled_policy_is_a_no_op() {
        let throttle = throttle(0, 1);

        for _ in 0..50 {
            let state = throttle.record_attempt("alice1").await.unwrap();
            assert!(state.is_none());
        }
        assert!(throttle.snapshot("alice1").await.is_none());
    }

    #[tokio::test]
    async fn test_accounts_do_not_interfere() {
        let throttle = throttle(3, 1);

        for _ in 0..3 {
            throttle.record_attempt("alice1").await.unwrap();
        }

        // A different account still has its full budget.
        let state = throttle.record_attempt("bob22").await.unwrap().unwrap();
        assert_eq!(state.failed_count, 1);
    }

    #[tokio::test]
    async fn test_seed_does_not_clobber_live_state() {
        let throttle = throttle(5, 1);

        throttle.record_attempt("alice1").await.unwrap();
        let live = throttle.snapshot("alice1").await.unwrap();

        throttle
            .seed("alice1", AttemptState::new(4, Utc::now() - Duration::hours(1)))
            .await;

        assert_eq!(throttle.snapshot("alice1").await.unwrap(), live);
    }

    #[tokio::test]
    async fn test_seeded_state_counts_against_the_budget() {
        let throttle = throttle(3, 5);

        throttle
            .seed("alice1", AttemptState::new(3, Utc::now()))
            .await;

        let result = throttle.record_attempt("alice1").await;
        assert!(matches!(result, Err(DomainError::MaxAttemptsExceeded)));
    }

    #[tokio::test]
    async fn test_forget_clears_counters() {
        let throttle = throttle(3, 1);

        throttle.record_attempt("alice1").await.unwrap();
        throttle.forget("alice1").await;

        assert!(throttle.snapshot("alice1").await.is_none());
    }

    #[test]
    fn test_time_remaining_decomposition() {
        let remaining = TimeRemaining::from_duration(
            Duration::days(1) + Duration::hours(2) + Duration::minutes(3) + Duration::seconds(4),
        );

        assert_eq!(remaining.days, 1);
        assert_eq!(remaining.hours, 2);
        assert_eq!(remaining.minutes, 3);
        assert_eq!(remaining.seconds, 4);
        assert!(!remaining.is_zero());
    }

    #[test]
    fn test_time_remaining_clamps_past_instants() {
        let now = Utc::now();
        let remaining = TimeRemaining::until(now - Duration::minutes(5), now);

        assert!(remaining.is_zero());
    }

    #[test]
    fn test_lock_until_uses_lock_minutes() {
        let policy = ThrottlePolicy::new(3, 1, 30);
        let now = Utc::now();

        assert_eq!(policy.lock_until(now), now + Duration::minutes(30));
    }
}
