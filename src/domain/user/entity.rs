//! User entity and record mapping

use chrono::{DateTime, Utc};

use crate::domain::store::{FieldValue, Record};
use crate::domain::DomainError;

/// Column names of the users table
pub mod columns {
    pub const USER_ID: &str = "user_id";
    pub const USER_NAME: &str = "user_name";
    pub const USER_EMAIL: &str = "user_email";
    pub const USER_PASSWORD: &str = "user_password";
    pub const USER_TOKEN: &str = "user_token";
    pub const USER_ACTIVE: &str = "user_active";
    pub const USER_REGISTRATION_DATE: &str = "user_registration_date";
    pub const USER_LOCKED_UNTIL: &str = "user_locked_until";
    pub const USER_FAILED_LOGINS: &str = "user_failed_logins";
    pub const USER_LAST_ATTEMPT: &str = "user_last_attempt";
}

/// User account as read from the record store
#[derive(Debug, Clone)]
pub struct User {
    id: i64,
    name: String,
    email: String,
    password_hash: String,
    token: Option<String>,
    active: bool,
    registration_date: DateTime<Utc>,
    locked_until: Option<DateTime<Utc>>,
    failed_logins: i64,
    last_attempt: Option<DateTime<Utc>>,
}

impl User {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    /// Last-issued authentication token, used as the revocation check
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn registration_date(&self) -> DateTime<Utc> {
        self.registration_date
    }

    pub fn locked_until(&self) -> Option<DateTime<Utc>> {
        self.locked_until
    }

    pub fn failed_logins(&self) -> i64 {
        self.failed_logins
    }

    pub fn last_attempt(&self) -> Option<DateTime<Utc>> {
        self.last_attempt
    }

    /// A `locked_until` in the future means the account is locked
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }

    /// Map a raw store record onto the entity.
    ///
    /// A record missing a required column is a data defect, reported as an
    /// internal error rather than an authentication outcome.
    pub fn from_record(record: &Record) -> Result<Self, DomainError> {
        Ok(Self {
            id: require_i64(record, columns::USER_ID)?,
            name: require_text(record, columns::USER_NAME)?,
            email: require_text(record, columns::USER_EMAIL)?,
            password_hash: require_text(record, columns::USER_PASSWORD)?,
            token: optional_text(record, columns::USER_TOKEN),
            active: require_bool(record, columns::USER_ACTIVE)?,
            registration_date: require_timestamp(record, columns::USER_REGISTRATION_DATE)?,
            locked_until: optional_timestamp(record, columns::USER_LOCKED_UNTIL),
            failed_logins: optional_i64(record, columns::USER_FAILED_LOGINS).unwrap_or(0),
            last_attempt: optional_timestamp(record, columns::USER_LAST_ATTEMPT),
        })
    }

    /// Field map for a brand-new account record
    pub fn registration_fields(
        name: &str,
        email: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Record {
        let mut fields = Record::new();
        fields.insert(columns::USER_NAME.to_string(), name.into());
        fields.insert(columns::USER_EMAIL.to_string(), email.into());
        fields.insert(columns::USER_PASSWORD.to_string(), password_hash.into());
        fields.insert(columns::USER_ACTIVE.to_string(), true.into());
        fields.insert(columns::USER_REGISTRATION_DATE.to_string(), now.into());
        fields.insert(columns::USER_LOCKED_UNTIL.to_string(), FieldValue::Null);
        fields.insert(columns::USER_FAILED_LOGINS.to_string(), 0_i64.into());
        fields.insert(columns::USER_LAST_ATTEMPT.to_string(), now.into());
        fields
    }
}

fn missing(column: &str) -> DomainError {
    DomainError::internal(format!("user record is missing column: {column}"))
}

fn require_i64(record: &Record, column: &str) -> Result<i64, DomainError> {
    record
        .get(column)
        .and_then(FieldValue::as_i64)
        .ok_or_else(|| missing(column))
}

fn require_text(record: &Record, column: &str) -> Result<String, DomainError> {
    record
        .get(column)
        .and_then(FieldValue::as_str)
        .map(str::to_string)
        .ok_or_else(|| missing(column))
}

fn require_bool(record: &Record, column: &str) -> Result<bool, DomainError> {
    record
        .get(column)
        .and_then(FieldValue::as_bool)
        .ok_or_else(|| missing(column))
}

fn require_timestamp(record: &Record, column: &str) -> Result<DateTime<Utc>, DomainError> {
    record
        .get(column)
        .and_then(FieldValue::as_timestamp)
        .ok_or_else(|| missing(column))
}

fn optional_text(record: &Record, column: &str) -> Option<String> {
    record
        .get(column)
        .and_then(FieldValue::as_str)
        .map(str::to_string)
}

fn optional_i64(record: &Record, column: &str) -> Option<i64> {
    record.get(column).and_then(FieldValue::as_i64)
}

fn optional_timestamp(record: &Record, column: &str) -> Option<DateTime<Utc>> {
    record.get(column).and_then(FieldValue::as_timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_record() -> Record {
        let mut record = User::registration_fields(
            "alice1",
            "alice@example.com",
            "argon2-hash",
            Utc::now(),
        );
        record.insert(columns::USER_ID.to_string(), 7_i64.into());
        record
    }

    #[test]
    fn test_from_record_round_trip() {
        let user = User::from_record(&sample_record()).unwrap();

        assert_eq!(user.id(), 7);
        assert_eq!(user.name(), "alice1");
        assert_eq!(user.email(), "alice@example.com");
        assert_eq!(user.password_hash(), "argon2-hash");
        assert!(user.is_active());
        assert!(user.token().is_none());
        assert_eq!(user.failed_logins(), 0);
        assert!(user.locked_until().is_none());
    }

    #[test]
    fn test_missing_column_is_internal_error() {
        let mut record = sample_record();
        record.remove(columns::USER_PASSWORD);

        let result = User::from_record(&record);
        assert!(matches!(result, Err(DomainError::Internal { .. })));
    }

    #[test]
    fn test_null_locked_until_means_unlocked() {
        let user = User::from_record(&sample_record()).unwrap();
        assert!(!user.is_locked_at(Utc::now()));
    }

    #[test]
    fn test_future_locked_until_means_locked() {
        let now = Utc::now();
        let mut record = sample_record();
        record.insert(
            columns::USER_LOCKED_UNTIL.to_string(),
            (now + Duration::minutes(10)).into(),
        );

        let user = User::from_record(&record).unwrap();
        assert!(user.is_locked_at(now));
        assert!(!user.is_locked_at(now + Duration::minutes(11)));
    }
}
