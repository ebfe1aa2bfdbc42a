//! Abstract record-store contract
//!
//! The lifecycle service never talks to a concrete database. It works against
//! this narrow key-column/value-column interface, which any relational (or
//! in-memory) backend can implement.

use std::collections::HashMap;
use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// A single column value in a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Int(i64),
    Text(String),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    Null,
}

impl FieldValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

/// A row as a column-name to value map
pub type Record = HashMap<String, FieldValue>;

/// Storage trait for keyed record access
///
/// All writes are expected to commit immediately; no multi-statement
/// transaction is exposed here. Underlying failures surface as
/// [`DomainError::Storage`].
#[async_trait]
pub trait RecordStore: Send + Sync + Debug {
    /// Fetch the first record whose `key_column` equals `key`
    async fn get_record(
        &self,
        table: &str,
        key_column: &str,
        key: &FieldValue,
    ) -> Result<Option<Record>, DomainError>;

    /// Insert a new record and return its assigned id
    async fn create_record(&self, table: &str, fields: Record) -> Result<i64, DomainError>;

    /// Delete the record matching `key` and return its former field map
    async fn delete_record(
        &self,
        table: &str,
        key_column: &str,
        key: &FieldValue,
    ) -> Result<Record, DomainError>;

    /// Set a single column on the record matching `key`
    async fn insert_value(
        &self,
        table: &str,
        key_column: &str,
        key: &FieldValue,
        value_column: &str,
        value: FieldValue,
    ) -> Result<(), DomainError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// Mock record store for testing
    ///
    /// Backed by a single auto-increment table map, with per-operation fail
    /// switches so multi-step workflows can be interrupted at any point.
    #[derive(Debug, Default)]
    pub struct MockRecordStore {
        rows: Arc<RwLock<HashMap<i64, Record>>>,
        next_id: Arc<RwLock<i64>>,
        fail_create: Arc<RwLock<bool>>,
        fail_insert_value: Arc<RwLock<bool>>,
        fail_delete: Arc<RwLock<bool>>,
        fail_get: Arc<RwLock<bool>>,
    }

    impl MockRecordStore {
        pub fn new() -> Self {
            Self {
                next_id: Arc::new(RwLock::new(1)),
                ..Self::default()
            }
        }

        pub async fn set_fail_create(&self, fail: bool) {
            *self.fail_create.write().await = fail;
        }

        pub async fn set_fail_insert_value(&self, fail: bool) {
            *self.fail_insert_value.write().await = fail;
        }

        pub async fn set_fail_delete(&self, fail: bool) {
            *self.fail_delete.write().await = fail;
        }

        pub async fn set_fail_get(&self, fail: bool) {
            *self.fail_get.write().await = fail;
        }

        pub async fn row_count(&self) -> usize {
            self.rows.read().await.len()
        }
    }

    #[async_trait]
    impl RecordStore for MockRecordStore {
        async fn get_record(
            &self,
            _table: &str,
            key_column: &str,
            key: &FieldValue,
        ) -> Result<Option<Record>, DomainError> {
            if *self.fail_get.read().await {
                return Err(DomainError::storage("mock store configured to fail"));
            }

            let rows = self.rows.read().await;
            Ok(rows
                .values()
                .find(|row| row.get(key_column) == Some(key))
                .cloned())
        }

        async fn create_record(&self, _table: &str, fields: Record) -> Result<i64, DomainError> {
            if *self.fail_create.read().await {
                return Err(DomainError::storage("mock store configured to fail"));
            }

            let mut next_id = self.next_id.write().await;
            let id = *next_id;
            *next_id += 1;

            let mut row = fields;
            row.insert("user_id".to_string(), FieldValue::Int(id));
            self.rows.write().await.insert(id, row);

            Ok(id)
        }

        async fn delete_record(
            &self,
            _table: &str,
            key_column: &str,
            key: &FieldValue,
        ) -> Result<Record, DomainError> {
            if *self.fail_delete.read().await {
                return Err(DomainError::storage("mock store configured to fail"));
            }

            let mut rows = self.rows.write().await;
            let id = rows
                .iter()
                .find(|(_, row)| row.get(key_column) == Some(key))
                .map(|(id, _)| *id)
                .ok_or_else(|| DomainError::not_found("no record matched the key"))?;

            Ok(rows.remove(&id).unwrap_or_default())
        }

        async fn insert_value(
            &self,
            _table: &str,
            key_column: &str,
            key: &FieldValue,
            value_column: &str,
            value: FieldValue,
        ) -> Result<(), DomainError> {
            if *self.fail_insert_value.read().await {
                return Err(DomainError::storage("mock store configured to fail"));
            }

            let mut rows = self.rows.write().await;
            let row = rows
                .values_mut()
                .find(|row| row.get(key_column) == Some(key))
                .ok_or_else(|| DomainError::storage("no record matched the key"))?;

            row.insert(value_column.to_string(), value);
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_create_and_get() {
            let store = MockRecordStore::new();

            let mut fields = Record::new();
            fields.insert("user_name".to_string(), "alice1".into());

            let id = store.create_record("users", fields).await.unwrap();
            assert_eq!(id, 1);

            let record = store
                .get_record("users", "user_name", &"alice1".into())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(record.get("user_id"), Some(&FieldValue::Int(1)));
        }

        #[tokio::test]
        async fn test_insert_value_then_delete() {
            let store = MockRecordStore::new();

            let mut fields = Record::new();
            fields.insert("user_name".to_string(), "alice1".into());
            let id = store.create_record("users", fields).await.unwrap();

            store
                .insert_value("users", "user_id", &id.into(), "user_active", false.into())
                .await
                .unwrap();

            let deleted = store
                .delete_record("users", "user_id", &id.into())
                .await
                .unwrap();
            assert_eq!(deleted.get("user_active"), Some(&FieldValue::Bool(false)));
            assert_eq!(store.row_count().await, 0);
        }

        #[tokio::test]
        async fn test_fail_switch() {
            let store = MockRecordStore::new();
            store.set_fail_create(true).await;

            let result = store.create_record("users", Record::new()).await;
            assert!(matches!(result, Err(DomainError::Storage { .. })));
        }
    }
}
