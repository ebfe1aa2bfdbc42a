//! In-memory record store
//!
//! A real, embeddable [`RecordStore`] backend. Useful for demos, integration
//! tests and single-process deployments that do not warrant an external
//! database. Each table is an independent map with its own auto-increment
//! counter.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::store::{FieldValue, Record, RecordStore};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct Table {
    rows: HashMap<i64, Record>,
    next_id: i64,
}

impl Table {
    fn new() -> Self {
        Self {
            rows: HashMap::new(),
            next_id: 1,
        }
    }

    fn find_id(&self, key_column: &str, key: &FieldValue) -> Option<i64> {
        self.rows
            .iter()
            .find(|(_, row)| row.get(key_column) == Some(key))
            .map(|(id, _)| *id)
    }
}

/// Record store backed by process memory
///
/// Assigned ids are written back into each record under the configured id
/// column, so key lookups by id work the same as against a relational
/// backend.
#[derive(Debug)]
pub struct InMemoryRecordStore {
    id_column: String,
    tables: RwLock<HashMap<String, Table>>,
}

impl InMemoryRecordStore {
    pub fn new(id_column: impl Into<String>) -> Self {
        Self {
            id_column: id_column.into(),
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Number of rows currently held in `table`
    pub async fn row_count(&self, table: &str) -> usize {
        self.tables
            .read()
            .await
            .get(table)
            .map_or(0, |t| t.rows.len())
    }
}

#[async_trait::async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn get_record(
        &self,
        table: &str,
        key_column: &str,
        key: &FieldValue,
    ) -> Result<Option<Record>, DomainError> {
        let tables = self.tables.read().await;

        Ok(tables.get(table).and_then(|t| {
            t.find_id(key_column, key)
                .and_then(|id| t.rows.get(&id).cloned())
        }))
    }

    async fn create_record(&self, table: &str, fields: Record) -> Result<i64, DomainError> {
        let mut tables = self.tables.write().await;
        let t = tables.entry(table.to_string()).or_insert_with(Table::new);

        let id = t.next_id;
        t.next_id += 1;

        let mut row = fields;
        row.insert(self.id_column.clone(), FieldValue::Int(id));
        t.rows.insert(id, row);

        debug!(table, id, "record created");
        Ok(id)
    }

    async fn delete_record(
        &self,
        table: &str,
        key_column: &str,
        key: &FieldValue,
    ) -> Result<Record, DomainError> {
        let mut tables = self.tables.write().await;

        let t = tables
            .get_mut(table)
            .ok_or_else(|| DomainError::storage(format!("no such table: {table}")))?;

        let id = t.find_id(key_column, key).ok_or_else(|| {
            DomainError::not_found(format!("no record in '{table}' matched {key_column}"))
        })?;

        debug!(table, id, "record deleted");
        Ok(t.rows.remove(&id).unwrap_or_default())
    }

    async fn insert_value(
        &self,
        table: &str,
        key_column: &str,
        key: &FieldValue,
        value_column: &str,
        value: FieldValue,
    ) -> Result<(), DomainError> {
        let mut tables = self.tables.write().await;

        let t = tables
            .get_mut(table)
            .ok_or_else(|| DomainError::storage(format!("no such table: {table}")))?;

        let id = t.find_id(key_column, key).ok_or_else(|| {
            DomainError::storage(format!("no record in '{table}' matched {key_column}"))
        })?;

        if let Some(row) = t.rows.get_mut(&id) {
            row.insert(value_column.to_string(), value);
        }

        Ok(())
    }
}
