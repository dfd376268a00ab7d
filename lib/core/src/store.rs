//! Storage collaborator.
//!
//! [`RecordStore`] is the byte-level contract a backend has to provide:
//! insert, point lookup, full scan, update-by-key and count, with no
//! transactions. [`Records`] layers typed access on top of it (encoding,
//! scan filters and ordering).

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;
use crate::filter::Filter;
use crate::{Error, Result};

/// Logical record sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Corpus,
    Corrections,
    Feedback,
    Catalog,
    Users,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Corpus,
        Table::Corrections,
        Table::Feedback,
        Table::Catalog,
        Table::Users,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Corpus => "sku_images",
            Table::Corrections => "feedback_training",
            Table::Feedback => "user_feedback",
            Table::Catalog => "master_table",
            Table::Users => "users",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

pub trait RecordStore: Send + Sync {
    /// Write `value` under `key`, replacing any previous value.
    fn insert(&self, table: Table, key: &str, value: &[u8]) -> Result<()>;

    fn get(&self, table: Table, key: &str) -> Result<Option<Vec<u8>>>;

    /// All rows of `table` in key order.
    fn scan(&self, table: Table) -> Result<Vec<(String, Vec<u8>)>>;

    /// Replace the value of an existing key. Returns `false` if the key is absent.
    fn update(&self, table: Table, key: &str, value: &[u8]) -> Result<bool>;

    fn count(&self, table: Table) -> Result<usize>;

    fn is_connected(&self) -> bool {
        true
    }
}

/// A typed row of one [`Table`].
pub trait Record: Serialize + DeserializeOwned {
    const TABLE: Table;

    fn key(&self) -> &str;

    fn created_at(&self) -> Option<DateTime<Utc>> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanOrder {
    /// Storage key order.
    #[default]
    Key,
    /// `created_at` descending; ties keep key order.
    NewestFirst,
}

/// Typed view over a [`RecordStore`].
#[derive(Clone)]
pub struct Records {
    store: Arc<dyn RecordStore>,
}

impl Records {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn insert<R: Record>(&self, record: &R) -> Result<()> {
        let bytes = bincode::serialize(record)?;
        self.store
            .insert(R::TABLE, record.key(), &bytes)
            .map_err(into_write_error)
    }

    pub fn get<R: Record>(&self, key: &str) -> Result<Option<R>> {
        match self.store.get(R::TABLE, key)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn update<R: Record>(&self, record: &R) -> Result<bool> {
        let bytes = bincode::serialize(record)?;
        self.store
            .update(R::TABLE, record.key(), &bytes)
            .map_err(into_write_error)
    }

    /// Decode every row of `R::TABLE`, keep those accepted by `filter`, and
    /// order them. Rows that fail to decode are skipped.
    pub fn scan<R: Record>(&self, filter: Option<&dyn Filter<R>>, order: ScanOrder) -> Result<Vec<R>> {
        let table = R::TABLE;
        let rows = self.store.scan(table)?;
        let mut records = Vec::with_capacity(rows.len());

        for (key, bytes) in rows {
            match bincode::deserialize::<R>(&bytes) {
                Ok(record) => {
                    if filter.map(|f| f.matches(&record)).unwrap_or(true) {
                        records.push(record);
                    }
                }
                Err(e) => {
                    warn!(table = %table, key = %key, error = %e, "skipping undecodable row");
                }
            }
        }

        if order == ScanOrder::NewestFirst {
            records.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        }

        Ok(records)
    }

    pub fn count<R: Record>(&self) -> Result<usize> {
        self.store.count(R::TABLE)
    }
}

fn into_write_error(e: Error) -> Error {
    match e {
        Error::Storage(msg) => Error::StorageWrite(msg),
        other => other,
    }
}

/// Stand-in used when the backend could not be opened. Every call fails with
/// [`Error::StorageUnavailable`] so reads degrade and writes surface the outage.
pub struct DisconnectedStore {
    reason: String,
}

impl DisconnectedStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn unavailable<T>(&self) -> Result<T> {
        Err(Error::StorageUnavailable(self.reason.clone()))
    }
}

impl RecordStore for DisconnectedStore {
    fn insert(&self, _table: Table, _key: &str, _value: &[u8]) -> Result<()> {
        self.unavailable()
    }

    fn get(&self, _table: Table, _key: &str) -> Result<Option<Vec<u8>>> {
        self.unavailable()
    }

    fn scan(&self, _table: Table) -> Result<Vec<(String, Vec<u8>)>> {
        self.unavailable()
    }

    fn update(&self, _table: Table, _key: &str, _value: &[u8]) -> Result<bool> {
        self.unavailable()
    }

    fn count(&self, _table: Table) -> Result<usize> {
        self.unavailable()
    }

    fn is_connected(&self) -> bool {
        false
    }
}
