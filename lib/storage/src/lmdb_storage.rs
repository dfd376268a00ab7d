// LMDB-backed record tables, one named database per table
use anyhow::Result;
use heed::types::{Bytes, Str};
use heed::{Database, Env, EnvOpenOptions};
use skulens_core::{Error, RecordStore, Table};
use std::path::Path;
use std::sync::Arc;

/// Default LMDB map size (100 GiB). Corpus rows carry raw image bytes.
pub const DEFAULT_MAP_SIZE: usize = 100 * 1024 * 1024 * 1024;

type RowDb = Database<Str, Bytes>;

pub struct LmdbStore {
    env: Arc<Env>,
    corpus_db: RowDb,
    corrections_db: RowDb,
    feedback_db: RowDb,
    catalog_db: RowDb,
    users_db: RowDb,
}

impl LmdbStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_map_size(path, DEFAULT_MAP_SIZE)
    }

    pub fn with_map_size<P: AsRef<Path>>(path: P, map_size: usize) -> Result<Self> {
        std::fs::create_dir_all(&path)?;

        let env = Arc::new(unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(Table::ALL.len() as u32)
                .open(path)?
        });

        let mut wtxn = env.write_txn()?;
        let corpus_db = env.create_database(&mut wtxn, Some(Table::Corpus.name()))?;
        let corrections_db = env.create_database(&mut wtxn, Some(Table::Corrections.name()))?;
        let feedback_db = env.create_database(&mut wtxn, Some(Table::Feedback.name()))?;
        let catalog_db = env.create_database(&mut wtxn, Some(Table::Catalog.name()))?;
        let users_db = env.create_database(&mut wtxn, Some(Table::Users.name()))?;
        wtxn.commit()?;

        Ok(Self {
            env,
            corpus_db,
            corrections_db,
            feedback_db,
            catalog_db,
            users_db,
        })
    }

    fn db(&self, table: Table) -> &RowDb {
        match table {
            Table::Corpus => &self.corpus_db,
            Table::Corrections => &self.corrections_db,
            Table::Feedback => &self.feedback_db,
            Table::Catalog => &self.catalog_db,
            Table::Users => &self.users_db,
        }
    }

    pub fn put_row(&self, table: Table, key: &str, data: &[u8]) -> Result<()> {
        let mut wtxn = self.env.write_txn()?;
        self.db(table).put(&mut wtxn, key, data)?;
        wtxn.commit()?;
        Ok(())
    }

    pub fn get_row(&self, table: Table, key: &str) -> Result<Option<Vec<u8>>> {
        let rtxn = self.env.read_txn()?;
        match self.db(table).get(&rtxn, key)? {
            Some(data) => Ok(Some(data.to_vec())),
            None => Ok(None),
        }
    }

    pub fn list_rows(&self, table: Table) -> Result<Vec<(String, Vec<u8>)>> {
        let rtxn = self.env.read_txn()?;
        let mut rows = Vec::new();
        for result in self.db(table).iter(&rtxn)? {
            let (key, data) = result?;
            rows.push((key.to_string(), data.to_vec()));
        }
        Ok(rows)
    }

    /// Replace an existing row. Delete and put share one write transaction.
    pub fn replace_row(&self, table: Table, key: &str, data: &[u8]) -> Result<bool> {
        let mut wtxn = self.env.write_txn()?;
        let db = self.db(table);
        if !db.delete(&mut wtxn, key)? {
            return Ok(false);
        }
        db.put(&mut wtxn, key, data)?;
        wtxn.commit()?;
        Ok(true)
    }

    pub fn row_count(&self, table: Table) -> Result<usize> {
        let rtxn = self.env.read_txn()?;
        Ok(self.db(table).len(&rtxn)? as usize)
    }
}

fn storage_error(e: anyhow::Error) -> Error {
    Error::Storage(e.to_string())
}

impl RecordStore for LmdbStore {
    fn insert(&self, table: Table, key: &str, value: &[u8]) -> skulens_core::Result<()> {
        self.put_row(table, key, value).map_err(storage_error)
    }

    fn get(&self, table: Table, key: &str) -> skulens_core::Result<Option<Vec<u8>>> {
        self.get_row(table, key).map_err(storage_error)
    }

    fn scan(&self, table: Table) -> skulens_core::Result<Vec<(String, Vec<u8>)>> {
        self.list_rows(table).map_err(storage_error)
    }

    fn update(&self, table: Table, key: &str, value: &[u8]) -> skulens_core::Result<bool> {
        self.replace_row(table, key, value).map_err(storage_error)
    }

    fn count(&self, table: Table) -> skulens_core::Result<usize> {
        self.row_count(table).map_err(storage_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_MAP_SIZE: usize = 64 * 1024 * 1024;

    #[test]
    fn test_rows_roundtrip_and_persist() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = LmdbStore::with_map_size(dir.path(), TEST_MAP_SIZE).unwrap();
            store.put_row(Table::Corpus, "b", b"two").unwrap();
            store.put_row(Table::Corpus, "a", b"one").unwrap();
            store.put_row(Table::Feedback, "a", b"other table").unwrap();
        }

        let store = LmdbStore::with_map_size(dir.path(), TEST_MAP_SIZE).unwrap();
        let rows = store.list_rows(Table::Corpus).unwrap();
        assert_eq!(
            rows,
            vec![
                ("a".to_string(), b"one".to_vec()),
                ("b".to_string(), b"two".to_vec()),
            ]
        );
        assert_eq!(store.row_count(Table::Corpus).unwrap(), 2);
        assert_eq!(store.row_count(Table::Catalog).unwrap(), 0);
        assert_eq!(store.get_row(Table::Feedback, "a").unwrap().unwrap(), b"other table");
    }

    #[test]
    fn test_replace_only_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let store = LmdbStore::with_map_size(dir.path(), TEST_MAP_SIZE).unwrap();
        assert!(!store.replace_row(Table::Feedback, "f1", b"x").unwrap());
        assert!(store.get_row(Table::Feedback, "f1").unwrap().is_none());

        store.put_row(Table::Feedback, "f1", b"pending").unwrap();
        assert!(store.replace_row(Table::Feedback, "f1", b"approved").unwrap());
        assert_eq!(store.get_row(Table::Feedback, "f1").unwrap().unwrap(), b"approved");
        assert_eq!(store.row_count(Table::Feedback).unwrap(), 1);
    }
}
