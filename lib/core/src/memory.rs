use parking_lot::RwLock;
use std::collections::BTreeMap;
use crate::store::{RecordStore, Table};
use crate::Result;

/// In-process [`RecordStore`] backed by ordered maps.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<BTreeMap<Table, BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn insert(&self, table: Table, key: &str, value: &[u8]) -> Result<()> {
        self.tables
            .write()
            .entry(table)
            .or_default()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get(&self, table: Table, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .tables
            .read()
            .get(&table)
            .and_then(|rows| rows.get(key).cloned()))
    }

    fn scan(&self, table: Table) -> Result<Vec<(String, Vec<u8>)>> {
        Ok(self
            .tables
            .read()
            .get(&table)
            .map(|rows| rows.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }

    fn update(&self, table: Table, key: &str, value: &[u8]) -> Result<bool> {
        let mut tables = self.tables.write();
        match tables.get_mut(&table).and_then(|rows| rows.get_mut(key)) {
            Some(existing) => {
                *existing = value.to_vec();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn count(&self, table: Table) -> Result<usize> {
        Ok(self.tables.read().get(&table).map(|rows| rows.len()).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_scan_update() {
        let store = MemoryStore::new();
        store.insert(Table::Corpus, "b", b"2").unwrap();
        store.insert(Table::Corpus, "a", b"1").unwrap();

        let rows = store.scan(Table::Corpus).unwrap();
        assert_eq!(rows[0].0, "a");
        assert_eq!(rows[1].0, "b");
        assert_eq!(store.count(Table::Corpus).unwrap(), 2);
        assert_eq!(store.count(Table::Feedback).unwrap(), 0);

        assert!(store.update(Table::Corpus, "a", b"9").unwrap());
        assert!(!store.update(Table::Corpus, "zz", b"9").unwrap());
        assert_eq!(store.get(Table::Corpus, "a").unwrap().unwrap(), b"9");
        assert!(store.get(Table::Corpus, "zz").unwrap().is_none());
    }
}
