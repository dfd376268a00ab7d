//! Master catalog and user directory collaborators.

use std::sync::Arc;
use tracing::debug;
use crate::record::{CatalogEntry, UserRecord};
use crate::store::{RecordStore, Records, ScanOrder};
use crate::Result;

/// Catalog validation: is a code a recognized master entry, and what is it.
pub trait Catalog: Send + Sync {
    /// Look up a code. Surrounding whitespace is ignored.
    fn lookup(&self, code: &str) -> Result<Option<CatalogEntry>>;

    /// All entries ordered by code.
    fn entries(&self) -> Result<Vec<CatalogEntry>>;

    fn size(&self) -> Result<usize>;
}

/// Resolves submitter ids to display names.
pub trait UserDirectory: Send + Sync {
    fn username(&self, user_id: &str) -> Option<String>;
}

/// Catalog stored in the master table of a [`RecordStore`].
#[derive(Clone)]
pub struct StoreCatalog {
    records: Records,
}

impl StoreCatalog {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            records: Records::new(store),
        }
    }

    pub fn register(&self, entry: &CatalogEntry) -> Result<()> {
        let entry = CatalogEntry {
            sku_code: entry.sku_code.trim().to_string(),
            description: entry.description.clone(),
        };
        self.records.insert(&entry)
    }
}

impl Catalog for StoreCatalog {
    fn lookup(&self, code: &str) -> Result<Option<CatalogEntry>> {
        let code = code.trim();
        if code.is_empty() {
            return Ok(None);
        }
        self.records.get::<CatalogEntry>(code)
    }

    fn entries(&self) -> Result<Vec<CatalogEntry>> {
        self.records.scan::<CatalogEntry>(None, ScanOrder::Key)
    }

    fn size(&self) -> Result<usize> {
        self.records.count::<CatalogEntry>()
    }
}

/// User directory stored in the users table of a [`RecordStore`].
#[derive(Clone)]
pub struct StoreDirectory {
    records: Records,
}

impl StoreDirectory {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            records: Records::new(store),
        }
    }

    pub fn register(&self, user: &UserRecord) -> Result<()> {
        self.records.insert(user)
    }
}

impl UserDirectory for StoreDirectory {
    fn username(&self, user_id: &str) -> Option<String> {
        match self.records.get::<UserRecord>(user_id) {
            Ok(user) => user.map(|u| u.username),
            Err(e) => {
                debug!(user_id, error = %e, "username lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::store::DisconnectedStore;

    #[test]
    fn test_lookup_trims_code() {
        let catalog = StoreCatalog::new(Arc::new(MemoryStore::new()));
        catalog
            .register(&CatalogEntry {
                sku_code: " A100 ".to_string(),
                description: Some("Glass tumbler".to_string()),
            })
            .unwrap();

        let entry = catalog.lookup("  A100").unwrap().unwrap();
        assert_eq!(entry.sku_code, "A100");
        assert_eq!(entry.description.as_deref(), Some("Glass tumbler"));
        assert!(catalog.lookup("ZZZZ").unwrap().is_none());
        assert!(catalog.lookup("   ").unwrap().is_none());
        assert_eq!(catalog.size().unwrap(), 1);
    }

    #[test]
    fn test_entries_sorted_by_code() {
        let catalog = StoreCatalog::new(Arc::new(MemoryStore::new()));
        for code in ["C3", "A1", "B2"] {
            catalog
                .register(&CatalogEntry {
                    sku_code: code.to_string(),
                    description: None,
                })
                .unwrap();
        }
        let codes: Vec<_> = catalog
            .entries()
            .unwrap()
            .into_iter()
            .map(|e| e.sku_code)
            .collect();
        assert_eq!(codes, vec!["A1", "B2", "C3"]);
    }

    #[test]
    fn test_username_resolution() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let directory = StoreDirectory::new(store);
        directory
            .register(&UserRecord {
                user_id: "u-1".to_string(),
                username: "asha".to_string(),
                role: Some("Admin".to_string()),
            })
            .unwrap();
        assert_eq!(directory.username("u-1").as_deref(), Some("asha"));
        assert_eq!(directory.username("u-2"), None);

        let offline = StoreDirectory::new(Arc::new(DisconnectedStore::new("down")));
        assert_eq!(offline.username("u-1"), None);
    }
}
