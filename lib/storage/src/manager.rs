use anyhow::{Context, Result};
use skulens_core::{
    CatalogEntry, DisconnectedStore, MatchConfig, MatchEngine, RecordStore, StoreCatalog,
    StoreDirectory, UserRecord,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};
use crate::lmdb_storage::{LmdbStore, DEFAULT_MAP_SIZE};

/// Owns the record store and the catalog and user directory built on it
pub struct StorageManager {
    store: Arc<dyn RecordStore>,
    catalog: Arc<StoreCatalog>,
    users: Arc<StoreDirectory>,
}

impl StorageManager {
    /// Open (or create) the LMDB environment under `data_dir/lmdb`.
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        Self::open_with_map_size(data_dir, DEFAULT_MAP_SIZE)
    }

    /// Like [`open`](Self::open) with an explicit LMDB map size in bytes.
    pub fn open_with_map_size<P: AsRef<Path>>(data_dir: P, map_size: usize) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("creating data directory {}", data_dir.display()))?;

        let lmdb_path = data_dir.join("lmdb");
        let store = LmdbStore::with_map_size(&lmdb_path, map_size)
            .with_context(|| format!("opening LMDB at {}", lmdb_path.display()))?;
        info!(path = %lmdb_path.display(), map_size, "storage opened");

        Ok(Self::with_store(Arc::new(store)))
    }

    /// A manager whose every storage call fails with `StorageUnavailable`.
    pub fn disconnected(reason: impl Into<String>) -> Self {
        Self::with_store(Arc::new(DisconnectedStore::new(reason)))
    }

    /// Open storage, falling back to a disconnected store so the service can
    /// still start and answer reads with empty results.
    pub fn open_or_disconnected<P: AsRef<Path>>(data_dir: P, map_size: usize) -> Self {
        match Self::open_with_map_size(data_dir, map_size) {
            Ok(manager) => manager,
            Err(e) => {
                error!(error = %format!("{:#}", e), "storage unavailable, continuing disconnected");
                Self::disconnected(e.to_string())
            }
        }
    }

    pub fn with_store(store: Arc<dyn RecordStore>) -> Self {
        Self {
            catalog: Arc::new(StoreCatalog::new(store.clone())),
            users: Arc::new(StoreDirectory::new(store.clone())),
            store,
        }
    }

    pub fn store(&self) -> Arc<dyn RecordStore> {
        self.store.clone()
    }

    pub fn catalog(&self) -> Arc<StoreCatalog> {
        self.catalog.clone()
    }

    pub fn users(&self) -> Arc<StoreDirectory> {
        self.users.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.store.is_connected()
    }

    /// Seed the master catalog from a JSON array of `{sku_code, description}`.
    /// Returns the number of entries written.
    pub fn load_catalog<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let entries: Vec<CatalogEntry> = read_json(path.as_ref())?;
        for entry in &entries {
            self.catalog.register(entry)?;
        }
        info!(count = entries.len(), path = %path.as_ref().display(), "catalog seeded");
        Ok(entries.len())
    }

    /// Seed the user directory from a JSON array of `{user_id, username, role}`.
    pub fn load_users<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let users: Vec<UserRecord> = read_json(path.as_ref())?;
        for user in &users {
            self.users.register(user)?;
        }
        info!(count = users.len(), path = %path.as_ref().display(), "users seeded");
        Ok(users.len())
    }

    /// Build a match engine over this manager's collaborators.
    pub fn engine(&self, config: MatchConfig) -> MatchEngine {
        MatchEngine::new(config, self.store(), self.catalog.clone(), self.users.clone())
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use skulens_core::{Embedding, Error, NewImage, UserDirectory};

    #[test]
    fn test_seed_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let seed = dir.path().join("catalog.json");
        std::fs::write(
            &seed,
            r#"[{"sku_code": "A100", "description": "Glass tumbler"}, {"sku_code": " B200 "}]"#,
        )
        .unwrap();

        {
            let manager = StorageManager::open(dir.path()).unwrap();
            assert!(manager.is_connected());
            assert_eq!(manager.load_catalog(&seed).unwrap(), 2);

            let engine = manager.engine(MatchConfig::default());
            engine
                .ingest(NewImage {
                    uploaded_by: "u-1".to_string(),
                    sku_code: "A100".to_string(),
                    embedding: Embedding::from_features(vec![1.0, 0.0]),
                    image: vec![0xff, 0xd8],
                    width: None,
                    height: None,
                })
                .unwrap();
        }

        let manager = StorageManager::open(dir.path()).unwrap();
        let engine = manager.engine(MatchConfig::default());
        assert!(engine.validate_sku("B200").is_some());
        let stats = engine.get_stats();
        assert_eq!(stats.total_records, 1);
        assert_eq!(stats.catalog_size, 2);
        assert_eq!(engine.search(&Embedding::new(vec![1.0, 0.0]))[0].sku_code, "A100");
    }

    #[test]
    fn test_users_seed() {
        let dir = tempfile::tempdir().unwrap();
        let seed = dir.path().join("users.json");
        std::fs::write(&seed, r#"[{"user_id": "u-1", "username": "asha", "role": "Admin"}]"#).unwrap();

        let manager = StorageManager::open(dir.path()).unwrap();
        assert_eq!(manager.load_users(&seed).unwrap(), 1);
        assert_eq!(manager.users().username("u-1").as_deref(), Some("asha"));
    }

    #[test]
    fn test_bad_seed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let manager = StorageManager::open(dir.path()).unwrap();
        assert!(manager.load_catalog(dir.path().join("missing.json")).is_err());

        let seed = dir.path().join("bad.json");
        std::fs::write(&seed, "{not json").unwrap();
        assert!(manager.load_catalog(&seed).is_err());
    }

    #[test]
    fn test_disconnected_manager() {
        let manager = StorageManager::disconnected("refused");
        assert!(!manager.is_connected());
        assert_eq!(manager.engine(MatchConfig::default()).get_stats().total_records, 0);
    }

    #[test]
    fn test_map_size_bounds_corpus_growth() {
        const SMALL_MAP: usize = 1024 * 1024;
        let dir = tempfile::tempdir().unwrap();
        let upload = |manager: &StorageManager| {
            let catalog = manager.catalog();
            catalog
                .register(&CatalogEntry {
                    sku_code: "A100".to_string(),
                    description: None,
                })
                .unwrap();
            manager.engine(MatchConfig::default()).ingest(NewImage {
                uploaded_by: "u-1".to_string(),
                sku_code: "A100".to_string(),
                embedding: Embedding::from_features(vec![1.0, 0.0]),
                image: vec![0xab; 2 * SMALL_MAP],
                width: None,
                height: None,
            })
        };

        {
            let manager = StorageManager::open_with_map_size(dir.path(), SMALL_MAP).unwrap();
            assert!(matches!(upload(&manager).unwrap_err(), Error::Storage(_)));
        }

        let manager = StorageManager::open_with_map_size(dir.path(), 64 * SMALL_MAP).unwrap();
        upload(&manager).unwrap();
        assert_eq!(manager.engine(MatchConfig::default()).get_stats().total_records, 1);
    }
}
