pub mod lmdb_storage;
pub mod manager;

pub use lmdb_storage::{LmdbStore, DEFAULT_MAP_SIZE};
pub use manager::StorageManager;
