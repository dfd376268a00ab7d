//! # SKU Lens
//!
//! Matches a photographed item to a catalog SKU by comparing its image
//! embedding against a corpus of labelled reference images. Reviewers can
//! correct wrong matches; approved corrections are consulted before the
//! corpus on every later search.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! skulens --data-dir ./data --catalog catalog.json --embedder-url http://127.0.0.1:8001/embed
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use skulens::prelude::*;
//!
//! let storage = StorageManager::open("./data").unwrap();
//! let engine = storage.engine(MatchConfig::default());
//!
//! let query = Embedding::from_features(vec![0.12, 0.48, 0.31]);
//! for m in engine.search(&query) {
//!     println!("{} {:.3} ({:?})", m.sku_code, m.similarity_score, m.source);
//! }
//! ```
//!
//! ## Crate Structure
//!
//! - `skulens-core` - embeddings, records, correction lookup, catalog search, feedback lifecycle
//! - `skulens-storage` - LMDB record tables and catalog seeding
//! - `skulens-api` - REST API and the embedding service client

// Re-export core types
pub use skulens_core::{
    Catalog, CatalogEntry, CorrectionLookup, DatasetStats, Embedding, Error, FeedbackStatus,
    LinearScan, Match, MatchConfig, MatchEngine, MatchSource, MemoryStore, NewFeedback, NewImage,
    RecordStore, Result, UserDirectory,
};

// Re-export storage
pub use skulens_storage::{LmdbStore, StorageManager};

// Re-export API
pub use skulens_api::{AppState, HttpExtractor, RestApi};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        CatalogEntry, DatasetStats, Embedding, Error, FeedbackStatus, Match, MatchConfig,
        MatchEngine, MatchSource, NewFeedback, NewImage, Result, StorageManager,
    };
}
