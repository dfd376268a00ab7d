//! # SKU Lens Core
//!
//! Matching and feedback engine for the SKU Lens service.
//!
//! - [`Embedding`] - unit-normalized image embedding and cosine similarity
//! - [`CorrectionLookup`] - human-approved overrides, consulted first
//! - [`LinearScan`] - ranked catalog search with one match per SKU
//! - [`FeedbackLifecycle`] - submit / review / approve corrections
//! - [`MatchEngine`] - composes the above over injected collaborators
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use skulens_core::{
//!     CatalogEntry, Embedding, MatchConfig, MatchEngine, MemoryStore, NewImage, RecordStore,
//!     StoreCatalog, StoreDirectory,
//! };
//!
//! let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
//! let catalog = StoreCatalog::new(store.clone());
//! catalog.register(&CatalogEntry { sku_code: "A100".into(), description: None }).unwrap();
//!
//! let engine = MatchEngine::new(
//!     MatchConfig::default(),
//!     store.clone(),
//!     Arc::new(catalog),
//!     Arc::new(StoreDirectory::new(store)),
//! );
//!
//! engine.ingest(NewImage {
//!     uploaded_by: "u-1".into(),
//!     sku_code: "A100".into(),
//!     embedding: Embedding::from_features(vec![0.3, 0.4]),
//!     image: vec![0xff, 0xd8],
//!     width: None,
//!     height: None,
//! }).unwrap();
//!
//! let matches = engine.search(&Embedding::from_features(vec![0.3, 0.4]));
//! assert_eq!(matches[0].sku_code, "A100");
//! ```

pub mod catalog;
pub mod correction;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod feedback;
pub mod filter;
pub mod ingest;
pub mod matching;
pub mod memory;
pub mod record;
pub mod search;
pub mod stats;
pub mod store;

#[cfg(test)]
pub(crate) mod testutil;

pub use catalog::{Catalog, StoreCatalog, StoreDirectory, UserDirectory};
pub use correction::{CorrectionLookup, DEFAULT_CORRECTION_THRESHOLD};
pub use embedding::Embedding;
pub use engine::{MatchConfig, MatchEngine, DEFAULT_FEATURE_MODEL};
pub use error::{Error, Result};
pub use feedback::{
    ApprovedFeedback, FeedbackImage, FeedbackLifecycle, NewFeedback, PendingFeedback, SubmittedFeedback,
};
pub use filter::{FieldFilter, Filter, FilterCondition, Filterable};
pub use ingest::{CorpusIngest, IngestedImage, NewImage};
pub use matching::{Match, MatchMetadata, MatchSource};
pub use memory::MemoryStore;
pub use record::{
    CatalogEntry, CorpusRecord, CorrectionRecord, FeedbackRecord, FeedbackStatus, ImageMeta, UserRecord,
};
pub use search::{CandidateSearch, LinearScan, DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_TOP_K};
pub use stats::DatasetStats;
pub use store::{DisconnectedStore, Record, RecordStore, Records, ScanOrder, Table};
