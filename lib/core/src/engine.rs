use std::sync::Arc;
use tracing::warn;
use crate::catalog::{Catalog, UserDirectory};
use crate::correction::{CorrectionLookup, DEFAULT_CORRECTION_THRESHOLD};
use crate::embedding::Embedding;
use crate::feedback::{
    ApprovedFeedback, FeedbackImage, FeedbackLifecycle, NewFeedback, PendingFeedback, SubmittedFeedback,
};
use crate::ingest::{CorpusIngest, IngestedImage, NewImage};
use crate::matching::Match;
use crate::record::CatalogEntry;
use crate::search::{CandidateSearch, LinearScan, DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_TOP_K};
use crate::stats::{self, DatasetStats};
use crate::store::{RecordStore, Records};
use crate::{Error, Result};

pub const DEFAULT_FEATURE_MODEL: &str = "openai/clip-vit-base-patch32";

/// Configuration for a match engine
#[derive(Debug, Clone)]
pub struct MatchConfig {
    pub similarity_threshold: f32,
    pub correction_threshold: f32,
    pub top_k: usize,
    pub feature_model: String,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            correction_threshold: DEFAULT_CORRECTION_THRESHOLD,
            top_k: DEFAULT_TOP_K,
            feature_model: DEFAULT_FEATURE_MODEL.to_string(),
        }
    }
}

/// Two-tier SKU matching plus the correction feedback loop.
///
/// Read paths degrade: if storage cannot be read they log a warning and
/// return empty or zero results. Write paths return errors.
pub struct MatchEngine {
    config: MatchConfig,
    records: Records,
    catalog: Arc<dyn Catalog>,
    corrections: CorrectionLookup,
    search: Box<dyn CandidateSearch>,
    feedback: FeedbackLifecycle,
    ingest: CorpusIngest,
}

impl MatchEngine {
    pub fn new(
        config: MatchConfig,
        store: Arc<dyn RecordStore>,
        catalog: Arc<dyn Catalog>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        let records = Records::new(store);
        let corrections = CorrectionLookup::new(records.clone(), config.correction_threshold);
        let search = Box::new(LinearScan::new(
            records.clone(),
            config.similarity_threshold,
            config.feature_model.clone(),
        ));
        let feedback = FeedbackLifecycle::new(records.clone(), corrections.clone(), catalog.clone(), users);
        let ingest = CorpusIngest::new(records.clone(), catalog.clone());

        Self {
            config,
            records,
            catalog,
            corrections,
            search,
            feedback,
            ingest,
        }
    }

    /// Replace the catalog search strategy.
    #[must_use]
    pub fn with_search(mut self, search: Box<dyn CandidateSearch>) -> Self {
        self.search = search;
        self
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn is_storage_connected(&self) -> bool {
        self.records.store().is_connected()
    }

    pub fn lookup_correction(&self, query: &Embedding) -> Option<Match> {
        self.corrections.lookup(query).unwrap_or_else(|e| {
            warn!(error = %e, "correction lookup degraded to no match");
            None
        })
    }

    /// Best SKUs for `query`: a matching correction if there is one, else up
    /// to `top_k` catalog matches.
    pub fn search_catalog(&self, query: &Embedding, top_k: usize) -> Vec<Match> {
        if let Some(correction) = self.lookup_correction(query) {
            return vec![correction];
        }

        self.search.search(query, top_k).unwrap_or_else(|e| {
            warn!(error = %e, "catalog search degraded to empty result");
            Vec::new()
        })
    }

    /// [`search_catalog`](Self::search_catalog) with the configured `top_k`.
    pub fn search(&self, query: &Embedding) -> Vec<Match> {
        self.search_catalog(query, self.config.top_k)
    }

    pub fn ingest(&self, image: NewImage) -> Result<IngestedImage> {
        self.ingest.ingest(image)
    }

    pub fn submit_feedback(&self, feedback: NewFeedback) -> Result<SubmittedFeedback> {
        self.feedback.submit(feedback)
    }

    pub fn list_pending_feedback(&self) -> Vec<PendingFeedback> {
        self.feedback.pending().unwrap_or_else(|e| {
            warn!(error = %e, "pending feedback listing degraded to empty");
            Vec::new()
        })
    }

    pub fn approve_feedback(&self, feedback_id: &str, approver: &str) -> Result<ApprovedFeedback> {
        self.feedback.approve(feedback_id, approver)
    }

    pub fn feedback_image(&self, feedback_id: &str) -> Result<Option<FeedbackImage>> {
        self.feedback.image(feedback_id)
    }

    pub fn get_stats(&self) -> DatasetStats {
        stats::collect(&self.records, &self.catalog).unwrap_or_else(|e| {
            warn!(error = %e, "dataset stats degraded to zeros");
            DatasetStats::default()
        })
    }

    /// Catalog entry for `code`, or `None` if unknown or unreadable.
    pub fn validate_sku(&self, code: &str) -> Option<CatalogEntry> {
        self.catalog.lookup(code).unwrap_or_else(|e| {
            warn!(code, error = %e, "SKU validation degraded to not found");
            None
        })
    }

    /// Catalog entry for `code`. Unknown codes are `UnknownSku`; storage
    /// failures are returned rather than degraded.
    pub fn require_sku(&self, code: &str) -> Result<CatalogEntry> {
        self.catalog
            .lookup(code)?
            .ok_or_else(|| Error::UnknownSku(code.trim().to_string()))
    }

    pub fn list_catalog(&self) -> Result<Vec<CatalogEntry>> {
        self.catalog.entries()
    }
}
