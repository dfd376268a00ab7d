use ahash::AHashMap;
use rayon::prelude::*;
use tracing::debug;
use crate::embedding::Embedding;
use crate::filter::FieldFilter;
use crate::matching::{Match, MatchMetadata, MatchSource};
use crate::record::CorpusRecord;
use crate::store::{Records, ScanOrder};
use crate::Result;

/// Acceptance floor for catalog matches.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.75;

/// Default number of SKUs returned by a search.
pub const DEFAULT_TOP_K: usize = 3;

/// Second tier of a lookup: ranked candidates from the reference corpus.
///
/// At most one match per SKU, sorted by similarity descending, never more
/// than `top_k` entries.
pub trait CandidateSearch: Send + Sync {
    fn search(&self, query: &Embedding, top_k: usize) -> Result<Vec<Match>>;
}

/// Exact search: scores every corpus record against the query.
pub struct LinearScan {
    records: Records,
    threshold: f32,
    feature_model: String,
}

impl LinearScan {
    pub fn new(records: Records, threshold: f32, feature_model: impl Into<String>) -> Self {
        Self {
            records,
            threshold,
            feature_model: feature_model.into(),
        }
    }

    fn to_match(&self, record: &CorpusRecord, similarity: f32) -> Match {
        Match {
            id: record.id.clone(),
            sku_code: record.sku_code.clone(),
            similarity_score: similarity,
            source: MatchSource::Database,
            metadata: Some(MatchMetadata {
                image_name: record.meta.image_name.clone(),
                file_size: record.meta.file_size,
                dimensions: record.meta.dimensions(),
                uploaded_by: record.uploaded_by.clone(),
                feature_model: self.feature_model.clone(),
            }),
        }
    }
}

impl CandidateSearch for LinearScan {
    fn search(&self, query: &Embedding, top_k: usize) -> Result<Vec<Match>> {
        if top_k == 0 || query.is_zero() {
            return Ok(Vec::new());
        }

        let filter = FieldFilter::has_embedding();
        let corpus = self
            .records
            .scan::<CorpusRecord>(Some(&filter), ScanOrder::NewestFirst)?;

        let scores: Vec<Option<f32>> = corpus
            .par_iter()
            .map(|record| query.cosine_similarity(&record.embedding))
            .collect();

        // Best (corpus index, score) per SKU, in first-seen order.
        let mut slots: AHashMap<&str, usize> = AHashMap::new();
        let mut best: Vec<(usize, f32)> = Vec::new();

        for (idx, (record, score)) in corpus.iter().zip(scores).enumerate() {
            let Some(score) = score else {
                debug!(id = %record.id, "skipping record with incompatible embedding");
                continue;
            };
            if score < self.threshold {
                continue;
            }

            match slots.get(record.sku_code.as_str()) {
                Some(&slot) => {
                    if score > best[slot].1 {
                        best[slot] = (idx, score);
                    }
                }
                None => {
                    slots.insert(record.sku_code.as_str(), best.len());
                    best.push((idx, score));
                }
            }
        }

        best.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        best.truncate(top_k);

        Ok(best
            .into_iter()
            .map(|(idx, score)| self.to_match(&corpus[idx], score))
            .collect())
    }
}
