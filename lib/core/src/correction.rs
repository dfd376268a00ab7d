use chrono::{DateTime, Utc};
use tracing::{debug, info};
use crate::embedding::Embedding;
use crate::matching::{Match, MatchSource};
use crate::record::{CorrectionRecord, FeedbackRecord};
use crate::store::{Records, ScanOrder};
use crate::Result;

/// Minimum similarity for a correction to override catalog search.
pub const DEFAULT_CORRECTION_THRESHOLD: f32 = 0.90;

/// First tier of a lookup: human-approved corrections, newest first.
#[derive(Clone)]
pub struct CorrectionLookup {
    records: Records,
    threshold: f32,
}

impl CorrectionLookup {
    pub fn new(records: Records, threshold: f32) -> Self {
        Self { records, threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Return the newest correction whose embedding is at least `threshold`
    /// similar to `query`. Zero vectors on either side are skipped.
    pub fn lookup(&self, query: &Embedding) -> Result<Option<Match>> {
        if query.is_zero() {
            return Ok(None);
        }

        let corrections = self
            .records
            .scan::<CorrectionRecord>(None, ScanOrder::NewestFirst)?;

        for correction in &corrections {
            let Some(similarity) = query.cosine_similarity(&correction.embedding) else {
                debug!(training_id = %correction.training_id, "skipping unusable correction embedding");
                continue;
            };

            if similarity >= self.threshold {
                return Ok(Some(Match {
                    id: correction.training_id.clone(),
                    sku_code: correction.correct_sku.clone(),
                    similarity_score: similarity,
                    source: MatchSource::Correction,
                    metadata: None,
                }));
            }
        }

        Ok(None)
    }

    /// Write the correction for an approved feedback item. The training id is
    /// derived from the feedback id, so repeating this overwrites in place.
    pub fn promote(&self, feedback: &FeedbackRecord, at: DateTime<Utc>) -> Result<CorrectionRecord> {
        let correction = CorrectionRecord::from_feedback(feedback, at);
        self.records.insert(&correction)?;
        info!(
            training_id = %correction.training_id,
            feedback_id = %correction.feedback_id,
            sku = %correction.correct_sku,
            "correction promoted"
        );
        Ok(correction)
    }

    pub fn count(&self) -> Result<usize> {
        self.records.count::<CorrectionRecord>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::record::FeedbackStatus;
    use crate::testutil::{correction_at, feedback_at, with_cosine};
    use std::sync::Arc;

    fn lookup_with(corrections: &[CorrectionRecord]) -> CorrectionLookup {
        let records = Records::new(Arc::new(MemoryStore::new()));
        for c in corrections {
            records.insert(c).unwrap();
        }
        CorrectionLookup::new(records, DEFAULT_CORRECTION_THRESHOLD)
    }

    #[test]
    fn test_empty_table_is_no_match() {
        let lookup = lookup_with(&[]);
        assert!(lookup.lookup(&Embedding::new(vec![1.0, 0.0])).unwrap().is_none());
    }

    #[test]
    fn test_threshold_is_inclusive_floor() {
        let lookup = lookup_with(&[correction_at("t1", "A100", with_cosine(0.95), 1)]);
        let hit = lookup.lookup(&Embedding::new(vec![1.0, 0.0])).unwrap().unwrap();
        assert_eq!(hit.sku_code, "A100");
        assert_eq!(hit.source, MatchSource::Correction);
        assert!((hit.similarity_score - 0.95).abs() < 1e-5);

        let lookup = lookup_with(&[correction_at("t1", "A100", with_cosine(0.85), 1)]);
        assert!(lookup.lookup(&Embedding::new(vec![1.0, 0.0])).unwrap().is_none());
    }

    #[test]
    fn test_newest_correction_shadows_older() {
        let lookup = lookup_with(&[
            correction_at("old", "A100", vec![1.0, 0.0], 10),
            correction_at("new", "B200", with_cosine(0.93), 20),
        ]);
        // The older correction is a closer match, but the newer one wins.
        let hit = lookup.lookup(&Embedding::new(vec![1.0, 0.0])).unwrap().unwrap();
        assert_eq!(hit.sku_code, "B200");
        assert_eq!(hit.id, "new");
    }

    #[test]
    fn test_zero_vectors_never_match() {
        let lookup = lookup_with(&[correction_at("z", "A100", vec![0.0, 0.0], 1)]);
        assert!(lookup.lookup(&Embedding::new(vec![1.0, 0.0])).unwrap().is_none());

        let lookup = lookup_with(&[correction_at("t", "A100", vec![1.0, 0.0], 1)]);
        assert!(lookup.lookup(&Embedding::new(vec![0.0, 0.0])).unwrap().is_none());
    }

    #[test]
    fn test_promote_is_idempotent_per_feedback() {
        let lookup = lookup_with(&[]);
        let feedback = feedback_at("fb-1", 5, FeedbackStatus::Pending);
        let first = lookup.promote(&feedback, Utc::now()).unwrap();
        let second = lookup.promote(&feedback, Utc::now()).unwrap();
        assert_eq!(first.training_id, second.training_id);
        assert_eq!(lookup.count().unwrap(), 1);
    }
}
