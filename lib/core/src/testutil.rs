// Shared fixtures for unit tests
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use crate::catalog::{Catalog, StoreCatalog};
use crate::embedding::Embedding;
use crate::feedback::NewFeedback;
use crate::memory::MemoryStore;
use crate::record::{
    CatalogEntry, CorpusRecord, CorrectionRecord, FeedbackRecord, FeedbackStatus, ImageMeta,
};

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

/// 2-d unit vector whose cosine with `[1, 0]` is `c`.
pub fn with_cosine(c: f32) -> Vec<f32> {
    vec![c, (1.0 - c * c).sqrt()]
}

pub fn corpus_at(id: &str, sku: &str, embedding: Vec<f32>, secs: i64) -> CorpusRecord {
    CorpusRecord {
        id: id.to_string(),
        sku_code: sku.to_string(),
        embedding: Embedding::new(embedding),
        image: vec![0xff, 0xd8],
        uploaded_by: "tester".to_string(),
        meta: ImageMeta::for_upload(sku, 2, at(secs)).with_dimensions(Some(640), Some(480)),
        created_at: at(secs),
    }
}

pub fn correction_at(id: &str, sku: &str, embedding: Vec<f32>, secs: i64) -> CorrectionRecord {
    CorrectionRecord {
        training_id: id.to_string(),
        embedding: Embedding::new(embedding),
        correct_sku: sku.to_string(),
        feedback_id: format!("fb-{}", id),
        created_at: at(secs),
    }
}

pub fn feedback_at(id: &str, secs: i64, status: FeedbackStatus) -> FeedbackRecord {
    FeedbackRecord {
        feedback_id: id.to_string(),
        submitted_by: "u-1".to_string(),
        predicted_sku: "B200".to_string(),
        correct_sku: "A100".to_string(),
        embedding: Embedding::new(vec![0.6, 0.8]),
        image: vec![0xff, 0xd8, 0xff],
        meta: ImageMeta::for_feedback("B200", 3, at(secs)),
        submitted_at: at(secs),
        status,
        approved_by: None,
        approved_at: None,
    }
}

pub fn new_feedback(user: &str, predicted: &str, correct: &str) -> NewFeedback {
    NewFeedback {
        submitted_by: user.to_string(),
        predicted_sku: predicted.to_string(),
        correct_sku: correct.to_string(),
        embedding: Embedding::new(vec![0.6, 0.8]),
        image: vec![0xff, 0xd8, 0xff],
        width: None,
        height: None,
    }
}

/// Register `codes` in the master table of `store` and return it as a catalog.
pub fn seeded_catalog(store: Arc<MemoryStore>, codes: &[&str]) -> Arc<dyn Catalog> {
    let catalog = StoreCatalog::new(store);
    for code in codes {
        catalog
            .register(&CatalogEntry {
                sku_code: code.to_string(),
                description: Some(format!("{} description", code)),
            })
            .unwrap();
    }
    Arc::new(catalog)
}
