use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use crate::catalog::Catalog;
use crate::embedding::Embedding;
use crate::record::{CorpusRecord, ImageMeta};
use crate::store::Records;
use crate::{Error, Result};

/// A labelled reference image to add to the corpus.
#[derive(Debug, Clone)]
pub struct NewImage {
    pub uploaded_by: String,
    pub sku_code: String,
    pub embedding: Embedding,
    pub image: Vec<u8>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestedImage {
    pub id: String,
    pub sku_code: String,
    pub description: Option<String>,
    pub feature_dimensions: usize,
    pub image_size: usize,
}

/// Append-only writer for the reference corpus.
#[derive(Clone)]
pub struct CorpusIngest {
    records: Records,
    catalog: Arc<dyn Catalog>,
}

impl CorpusIngest {
    pub fn new(records: Records, catalog: Arc<dyn Catalog>) -> Self {
        Self { records, catalog }
    }

    pub fn ingest(&self, image: NewImage) -> Result<IngestedImage> {
        if image.image.is_empty() {
            return Err(Error::Validation("no image data provided".to_string()));
        }
        let sku_code = image.sku_code.trim();
        if sku_code.is_empty() {
            return Err(Error::Validation("SKU code is required".to_string()));
        }
        let uploaded_by = image.uploaded_by.trim();
        if uploaded_by.is_empty() {
            return Err(Error::Validation("username is required".to_string()));
        }

        let entry = self
            .catalog
            .lookup(sku_code)?
            .ok_or_else(|| Error::UnknownSku(sku_code.to_string()))?;

        if image.embedding.is_zero() {
            return Err(Error::Extraction("image produced an empty embedding".to_string()));
        }

        let now = Utc::now();
        let image_size = image.image.len();
        let record = CorpusRecord {
            id: Uuid::new_v4().to_string(),
            sku_code: entry.sku_code.clone(),
            meta: ImageMeta::for_upload(&entry.sku_code, image_size as u64, now)
                .with_dimensions(image.width, image.height),
            embedding: image.embedding,
            image: image.image,
            uploaded_by: uploaded_by.to_string(),
            created_at: now,
        };

        self.records.insert(&record)?;
        info!(id = %record.id, sku = %record.sku_code, bytes = image_size, "reference image stored");

        Ok(IngestedImage {
            feature_dimensions: record.embedding.dim(),
            id: record.id,
            sku_code: record.sku_code,
            description: entry.description,
            image_size,
        })
    }
}
