use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::embedding::Embedding;
use crate::store::{Record, Table};

/// Namespace for correction ids derived from feedback ids.
const CORRECTION_NAMESPACE: Uuid = Uuid::from_bytes([
    0x6b, 0x2d, 0x1f, 0x3a, 0x94, 0x0c, 0x4e, 0x7b,
    0xa1, 0x55, 0x2e, 0x90, 0xc3, 0x18, 0x7d, 0x42,
]);

/// Size metadata kept alongside stored images.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImageMeta {
    pub image_name: String,
    pub file_size: u64,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ImageMeta {
    /// `<sku>_<YYYYMMDD_HHMMSS>.jpg`
    pub fn for_upload(sku_code: &str, file_size: u64, at: DateTime<Utc>) -> Self {
        Self {
            image_name: format!("{}_{}.jpg", sku_code, at.format("%Y%m%d_%H%M%S")),
            file_size,
            width: None,
            height: None,
        }
    }

    /// `feedback_<predicted>_<YYYYMMDD_HHMMSS>.jpg`
    pub fn for_feedback(predicted_sku: &str, file_size: u64, at: DateTime<Utc>) -> Self {
        Self {
            image_name: format!("feedback_{}_{}.jpg", predicted_sku, at.format("%Y%m%d_%H%M%S")),
            file_size,
            width: None,
            height: None,
        }
    }

    #[must_use]
    pub fn with_dimensions(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// `WxH` when both sides are known.
    pub fn dimensions(&self) -> Option<String> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Some(format!("{}x{}", w, h)),
            _ => None,
        }
    }
}

/// A reference image in the append-only corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusRecord {
    pub id: String,
    pub sku_code: String,
    pub embedding: Embedding,
    pub image: Vec<u8>,
    pub uploaded_by: String,
    pub meta: ImageMeta,
    pub created_at: DateTime<Utc>,
}

/// A human-verified embedding to SKU override, promoted from approved feedback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionRecord {
    pub training_id: String,
    pub embedding: Embedding,
    pub correct_sku: String,
    pub feedback_id: String,
    pub created_at: DateTime<Utc>,
}

impl CorrectionRecord {
    /// Correction ids are derived from the feedback id, so promoting the same
    /// feedback twice targets the same key.
    pub fn training_id_for(feedback_id: &str) -> String {
        Uuid::new_v5(&CORRECTION_NAMESPACE, feedback_id.as_bytes()).to_string()
    }

    pub fn from_feedback(feedback: &FeedbackRecord, created_at: DateTime<Utc>) -> Self {
        Self {
            training_id: Self::training_id_for(&feedback.feedback_id),
            embedding: feedback.embedding.clone(),
            correct_sku: feedback.correct_sku.clone(),
            feedback_id: feedback.feedback_id.clone(),
            created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedbackStatus {
    Pending,
    Approved,
}

impl FeedbackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackStatus::Pending => "PENDING",
            FeedbackStatus::Approved => "APPROVED",
        }
    }
}

impl std::fmt::Display for FeedbackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reviewer-facing report that a prediction was wrong.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub feedback_id: String,
    pub submitted_by: String,
    pub predicted_sku: String,
    pub correct_sku: String,
    pub embedding: Embedding,
    pub image: Vec<u8>,
    pub meta: ImageMeta,
    pub submitted_at: DateTime<Utc>,
    pub status: FeedbackStatus,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
}

impl FeedbackRecord {
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.status == FeedbackStatus::Pending
    }

    /// Approved copy of this record. Approval is terminal.
    #[must_use]
    pub fn approved(&self, approver: &str, at: DateTime<Utc>) -> Self {
        Self {
            status: FeedbackStatus::Approved,
            approved_by: Some(approver.to_string()),
            approved_at: Some(at),
            ..self.clone()
        }
    }
}

/// Master catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub sku_code: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub role: Option<String>,
}

impl Record for CorpusRecord {
    const TABLE: Table = Table::Corpus;

    fn key(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        Some(self.created_at)
    }
}

impl Record for CorrectionRecord {
    const TABLE: Table = Table::Corrections;

    fn key(&self) -> &str {
        &self.training_id
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        Some(self.created_at)
    }
}

impl Record for FeedbackRecord {
    const TABLE: Table = Table::Feedback;

    fn key(&self) -> &str {
        &self.feedback_id
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        Some(self.submitted_at)
    }
}

impl Record for CatalogEntry {
    const TABLE: Table = Table::Catalog;

    fn key(&self) -> &str {
        &self.sku_code
    }
}

impl Record for UserRecord {
    const TABLE: Table = Table::Users;

    fn key(&self) -> &str {
        &self.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_image_names() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(ImageMeta::for_upload("A100", 10, at).image_name, "A100_20240309_140507.jpg");
        assert_eq!(
            ImageMeta::for_feedback("B200", 10, at).image_name,
            "feedback_B200_20240309_140507.jpg"
        );
    }

    #[test]
    fn test_dimensions() {
        let meta = ImageMeta::default().with_dimensions(Some(640), Some(480));
        assert_eq!(meta.dimensions().as_deref(), Some("640x480"));
        assert_eq!(ImageMeta::default().dimensions(), None);
    }

    #[test]
    fn test_training_id_is_stable_per_feedback() {
        assert_eq!(
            CorrectionRecord::training_id_for("fb-1"),
            CorrectionRecord::training_id_for("fb-1")
        );
        assert_ne!(
            CorrectionRecord::training_id_for("fb-1"),
            CorrectionRecord::training_id_for("fb-2")
        );
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&FeedbackStatus::Pending).unwrap(), "\"PENDING\"");
        assert_eq!(FeedbackStatus::Approved.to_string(), "APPROVED");
    }
}
