use serde::Serialize;

/// Which tier produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    /// Human-approved correction table.
    Correction,
    /// Reference image corpus.
    Database,
}

/// Descriptive fields echoed from the matched corpus record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchMetadata {
    pub image_name: String,
    pub file_size: u64,
    pub dimensions: Option<String>,
    pub uploaded_by: String,
    pub feature_model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    /// Corpus record id, or training id for corrections.
    pub id: String,
    pub sku_code: String,
    pub similarity_score: f32,
    pub source: MatchSource,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MatchMetadata>,
}
