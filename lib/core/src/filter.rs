// Record filters applied during table scans
use crate::embedding::Embedding;
use crate::record::{CorpusRecord, FeedbackRecord, FeedbackStatus};

pub trait Filter<R> {
    fn matches(&self, record: &R) -> bool;
}

/// Fields a [`FieldFilter`] can look at.
pub trait Filterable {
    fn status(&self) -> Option<FeedbackStatus> {
        None
    }

    fn embedding(&self) -> Option<&Embedding> {
        None
    }
}

#[derive(Debug, Clone)]
pub enum FilterCondition {
    Status(FeedbackStatus),
    /// Record carries a non-zero embedding.
    HasEmbedding,
}

pub struct FieldFilter {
    condition: FilterCondition,
}

impl FieldFilter {
    pub fn status(status: FeedbackStatus) -> Self {
        Self {
            condition: FilterCondition::Status(status),
        }
    }

    pub fn has_embedding() -> Self {
        Self {
            condition: FilterCondition::HasEmbedding,
        }
    }
}

impl<R: Filterable> Filter<R> for FieldFilter {
    fn matches(&self, record: &R) -> bool {
        match &self.condition {
            FilterCondition::Status(status) => record.status() == Some(*status),
            FilterCondition::HasEmbedding => record
                .embedding()
                .map(|e| !e.is_zero())
                .unwrap_or(false),
        }
    }
}

impl Filterable for CorpusRecord {
    fn embedding(&self) -> Option<&Embedding> {
        Some(&self.embedding)
    }
}

impl Filterable for FeedbackRecord {
    fn status(&self) -> Option<FeedbackStatus> {
        Some(self.status)
    }

    fn embedding(&self) -> Option<&Embedding> {
        Some(&self.embedding)
    }
}
