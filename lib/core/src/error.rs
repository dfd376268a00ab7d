use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("SKU code '{0}' not found in master catalog")]
    UnknownSku(String),

    #[error("Embedding extraction failed: {0}")]
    Extraction(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Storage write failed: {0}")]
    StorageWrite(String),

    #[error("Feedback not found or already processed: {0}")]
    FeedbackNotFound(String),

    /// The correction record was written but the feedback could not be marked
    /// approved. Needs manual reconciliation; re-running approval overwrites the
    /// same correction record.
    #[error("Feedback {feedback_id} promoted to correction {training_id} but not marked approved: {reason}")]
    PartialPromotion {
        feedback_id: String,
        training_id: String,
        reason: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Bad caller input (including unknown catalog codes).
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::UnknownSku(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::FeedbackNotFound(_))
    }
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
