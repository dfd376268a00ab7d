//! REST surface for SKU Lens.

pub mod error;
pub mod extractor;
pub mod response;
pub mod rest;

pub use error::ApiError;
pub use extractor::{EmbeddingExtractor, Extracted, HttpExtractor};
pub use response::ApiResponse;
pub use rest::{AppState, RestApi, UploadLimits, DEFAULT_MAX_UPLOAD_BYTES};
