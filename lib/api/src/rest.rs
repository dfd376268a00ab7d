use actix_cors::Cors;
use actix_multipart::Multipart;
use actix_web::{web, App, HttpResponse, HttpServer};
use chrono::Utc;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use skulens_core::{
    CatalogEntry, Embedding, Match, MatchEngine, NewFeedback, NewImage, PendingFeedback,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use crate::error::ApiError;
use crate::extractor::{EmbeddingExtractor, Extracted};
use crate::response::ok;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Upload constraints applied before an image reaches the engine.
#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_upload_bytes: usize,
    /// Smallest accepted width and height, when the extractor reports them.
    pub min_dimension: u32,
    pub max_dimension: u32,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            min_dimension: 100,
            max_dimension: 4000,
        }
    }
}

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<MatchEngine>,
    pub extractor: Arc<dyn EmbeddingExtractor>,
    pub limits: UploadLimits,
}

impl AppState {
    pub fn new(engine: Arc<MatchEngine>, extractor: Arc<dyn EmbeddingExtractor>) -> Self {
        Self {
            engine,
            extractor,
            limits: UploadLimits::default(),
        }
    }

    #[must_use]
    pub fn with_limits(mut self, limits: UploadLimits) -> Self {
        self.limits = limits;
        self
    }

    async fn extract(&self, image: &[u8]) -> Result<Extracted, ApiError> {
        let extracted = self.extractor.extract(image).await?;
        if let (Some(w), Some(h)) = (extracted.width, extracted.height) {
            let UploadLimits { min_dimension: min, max_dimension: max, .. } = self.limits;
            if w < min || h < min {
                return Err(ApiError::BadRequest(format!(
                    "Image validation failed: image too small ({}x{}), min {}x{}",
                    w, h, min, min
                )));
            }
            if w > max || h > max {
                return Err(ApiError::BadRequest(format!(
                    "Image validation failed: image too large ({}x{}), max {}x{}",
                    w, h, max, max
                )));
            }
        }
        Ok(extracted)
    }
}

#[derive(Deserialize)]
struct ApprovalRequest {
    #[serde(default)]
    feedback_id: String,
    #[serde(default)]
    admin_name: String,
}

#[derive(Deserialize)]
struct ValidateSkuRequest {
    #[serde(default)]
    sku_code: String,
}

#[derive(Serialize)]
struct SearchData {
    matches: Vec<Match>,
    total_matches: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'static str>,
}

#[derive(Serialize)]
struct PendingData {
    feedback_list: Vec<PendingFeedback>,
    total_pending: usize,
}

#[derive(Serialize)]
struct SkuListData {
    skus: Vec<CatalogEntry>,
    total_count: usize,
}

#[derive(Serialize)]
struct ValidationData {
    valid: bool,
    sku_code: String,
    description: Option<String>,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(state: AppState, port: u16) -> std::io::Result<()> {
        info!(port, "REST API listening");
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(state.clone()))
                .configure(routes)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }
}

/// Register every endpoint. Shared by the server and tests.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .route("/", web::get().to(root))
    .route("/health", web::get().to(health))
    .route("/upload-image", web::post().to(upload_image))
    .route("/search-similar", web::post().to(search_similar))
    .route("/submit-feedback", web::post().to(submit_feedback))
    .route("/pending-feedback", web::get().to(pending_feedback))
    .route("/feedback/{id}/image", web::get().to(feedback_image))
    .route("/approve-feedback", web::post().to(approve_feedback))
    .route("/validate-sku", web::post().to(validate_sku))
    .route("/sku-list", web::get().to(sku_list))
    .route("/dataset-stats", web::get().to(dataset_stats));
}

/// Run a synchronous engine call on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    web::block(f)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// Reject unknown SKU codes before spending an extraction call on the image.
async fn require_sku(state: &AppState, code: &str) -> Result<(), ApiError> {
    let engine = state.engine.clone();
    let code = code.to_string();
    blocking(move || engine.require_sku(&code)).await??;
    Ok(())
}

#[derive(Default)]
struct UploadForm {
    fields: HashMap<String, String>,
    file: Option<Vec<u8>>,
}

impl UploadForm {
    async fn read(mut payload: Multipart, max_bytes: usize) -> Result<Self, ApiError> {
        let mut form = UploadForm::default();
        let mut total = 0usize;
        while let Some(item) = payload.next().await {
            let mut field =
                item.map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?;
            let name = field.name().unwrap_or_default().to_string();

            let mut data = Vec::new();
            while let Some(chunk) = field.next().await {
                let chunk =
                    chunk.map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?;
                total += chunk.len();
                if total > max_bytes {
                    return Err(ApiError::PayloadTooLarge { max: max_bytes });
                }
                data.extend_from_slice(&chunk);
            }

            if name == "file" {
                form.file = Some(data);
            } else {
                form.fields
                    .insert(name, String::from_utf8_lossy(&data).into_owned());
            }
        }
        Ok(form)
    }

    fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(|v| v.trim()).unwrap_or("")
    }

    fn required(&self, name: &str, message: &str) -> Result<String, ApiError> {
        match self.field(name) {
            "" => Err(ApiError::BadRequest(message.to_string())),
            value => Ok(value.to_string()),
        }
    }

    fn take_image(&mut self) -> Result<Vec<u8>, ApiError> {
        match self.file.take() {
            Some(bytes) if !bytes.is_empty() => Ok(bytes),
            _ => Err(ApiError::BadRequest("No image data provided".to_string())),
        }
    }
}

async fn root() -> HttpResponse {
    ok(
        "SKU Lens API",
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Image-based SKU matching with a human correction feedback loop",
            "endpoints": {
                "upload": "/upload-image",
                "search": "/search-similar",
                "feedback": "/submit-feedback",
                "feedback_image": "/feedback/{id}/image",
                "validate_sku": "/validate-sku",
                "sku_list": "/sku-list",
                "pending_feedback": "/pending-feedback",
                "approve_feedback": "/approve-feedback",
                "stats": "/dataset-stats",
                "health": "/health"
            }
        }),
    )
}

async fn health(state: web::Data<AppState>) -> HttpResponse {
    let storage = if state.engine.is_storage_connected() {
        "connected"
    } else {
        "disconnected"
    };
    ok(
        "API is running",
        json!({
            "status": "healthy",
            "timestamp": Utc::now().to_rfc3339(),
            "storage": storage,
            "feature_model": state.engine.config().feature_model,
        }),
    )
}

async fn upload_image(
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let mut form = UploadForm::read(payload, state.limits.max_upload_bytes).await?;
    let image = form.take_image()?;
    let sku_code = form.required("sku_code", "SKU code is required")?;
    let username = form.required("username", "Username is required")?;
    require_sku(&state, &sku_code).await?;

    let Extracted { embedding, width, height } = state.extract(&image).await?;

    let engine = state.engine.clone();
    let stored = blocking(move || {
        engine.ingest(NewImage {
            uploaded_by: username,
            sku_code,
            embedding,
            image,
            width,
            height,
        })
    })
    .await??;

    Ok(ok(
        format!("Image uploaded successfully for SKU: {}", stored.sku_code),
        stored,
    ))
}

async fn search_similar(
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let mut form = UploadForm::read(payload, state.limits.max_upload_bytes).await?;
    let image = form.take_image()?;
    let query: Embedding = state.extract(&image).await?.embedding;

    let engine = state.engine.clone();
    let matches = blocking(move || engine.search(&query)).await?;

    if matches.is_empty() {
        return Ok(ok(
            "No similar images found in database",
            SearchData {
                matches,
                total_matches: 0,
                note: Some("Try adjusting the similarity threshold or upload more reference images"),
            },
        ));
    }

    let total_matches = matches.len();
    Ok(ok(
        format!("Found {} similar images", total_matches),
        SearchData {
            matches,
            total_matches,
            note: None,
        },
    ))
}

async fn submit_feedback(
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    const ALL_REQUIRED: &str = "All fields are required for feedback submission";

    let mut form = UploadForm::read(payload, state.limits.max_upload_bytes).await?;
    let image = form
        .take_image()
        .map_err(|_| ApiError::BadRequest(ALL_REQUIRED.to_string()))?;
    let username = form.required("username", ALL_REQUIRED)?;
    let predicted_sku = form.required("predicted_sku", ALL_REQUIRED)?;
    let correct_sku = form.required("correct_sku", ALL_REQUIRED)?;
    require_sku(&state, &correct_sku).await?;

    let Extracted { embedding, width, height } = state.extract(&image).await?;

    let engine = state.engine.clone();
    let submitted = blocking(move || {
        engine.submit_feedback(NewFeedback {
            submitted_by: username,
            predicted_sku,
            correct_sku,
            embedding,
            image,
            width,
            height,
        })
    })
    .await??;

    Ok(ok("Feedback submitted successfully", submitted))
}

async fn pending_feedback(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let engine = state.engine.clone();
    let feedback_list = blocking(move || engine.list_pending_feedback()).await?;
    let total_pending = feedback_list.len();

    Ok(ok(
        format!("Retrieved {} pending feedback items", total_pending),
        PendingData {
            feedback_list,
            total_pending,
        },
    ))
}

async fn feedback_image(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let feedback_id = path.into_inner();
    let engine = state.engine.clone();
    let lookup_id = feedback_id.clone();
    let image = blocking(move || engine.feedback_image(&lookup_id)).await??;

    match image {
        Some(image) => Ok(HttpResponse::Ok()
            .content_type(content_type_for(&image.bytes))
            .insert_header((
                "Content-Disposition",
                format!("inline; filename=\"{}\"", image.image_name),
            ))
            .body(image.bytes)),
        None => Err(ApiError::NotFound(format!("Feedback not found: {}", feedback_id))),
    }
}

async fn approve_feedback(
    state: web::Data<AppState>,
    req: web::Json<ApprovalRequest>,
) -> Result<HttpResponse, ApiError> {
    let ApprovalRequest {
        feedback_id,
        admin_name,
    } = req.into_inner();
    if feedback_id.trim().is_empty() || admin_name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Feedback ID and admin name are required".to_string(),
        ));
    }

    let engine = state.engine.clone();
    let approved = blocking(move || engine.approve_feedback(&feedback_id, &admin_name)).await??;

    Ok(ok(
        "Feedback approved successfully and added to training data",
        approved,
    ))
}

async fn validate_sku(
    state: web::Data<AppState>,
    req: web::Json<ValidateSkuRequest>,
) -> Result<HttpResponse, ApiError> {
    let sku_code = req.into_inner().sku_code.trim().to_string();
    if sku_code.is_empty() {
        return Err(ApiError::BadRequest("SKU code is required".to_string()));
    }

    let engine = state.engine.clone();
    let code = sku_code.clone();
    let entry = blocking(move || engine.validate_sku(&code)).await?;

    let (message, data) = match entry {
        Some(entry) => (
            "SKU code is valid".to_string(),
            ValidationData {
                valid: true,
                sku_code: entry.sku_code,
                description: entry.description,
            },
        ),
        None => (
            format!("SKU code '{}' not found in master database", sku_code),
            ValidationData {
                valid: false,
                sku_code,
                description: None,
            },
        ),
    };
    Ok(ok(message, data))
}

async fn sku_list(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let engine = state.engine.clone();
    let skus = blocking(move || engine.list_catalog()).await??;
    let total_count = skus.len();

    Ok(ok(
        format!("Retrieved {} SKUs successfully", total_count),
        SkuListData { skus, total_count },
    ))
}

async fn dataset_stats(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let engine = state.engine.clone();
    let stats = blocking(move || engine.get_stats()).await?;
    Ok(ok("Dataset statistics retrieved successfully", stats))
}

/// Guess a content type from the leading magic bytes.
fn content_type_for(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xff, 0xd8, 0xff, ..] => "image/jpeg",
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "application/octet-stream",
    }
}
