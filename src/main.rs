use clap::Parser;
use skulens_api::{AppState, HttpExtractor, RestApi, UploadLimits, DEFAULT_MAX_UPLOAD_BYTES};
use skulens_core::{
    MatchConfig, DEFAULT_CORRECTION_THRESHOLD, DEFAULT_FEATURE_MODEL, DEFAULT_SIMILARITY_THRESHOLD,
    DEFAULT_TOP_K,
};
use skulens_storage::{StorageManager, DEFAULT_MAP_SIZE};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Visual SKU matching service with a correction feedback loop
#[derive(Parser, Debug)]
#[command(name = "skulens")]
#[command(about = "Match item photos to catalog SKUs", long_about = None)]
struct Args {
    /// Path to the data directory
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// LMDB map size in bytes; bounds how much image data the store can hold
    #[arg(long, default_value_t = DEFAULT_MAP_SIZE)]
    lmdb_map_size: usize,

    /// HTTP API port
    #[arg(long, default_value_t = 8000)]
    http_port: u16,

    /// Embedding extraction endpoint
    #[arg(long, default_value = "http://127.0.0.1:8001/embed")]
    embedder_url: String,

    /// Timeout for one extraction call, in seconds
    #[arg(long, default_value_t = 30)]
    embedder_timeout_secs: u64,

    /// JSON file of master catalog entries to load at startup
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// JSON file of users to load at startup
    #[arg(long)]
    users: Option<PathBuf>,

    /// Minimum similarity for a catalog match
    #[arg(long, default_value_t = DEFAULT_SIMILARITY_THRESHOLD)]
    similarity_threshold: f32,

    /// Minimum similarity for a correction override
    #[arg(long, default_value_t = DEFAULT_CORRECTION_THRESHOLD)]
    correction_threshold: f32,

    /// Maximum number of catalog matches returned
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    top_k: usize,

    /// Largest accepted upload, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    max_upload_bytes: usize,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    anyhow::ensure!(
        (0.0..=1.0).contains(&args.similarity_threshold)
            && (0.0..=1.0).contains(&args.correction_threshold),
        "thresholds must lie in [0, 1]"
    );
    anyhow::ensure!(args.top_k > 0, "--top-k must be at least 1");
    anyhow::ensure!(args.lmdb_map_size > 0, "--lmdb-map-size must be positive");

    info!("Starting SKU Lens v{}", env!("CARGO_PKG_VERSION"));
    info!("Data directory: {:?}", args.data_dir);
    info!("HTTP API port: {}", args.http_port);
    info!("Embedding service: {}", args.embedder_url);

    let storage = StorageManager::open_or_disconnected(&args.data_dir, args.lmdb_map_size);
    if storage.is_connected() {
        if let Some(path) = &args.catalog {
            storage.load_catalog(path)?;
        }
        if let Some(path) = &args.users {
            storage.load_users(path)?;
        }
        info!("Storage initialized");
    } else {
        warn!("Storage disconnected; searches will return no matches and writes will fail");
    }

    let config = MatchConfig {
        similarity_threshold: args.similarity_threshold,
        correction_threshold: args.correction_threshold,
        top_k: args.top_k,
        feature_model: DEFAULT_FEATURE_MODEL.to_string(),
    };
    let engine = Arc::new(storage.engine(config));

    let extractor = HttpExtractor::new(
        args.embedder_url.clone(),
        Duration::from_secs(args.embedder_timeout_secs),
    )?;
    let state = AppState::new(engine, Arc::new(extractor)).with_limits(UploadLimits {
        max_upload_bytes: args.max_upload_bytes,
        ..UploadLimits::default()
    });

    let http_port = args.http_port;
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on port {}", http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(state, http_port).await {
                error!("HTTP server error: {}", e);
            }
        })
    });

    info!("SKU Lens started successfully");
    info!("HTTP API: http://localhost:{}/", args.http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}
