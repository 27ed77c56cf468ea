use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

mod auth;
use auth::AuthGate;
mod config;
use config::Settings;
mod error;
mod handlers;
use handlers::{analyze_handler, health_check, root, upload_handler};
mod logging;
mod model;
use model::MockAnalyzer;
mod storage;
use storage::ImageStore;
mod validators;

pub struct AppState {
    settings: Settings,
    store: ImageStore,
    auth: AuthGate,
    analyzer: Mutex<MockAnalyzer>,
}

impl AppState {
    fn new(settings: Settings) -> std::io::Result<Self> {
        let store = ImageStore::open(&settings.upload_dir, &settings.allowed_extensions)?;
        let auth = AuthGate::new(&settings);
        let analyzer = MockAnalyzer::from_seed(settings.analysis_seed, settings.confidence_threshold);

        Ok(AppState {
            settings,
            store,
            auth,
            analyzer: Mutex::new(analyzer),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    let _log_guard = logging::init_logging(&settings.log_dir)?;
    let addr = settings.bind_addr()?;

    let shared_state = Arc::new(AppState::new(settings)?);
    info!(
        "Storing uploads in {}",
        shared_state.store.root().display()
    );
    let app = build_router(shared_state);

    info!("Listening on http://{}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn build_router(shared_state: Arc<AppState>) -> Router {
    let body_limit_bytes = shared_state.settings.body_limit_bytes;

    let api = Router::new()
        .route("/upload", post(upload_handler))
        .route("/analyze", post(analyze_handler));

    Router::new()
        .nest("/api", api)
        .route("/", get(root))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(shared_state)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
