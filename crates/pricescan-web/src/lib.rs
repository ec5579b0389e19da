//! Price Scanner Web Server
//!
//! Axum-based HTTP gateway exposing the image analysis endpoint.

pub mod error;
pub mod routes;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use pricescan_core::Analyzer;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use state::AppState;

/// Largest accepted `question` field (1 MiB).
pub const MAX_QUESTION_BYTES: usize = 1024 * 1024;

/// Extra body allowance for multipart boundaries and part headers.
pub const MULTIPART_HEADROOM: usize = 64 * 1024;

/// Origins allowed when none are configured.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 2] = ["http://localhost:3000", "https://lynn800741.github.io"];

/// Listener and CORS settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Cross-origin allow-list; `*` allows any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect(),
        }
    }
}

/// Build the CORS layer for an origin allow-list.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allow_origin = if allowed_origins.iter().any(|o| o.trim() == "*") {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| {
                let origin = origin.trim().trim_end_matches('/');
                HeaderValue::from_str(origin)
                    .inspect_err(|_| warn!(origin, "Ignoring invalid CORS origin"))
                    .ok()
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

/// Create the application router.
pub fn create_router(state: AppState, allowed_origins: &[String]) -> Router {
    let body_limit = state.analyzer.max_image_bytes() + MAX_QUESTION_BYTES + MULTIPART_HEADROOM;

    let api_routes = Router::new()
        .route("/health", get(routes::info::health))
        .route(
            "/analyze",
            post(routes::analyze::analyze).layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state.clone());

    Router::new()
        .route("/", get(routes::info::index))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

/// Run the web server.
pub async fn run_server(config: ServerConfig, analyzer: Analyzer) -> anyhow::Result<()> {
    if !analyzer.is_configured() {
        warn!("No vision API key configured; /api/analyze will return 500 until one is set");
    }

    let state = AppState::new(analyzer);
    let app = create_router(state, &config.allowed_origins);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Web server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
