//! Application state.

use pricescan_core::Analyzer;
use std::sync::Arc;

/// Service name reported by the info and health endpoints.
pub const SERVICE_NAME: &str = "GPT-4o 價格掃描器 API";

/// Application state shared across handlers.
///
/// Built once at startup and never mutated afterwards.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
    pub service_name: String,
}

impl AppState {
    pub fn new(analyzer: Analyzer) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            service_name: SERVICE_NAME.to_string(),
        }
    }
}
