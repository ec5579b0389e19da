//! Price Scanner Core Library
//!
//! Domain model and business logic for the image pricing gateway: prompt
//! construction, the vision model client, and response shaping.

pub mod analysis;
pub mod error;

pub use analysis::{AnalysisRequest, Analyzer, ResponsePolicy};
pub use analysis::model::AnalysisResult;
pub use error::{ScanError, ScanResult};
