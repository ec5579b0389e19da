//! Mapping of analysis errors onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pricescan_core::error::ErrorKind;
use pricescan_core::ScanError;
use serde::Serialize;

/// Message returned for every upstream failure; the cause is only logged.
pub const GENERIC_FAILURE: &str = "分析失敗，請稍後再試";

/// Failure body: `{"success": false, "error": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

/// Error returned by route handlers.
#[derive(Debug)]
pub struct ApiError(pub ScanError);

impl From<ScanError> for ApiError {
    fn from(err: ScanError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Configuration | ErrorKind::Upstream => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The caller-facing message. Upstream details never leave the process.
    pub fn message(&self) -> String {
        match &self.0 {
            ScanError::Validation(msg) | ScanError::Config(msg) => msg.clone(),
            ScanError::ImageTooLarge { limit, .. } => too_large_message(*limit),
            ScanError::Upstream(_) | ScanError::MalformedModelOutput(_) => GENERIC_FAILURE.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: self.message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

pub(crate) fn too_large_message(limit: usize) -> String {
    format!("圖片大小超過 {:.0} MB 限制", limit as f64 / (1024.0 * 1024.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError(ScanError::validation("請提供圖片")).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError(ScanError::ImageTooLarge { size: 11, limit: 10 }).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError(ScanError::Config("missing".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError(ScanError::MalformedModelOutput("eof".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_upstream_detail_is_hidden() {
        let err = ApiError(ScanError::upstream("Vision API error (HTTP 401): invalid key sk-abc"));
        assert_eq!(err.message(), GENERIC_FAILURE);
    }

    #[test]
    fn test_too_large_message() {
        assert_eq!(too_large_message(10 * 1024 * 1024), "圖片大小超過 10 MB 限制");
    }
}
