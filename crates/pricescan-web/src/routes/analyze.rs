//! Image analysis handler.

use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    Json,
};
use pricescan_core::error::ErrorKind;
use pricescan_core::{AnalysisRequest, AnalysisResult, ScanError};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::{too_large_message, ApiError};
use crate::state::AppState;
use crate::MAX_QUESTION_BYTES;

const QUESTION_TOO_LARGE: &str = "問題內容過長，請縮短後再試";
const BODY_TOO_LARGE: &str = "上傳內容超過大小限制";

/// Success body: `{"success": true, "data": {...}}`.
#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub data: AnalysisResult,
}

/// POST /api/analyze - Estimate the price of the uploaded image.
///
/// Multipart fields: `image` (required, exactly one) and `question` (optional).
pub async fn analyze(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let request_id = uuid::Uuid::new_v4();

    let multipart = multipart.map_err(|e| {
        warn!(%request_id, error = %e, "Rejected non-multipart request");
        ScanError::validation("請以 multipart/form-data 上傳圖片")
    })?;
    let request = read_upload(&state, multipart).await.inspect_err(|e| {
        warn!(%request_id, error = %e.0, "Rejected upload");
    })?;

    info!(
        %request_id,
        size = request.image.len(),
        media_type = %request.media_type,
        has_question = request.question.is_some(),
        "Analyzing image"
    );

    match state.analyzer.analyze(request).await {
        Ok(data) => {
            info!(%request_id, name = %data.name, "Analysis complete");
            Ok(Json(AnalyzeResponse {
                success: true,
                data,
            }))
        }
        Err(e) => {
            match e.kind() {
                ErrorKind::Upstream => error!(%request_id, error = %e, "Analysis failed"),
                _ => warn!(%request_id, error = %e, "Analysis rejected"),
            }
            Err(ApiError(e))
        }
    }
}

/// Collect the `image` and `question` parts, enforcing the upload limits.
async fn read_upload(state: &AppState, mut multipart: Multipart) -> Result<AnalysisRequest, ApiError> {
    let mut image: Option<(Vec<u8>, Option<String>)> = None;
    let mut question: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_error(e, BODY_TOO_LARGE))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                if image.is_some() {
                    return Err(ScanError::validation("一次只能上傳一張圖片").into());
                }
                let media_type = field.content_type().map(str::to_string);
                let bytes = read_image(state, field).await?;
                image = Some((bytes, media_type));
            }
            Some("question") => {
                let text = read_question(field).await?;
                question = Some(text).filter(|q| !q.trim().is_empty());
            }
            _ => {}
        }
    }

    let (bytes, media_type) = image.ok_or_else(|| ScanError::validation("請提供圖片"))?;
    Ok(AnalysisRequest::new(bytes, media_type.as_deref(), question))
}

/// Buffer one image part, failing as soon as it grows past the limit.
async fn read_image(state: &AppState, mut field: Field<'_>) -> Result<Vec<u8>, ApiError> {
    let too_large = too_large_message(state.analyzer.max_image_bytes());
    let mut buf = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(|e| upload_error(e, &too_large))? {
        state.analyzer.check_size(buf.len() + chunk.len())?;
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

/// Read the question part as UTF-8, capped at [`MAX_QUESTION_BYTES`].
async fn read_question(mut field: Field<'_>) -> Result<String, ApiError> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(|e| upload_error(e, QUESTION_TOO_LARGE))? {
        if buf.len() + chunk.len() > MAX_QUESTION_BYTES {
            return Err(ScanError::validation(QUESTION_TOO_LARGE).into());
        }
        buf.extend_from_slice(&chunk);
    }
    String::from_utf8(buf).map_err(|_| ScanError::validation("問題必須是 UTF-8 文字").into())
}

/// Map a multipart read failure; `too_large` names what hit the body limit.
fn upload_error(err: MultipartError, too_large: &str) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ScanError::validation(too_large).into();
    }
    ScanError::validation(format!("上傳內容無法解析: {}", err.body_text())).into()
}
