//! Image analysis pipeline.
//!
//! validate → encode → call the vision model → shape the response. Each call
//! to [`Analyzer::analyze`] is self-contained; the analyzer itself is built
//! once at startup and shared read-only.

pub mod model;
pub mod parser;
pub mod prompt;
pub mod vision;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use base64::Engine;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{ScanError, ScanResult};
use model::AnalysisResult;
use vision::{VisionModel, VisionRequest};

/// Upload limit applied when none is configured (10 MiB).
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Media type assumed when the upload does not declare an image type.
pub const FALLBACK_MEDIA_TYPE: &str = "image/jpeg";

/// How the model's reply is turned into an [`AnalysisResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponsePolicy {
    /// The model returns a JSON object with the fixed field set.
    #[default]
    Schema,
    /// The model returns labelled free text, scanned line by line.
    Legacy,
}

impl fmt::Display for ResponsePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema => write!(f, "schema"),
            Self::Legacy => write!(f, "legacy"),
        }
    }
}

impl FromStr for ResponsePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "schema" | "json" => Ok(Self::Schema),
            "legacy" | "text" => Ok(Self::Legacy),
            other => Err(format!("unknown response policy '{other}' (expected 'schema' or 'legacy')")),
        }
    }
}

/// One uploaded image plus the caller's optional question.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub image: Vec<u8>,
    pub media_type: String,
    pub question: Option<String>,
}

impl AnalysisRequest {
    /// Create a request, keeping `media_type` only when it names an image type.
    pub fn new(image: Vec<u8>, media_type: Option<&str>, question: Option<String>) -> Self {
        let media_type = media_type
            .map(|m| m.split(';').next().unwrap_or(m).trim().to_ascii_lowercase())
            .filter(|m| m.starts_with("image/"))
            .unwrap_or_else(|| FALLBACK_MEDIA_TYPE.to_string());

        Self {
            image,
            media_type,
            question,
        }
    }

    fn data_url(&self) -> String {
        let b64 = base64::engine::general_purpose::STANDARD.encode(&self.image);
        format!("data:{};base64,{}", self.media_type, b64)
    }
}

/// Process-wide analysis configuration plus the model handle.
///
/// `model` is `None` when no API credential was configured; requests then
/// fail with [`ScanError::Config`] before anything is sent upstream.
#[derive(Clone)]
pub struct Analyzer {
    model: Option<Arc<dyn VisionModel>>,
    /// Configured model id, known even when no client exists.
    model_id: String,
    policy: ResponsePolicy,
    max_image_bytes: usize,
}

impl Analyzer {
    pub fn new(model: Option<Arc<dyn VisionModel>>, policy: ResponsePolicy) -> Self {
        let model_id = model
            .as_deref()
            .map_or(vision::DEFAULT_MODEL, |m| m.model_id())
            .to_string();

        Self {
            model,
            model_id,
            policy,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    pub fn with_max_image_bytes(mut self, max_image_bytes: usize) -> Self {
        self.max_image_bytes = max_image_bytes;
        self
    }

    pub fn policy(&self) -> ResponsePolicy {
        self.policy
    }

    pub fn max_image_bytes(&self) -> usize {
        self.max_image_bytes
    }

    pub fn is_configured(&self) -> bool {
        self.model.is_some()
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Check an upload size against the configured limit.
    pub fn check_size(&self, size: usize) -> ScanResult<()> {
        if size > self.max_image_bytes {
            return Err(ScanError::ImageTooLarge {
                size,
                limit: self.max_image_bytes,
            });
        }
        Ok(())
    }

    /// Run the full pipeline for one request.
    pub async fn analyze(&self, request: AnalysisRequest) -> ScanResult<AnalysisResult> {
        if request.image.is_empty() {
            return Err(ScanError::validation("圖片內容為空"));
        }
        self.check_size(request.image.len())?;

        let model = self
            .model
            .as_ref()
            .ok_or_else(|| ScanError::Config("伺服器尚未設定 API 金鑰".to_string()))?;

        let vision_request = VisionRequest {
            prompt: prompt::build_prompt(self.policy, request.question.as_deref()),
            image_data_url: request.data_url(),
            json_mode: self.policy == ResponsePolicy::Schema,
        };
        debug!(
            size = request.image.len(),
            media_type = %request.media_type,
            policy = %self.policy,
            "Sending image to vision model"
        );

        let content = model.complete(&vision_request).await?;
        shape_response(self.policy, &content)
    }
}

/// Turn raw model text into a result according to `policy`.
pub fn shape_response(policy: ResponsePolicy, content: &str) -> ScanResult<AnalysisResult> {
    match policy {
        ResponsePolicy::Schema => {
            let json = parser::extract_json_object(content);
            let value: serde_json::Value = serde_json::from_str(json)
                .map_err(|e| ScanError::MalformedModelOutput(e.to_string()))?;
            AnalysisResult::from_model_json(value).map_err(|e| {
                warn!(error = %e, "Model JSON does not match the result schema");
                ScanError::MalformedModelOutput(e.to_string())
            })
        }
        ResponsePolicy::Legacy => Ok(parser::parse_legacy(content)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct StubModel {
        reply: ScanResult<String>,
        calls: AtomicUsize,
        last: Mutex<Option<VisionRequest>>,
    }

    impl StubModel {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
                last: Mutex::new(None),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(ScanError::upstream("HTTP 401: invalid key")),
                calls: AtomicUsize::new(0),
                last: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl VisionModel for StubModel {
        fn model_id(&self) -> &str {
            "stub"
        }

        async fn complete(&self, request: &VisionRequest) -> ScanResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some(request.clone());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(ScanError::upstream(e.to_string())),
            }
        }
    }

    fn image(len: usize) -> AnalysisRequest {
        AnalysisRequest::new(vec![0xFF; len], Some("image/png"), None)
    }

    #[tokio::test]
    async fn test_schema_object_passes_through() {
        let expected = AnalysisResult::placeholder();
        let stub = StubModel::replying(&serde_json::to_string(&expected).unwrap());
        let analyzer = Analyzer::new(Some(stub.clone()), ResponsePolicy::Schema);

        let result = analyzer.analyze(image(16)).await.unwrap();
        assert_eq!(result, expected);
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);

        let sent = stub.last.lock().unwrap().clone().unwrap();
        assert!(sent.json_mode);
        assert!(sent.image_data_url.starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn test_missing_credential_skips_call() {
        let analyzer = Analyzer::new(None, ResponsePolicy::Schema);
        let err = analyzer.analyze(image(16)).await.unwrap_err();
        assert!(matches!(err, ScanError::Config(_)));
    }

    #[test]
    fn test_model_id_without_client() {
        let analyzer = Analyzer::new(None, ResponsePolicy::Schema);
        assert_eq!(analyzer.model_id(), vision::DEFAULT_MODEL);

        let analyzer = analyzer.with_model_id("gpt-4o-mini");
        assert_eq!(analyzer.model_id(), "gpt-4o-mini");
        assert!(!analyzer.is_configured());

        let analyzer = Analyzer::new(Some(StubModel::replying("{}")), ResponsePolicy::Schema);
        assert_eq!(analyzer.model_id(), "stub");
    }

    #[tokio::test]
    async fn test_validation_runs_before_call() {
        let stub = StubModel::replying("{}");
        let analyzer = Analyzer::new(Some(stub.clone()), ResponsePolicy::Schema).with_max_image_bytes(8);

        assert!(matches!(
            analyzer.analyze(image(0)).await.unwrap_err(),
            ScanError::Validation(_)
        ));
        assert!(matches!(
            analyzer.analyze(image(9)).await.unwrap_err(),
            ScanError::ImageTooLarge { size: 9, limit: 8 }
        ));
        assert!(analyzer.analyze(image(8)).await.is_ok());
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_malformed_output() {
        let stub = StubModel::replying("I think this is a pen, about NT$ 20.");
        let analyzer = Analyzer::new(Some(stub), ResponsePolicy::Schema);
        let err = analyzer.analyze(image(4)).await.unwrap_err();
        assert!(matches!(err, ScanError::MalformedModelOutput(_)));
    }

    #[tokio::test]
    async fn test_upstream_failure_propagates() {
        let analyzer = Analyzer::new(Some(StubModel::failing()), ResponsePolicy::Schema);
        let err = analyzer.analyze(image(4)).await.unwrap_err();
        assert!(matches!(err, ScanError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_legacy_policy_uses_text_prompt() {
        let stub = StubModel::replying("物品名稱：原子筆\n估計價格：NT$ 20");
        let analyzer = Analyzer::new(Some(stub.clone()), ResponsePolicy::Legacy);
        let request = AnalysisRequest::new(vec![1, 2, 3], None, Some("哪裡買？".to_string()));

        let result = analyzer.analyze(request).await.unwrap();
        assert_eq!(result.name, "原子筆");
        assert_eq!(result.price, "NT$ 20");

        let sent = stub.last.lock().unwrap().clone().unwrap();
        assert!(!sent.json_mode);
        assert!(sent.prompt.ends_with("哪裡買？"));
        assert!(sent.image_data_url.starts_with("data:image/jpeg;base64,AQID"));
    }

    #[test]
    fn test_shape_response_accepts_fenced_json() {
        let text = "```json\n{\"name\": \"台北101大樓\", \"popularityScore\": 99}\n```";
        let result = shape_response(ResponsePolicy::Schema, text).unwrap();
        assert_eq!(result.name, "台北101大樓");
        assert_eq!(result.popularity_score, 99);
        assert_eq!(
            serde_json::to_value(&result).unwrap()["purchaseLinks"]["offline"],
            json!(["百貨公司", "相關專賣店"])
        );
    }

    #[test]
    fn test_media_type_normalization() {
        assert_eq!(AnalysisRequest::new(vec![], Some("image/WEBP; q=1"), None).media_type, "image/webp");
        assert_eq!(AnalysisRequest::new(vec![], Some("application/octet-stream"), None).media_type, "image/jpeg");
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("Schema".parse::<ResponsePolicy>(), Ok(ResponsePolicy::Schema));
        assert_eq!("legacy".parse::<ResponsePolicy>(), Ok(ResponsePolicy::Legacy));
        assert!("yaml".parse::<ResponsePolicy>().is_err());
    }
}
