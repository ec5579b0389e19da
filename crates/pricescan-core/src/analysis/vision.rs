//! OpenAI-compatible vision client.
//!
//! Sends the prompt and the base64-encoded image as a single chat-completion
//! user message and returns the assistant's text.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ScanError, ScanResult};

/// Default OpenAI API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Default vision model.
pub const DEFAULT_MODEL: &str = "gpt-4o";

const MAX_TOKENS: u32 = 2000;
const TEMPERATURE: f32 = 0.7;

/// Everything the model needs for one analysis.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    pub prompt: String,
    /// `data:<media type>;base64,<payload>`
    pub image_data_url: String,
    /// Ask the API to constrain output to a JSON object.
    pub json_mode: bool,
}

/// A vision-capable chat model.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Model identifier reported by the info endpoint.
    fn model_id(&self) -> &str;

    /// Run one completion and return the assistant message content.
    async fn complete(&self, request: &VisionRequest) -> ScanResult<String>;
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone)]
pub struct OpenAiVisionClient {
    api_key: String,
    api_base: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ContentPart<'a> {
    #[serde(rename = "text")]
    Text { text: &'a str },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
    detail: &'static str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiVisionClient {
    /// Create a new client for the given credential, API base and model.
    ///
    /// `timeout` of `None` keeps the HTTP client's default.
    pub fn new(api_key: &str, api_base: &str, model: &str, timeout: Option<Duration>) -> Self {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Self {
            api_key: api_key.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: builder.build().unwrap_or_default(),
        }
    }

    /// Create a client against the public OpenAI API with `gpt-4o`.
    pub fn with_defaults(api_key: &str) -> Self {
        Self::new(api_key, DEFAULT_API_BASE, DEFAULT_MODEL, None)
    }
}

#[async_trait]
impl VisionModel for OpenAiVisionClient {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &VisionRequest) -> ScanResult<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: &request.prompt,
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: &request.image_data_url,
                            detail: "high",
                        },
                    },
                ],
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            response_format: request.json_mode.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        debug!(model = %self.model, json_mode = request.json_mode, "Calling vision API");
        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ScanError::upstream(format!("Failed to call vision API: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ScanError::upstream(format!(
                "Vision API error (HTTP {status}): {error_text}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ScanError::upstream(format!("Failed to parse vision API response: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| ScanError::upstream("No text content in vision API response"))?;

        debug!(chars = content.len(), "Vision API responded");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(json_mode: bool) -> VisionRequest {
        VisionRequest {
            prompt: "price this".to_string(),
            image_data_url: "data:image/png;base64,AAAA".to_string(),
            json_mode,
        }
    }

    #[tokio::test]
    async fn test_sends_image_message_and_returns_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4o",
                "max_tokens": 2000,
                "response_format": { "type": "json_object" },
                "messages": [{
                    "role": "user",
                    "content": [
                        { "type": "text", "text": "price this" },
                        { "type": "image_url", "image_url": {
                            "url": "data:image/png;base64,AAAA",
                            "detail": "high"
                        }}
                    ]
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "{\"name\":\"pen\"}" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiVisionClient::new("sk-test", &format!("{}/v1/", server.uri()), "gpt-4o", None);
        let content = client.complete(&request(true)).await.unwrap();
        assert_eq!(content, "{\"name\":\"pen\"}");
    }

    #[tokio::test]
    async fn test_error_status_is_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let client = OpenAiVisionClient::new("sk-test", &server.uri(), "gpt-4o", None);
        let err = client.complete(&request(false)).await.unwrap_err();
        assert!(matches!(err, ScanError::Upstream(ref msg) if msg.contains("429")));
    }

    #[tokio::test]
    async fn test_empty_choices_is_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let client = OpenAiVisionClient::new("sk-test", &server.uri(), "gpt-4o", None);
        let err = client.complete(&request(false)).await.unwrap_err();
        assert!(matches!(err, ScanError::Upstream(_)));
    }

    #[test]
    fn test_legacy_request_omits_response_format() {
        let body = ChatRequest {
            model: "gpt-4o",
            messages: Vec::new(),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            response_format: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("response_format").is_none());
    }
}
