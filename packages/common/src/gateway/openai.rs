//! reqwest-backed gateway against an OpenAI-compatible chat completions
//! endpoint.
//!
//! Media parts are inlined as `data:` URLs in the message content array, in
//! request order. The client is built once at startup and injected into the
//! server state; tests substitute a fake [`VisionGateway`] instead.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::GatewayError;
use super::traits::VisionGateway;
use crate::request::{AnalysisRequest, RequestPart};
use crate::retry::calculate_backoff;

/// Longest service error body carried into a [`GatewayError`].
const MAX_ERROR_DETAIL: usize = 512;

/// Connection settings for the inference service.
#[derive(Clone, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the OpenAI-compatible API, without the `/v1/...` suffix.
    pub base_url: String,
    /// API credential, supplied via process environment. Never logged.
    pub api_key: String,
    /// Model identifier to request.
    pub model: String,
    /// Per-call timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Total attempts per analysis. 1 means no retry; each attempt is
    /// billable, so retries are an explicit opt-in.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u8,
    /// Backoff base delay between retries, in milliseconds.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    /// Backoff delay cap, in milliseconds.
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
}

fn default_timeout_secs() -> u64 {
    120
}
fn default_max_attempts() -> u8 {
    1
}
fn default_backoff_base_ms() -> u64 {
    1000
}
fn default_backoff_max_ms() -> u64 {
    30_000
}

// Manual impl so the credential cannot leak through debug logging.
impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .field("backoff_base_ms", &self.backoff_base_ms)
            .field("backoff_max_ms", &self.backoff_max_ms)
            .finish()
    }
}

/// Gateway to an OpenAI-compatible `/v1/chat/completions` endpoint.
pub struct OpenAiGateway {
    client: Client,
    config: GatewayConfig,
}

impl OpenAiGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    async fn send(&self, payload: &ChatRequest) -> Result<String, GatewayError> {
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(GatewayError::Auth);
        }
        if !status.is_success() {
            let mut detail = response.text().await.unwrap_or_default();
            detail.truncate(MAX_ERROR_DETAIL);
            return Err(GatewayError::Service {
                status: status.as_u16(),
                detail,
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::MalformedResponse(e.without_url().to_string()))?;

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GatewayError::MalformedResponse(
                "response contained no report text".to_string(),
            ));
        }

        Ok(text)
    }
}

#[async_trait]
impl VisionGateway for OpenAiGateway {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<String, GatewayError> {
        let payload = build_payload(&self.config.model, request);
        debug!(
            model = %self.config.model,
            media_count = request.media_count(),
            "Submitting analysis request"
        );

        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            match self.send(&payload).await {
                Ok(text) => return Ok(text),
                Err(e) if attempt < self.config.max_attempts && e.is_retryable() => {
                    let delay = calculate_backoff(
                        attempt,
                        self.config.backoff_base_ms,
                        self.config.backoff_max_ms,
                    );
                    warn!(
                        attempt,
                        classification = e.classification(),
                        delay_ms = delay.as_millis() as u64,
                        "Gateway call failed, retrying after backoff"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Map an [`AnalysisRequest`] onto the chat completions wire format: one user
/// message whose content array is the instruction followed by every media
/// part, in request order.
fn build_payload(model: &str, request: &AnalysisRequest) -> ChatRequest {
    let content = request
        .parts()
        .iter()
        .map(|part| match part {
            RequestPart::Text(text) => ContentPart::Text { text: text.clone() },
            RequestPart::Media(media) => {
                let encoded = base64::engine::general_purpose::STANDARD.encode(&media.bytes);
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: format!("data:{};base64,{}", media.content_type, encoded),
                    },
                }
            }
        })
        .collect();

    ChatRequest {
        model: model.to_string(),
        messages: vec![ChatMessage {
            role: "user".to_string(),
            content,
        }],
    }
}

// Wire types.

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
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
