//! Remote poem generator backed by the Anthropic Messages API.
//!
//! One blocking HTTPS request per attempt: the captured photo goes up as a
//! base64 image block followed by the selected prompt, and the text blocks
//! of the reply are joined into the poem.  Retries are the capture cycle's
//! business; this adapter only classifies failures.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::debug;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::app::ports::{GenerationRequest, GeneratorPort};
use crate::config::RemoteConfig;
use crate::error::RemoteError;

pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

// ── Wire types ────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct MessagesRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    pub messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
pub struct Message<'a> {
    pub role: &'static str,
    pub content: [ContentBlock<'a>; 2],
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock<'a> {
    Image { source: ImageSource<'a> },
    Text { text: &'a str },
}

#[derive(Debug, Serialize)]
pub struct ImageSource<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub media_type: &'a str,
    pub data: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
struct ResponseBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

impl<'a> MessagesRequest<'a> {
    pub fn new(request: &GenerationRequest<'a>) -> Self {
        Self {
            model: request.model,
            max_tokens: request.max_tokens,
            messages: [Message {
                role: "user",
                content: [
                    ContentBlock::Image {
                        source: ImageSource {
                            kind: "base64",
                            media_type: request.media_type,
                            data: STANDARD.encode(request.image),
                        },
                    },
                    ContentBlock::Text {
                        text: request.prompt,
                    },
                ],
            }],
        }
    }
}

/// Map an HTTP status and body to the poem or a failure kind.
pub fn interpret_response(status: StatusCode, body: &str) -> Result<String, RemoteError> {
    match status.as_u16() {
        200..=299 => {}
        401 | 403 => return Err(RemoteError::Auth),
        429 => return Err(RemoteError::RateLimited),
        code => return Err(RemoteError::UnexpectedResponse(format!("HTTP {code}"))),
    }
    let parsed: MessagesResponse = serde_json::from_str(body)
        .map_err(|e| RemoteError::UnexpectedResponse(format!("malformed body: {e}")))?;
    let text: String = parsed
        .content
        .iter()
        .filter(|b| b.kind == "text")
        .map(|b| b.text.as_str())
        .collect();
    let text = text.trim();
    if text.is_empty() {
        return Err(RemoteError::UnexpectedResponse("no text in reply".into()));
    }
    Ok(text.to_string())
}

// ── Adapter ───────────────────────────────────────────────────

pub struct AnthropicGenerator {
    client: Client,
    endpoint: String,
    api_version: String,
    api_key: String,
}

impl AnthropicGenerator {
    pub fn new(config: &RemoteConfig, api_key: String) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(u64::from(config.timeout_secs)))
            .build()
            .map_err(|e| RemoteError::Connection(format!("client setup: {e}")))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_version: config.api_version.clone(),
            api_key,
        })
    }

    /// Key from the environment first, then from the config file.
    pub fn resolve_api_key(config: &RemoteConfig, env: Option<String>) -> Option<String> {
        let usable = |k: String| {
            let k = k.trim().to_string();
            (!k.is_empty()).then_some(k)
        };
        env.and_then(usable)
            .or_else(|| config.api_key.clone().and_then(usable))
    }
}

impl GeneratorPort for AnthropicGenerator {
    fn generate(&mut self, request: &GenerationRequest<'_>) -> Result<String, RemoteError> {
        let body = MessagesRequest::new(request);
        debug!(
            "GENERATOR: {} ({} image bytes, max {} tokens)",
            request.model,
            request.image.len(),
            request.max_tokens
        );
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(&body)
            .send()
            .map_err(|e| RemoteError::Connection(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .map_err(|e| RemoteError::Connection(format!("reading reply: {e}")))?;
        interpret_response(status, &text)
    }
}
