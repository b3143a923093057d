//! OpenAI-compatible chat-completions gateway.
//!
//! Most hosted completion APIs speak the same `/chat/completions` format, so
//! one implementation with a configurable base URL covers them all.

use super::traits::{CompletionRequest, Gateway};
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use anyhow::Context as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

const DEFAULT_RETRY_AFTER_MS: u64 = 1_000;

pub struct OpenAiGateway {
    name: String,
    model: String,
    api_key: Option<String>,
    /// Pre-computed chat completions URL (avoids `format!` per request).
    cached_chat_url: String,
    client: Client,
}

impl OpenAiGateway {
    pub fn new(config: &GatewayConfig, api_key: Option<&str>) -> anyhow::Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let cached_chat_url = if base_url.contains("chat/completions") {
            base_url
        } else {
            format!("{base_url}/chat/completions")
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            name: "openai".to_string(),
            model: config.model.clone(),
            api_key: api_key.map(ToString::to_string),
            cached_chat_url,
            client,
        })
    }

    fn parse_retry_after(response: &reqwest::Response) -> u64 {
        response
            .headers()
            .get("retry-after")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok())
            .map_or(DEFAULT_RETRY_AFTER_MS, |secs| secs * 1_000)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

impl Gateway for OpenAiGateway {
    fn name(&self) -> &str {
        &self.name
    }

    fn complete<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, GatewayError>> + Send + 'a>> {
        Box::pin(async move {
            let body = ChatRequest {
                model: &self.model,
                messages: vec![
                    Message {
                        role: "system",
                        content: &request.system_prompt,
                    },
                    Message {
                        role: "user",
                        content: &request.user_prompt,
                    },
                ],
                temperature: request.temperature,
            };

            let mut http_request = self.client.post(&self.cached_chat_url).json(&body);
            if let Some(key) = &self.api_key {
                http_request = http_request.bearer_auth(key);
            }

            let response = http_request.send().await.map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout {
                        gateway: self.name.clone(),
                    }
                } else {
                    GatewayError::Request {
                        gateway: self.name.clone(),
                        message: e.to_string(),
                    }
                }
            })?;

            let status = response.status();
            if status.as_u16() == 429 {
                return Err(GatewayError::RateLimited {
                    gateway: self.name.clone(),
                    retry_after_ms: Self::parse_retry_after(&response),
                });
            }
            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(GatewayError::Request {
                    gateway: self.name.clone(),
                    message: format!("{status}: {message}"),
                });
            }

            let parsed: ChatResponse = response
                .json()
                .await
                .map_err(|e| GatewayError::Malformed(e.to_string()))?;
            let content = parsed
                .choices
                .into_iter()
                .next()
                .map(|choice| choice.message.content)
                .ok_or_else(|| GatewayError::Malformed("response has no choices".into()))?;

            tracing::debug!(
                gateway = self.name.as_str(),
                stage = request.label,
                chars = content.len(),
                "Completion received"
            );
            Ok(content)
        })
    }
}
