use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Value, json};
use tracing::warn;
use vulnpov_core::LlmUsage;

use crate::client::{ChatRequest, ChatResponse, LlmClient};
use crate::error::LlmError;
use crate::pricing::{cost_usd, pricing_for};

const MAX_ATTEMPTS: u32 = 5;
const BASE_BACKOFF: Duration = Duration::from_secs(1);

/// Chat-completions client over an OpenAI-compatible endpoint, with exponential backoff on
/// retryable transport errors.
#[derive(Debug)]
pub struct HttpLlmClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpLlmClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn send_once(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let messages: Vec<Value> = request
            .messages
            .iter()
            .map(|m| json!({"role": m.role.as_str(), "content": m.content}))
            .collect();

        let started = Instant::now();
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": request.model,
                "messages": messages,
                "temperature": request.temperature,
            }))
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::Connection(err.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| LlmError::Connection(err.to_string()))?;

        if status != StatusCode::OK {
            return Err(LlmError::from_status(status.as_u16(), &body));
        }

        parse_chat_response(&body, started.elapsed(), &request.model)
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        let mut attempt = 0u32;
        let mut last_err = None;

        while attempt < MAX_ATTEMPTS {
            attempt += 1;
            match self.send_once(&request).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_retryable() && attempt < MAX_ATTEMPTS => {
                    let backoff = BASE_BACKOFF * 2u32.pow(attempt - 1);
                    warn!(
                        "llm request failed (attempt {attempt}/{MAX_ATTEMPTS}): {err}, retrying in {:?}",
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                    last_err = Some(err);
                }
                Err(err) => return Err(err),
            }
        }

        Err(LlmError::RetriesExhausted {
            attempts: attempt,
            last: last_err.map(|e| e.to_string()).unwrap_or_default(),
        })
    }

    fn name(&self) -> &str {
        "http"
    }
}

fn parse_chat_response(body: &str, elapsed: Duration, model: &str) -> Result<ChatResponse, LlmError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|err| LlmError::Provider(format!("malformed completion JSON: {err}")))?;

    let text = value
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .ok_or_else(|| LlmError::Provider("missing choices[0].message.content".to_string()))?
        .to_string();

    let usage_value = value.get("usage");
    let input_tokens = usage_value
        .and_then(|u| u.get("prompt_tokens"))
        .and_then(Value::as_u64)
        .unwrap_or(0);
    let output_tokens = usage_value
        .and_then(|u| u.get("completion_tokens"))
        .and_then(Value::as_u64)
        .unwrap_or(0);
    let cached_tokens = usage_value
        .and_then(|u| u.get("prompt_tokens_details"))
        .and_then(|d| d.get("cached_tokens"))
        .and_then(Value::as_u64)
        .unwrap_or(0);

    let pricing = pricing_for(model);
    let cost = cost_usd(pricing, input_tokens, output_tokens);

    Ok(ChatResponse {
        text,
        usage: LlmUsage {
            input_tokens,
            cached_tokens,
            output_tokens,
            cost_usd: cost,
            elapsed,
        },
    })
}
