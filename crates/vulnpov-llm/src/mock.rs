use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use vulnpov_core::LlmUsage;

use crate::client::{ChatRequest, ChatResponse, LlmClient};
use crate::error::LlmError;

/// A scripted stand-in for a real provider: callers get back a fixed queue of responses in
/// order, and the requests sent are recorded for inspection. Used by the conversation, phase,
/// and engine tests to make multi-turn scenarios deterministic.
pub struct MockLlmClient {
    responses: Mutex<Vec<Result<ChatResponse, LlmError>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockLlmClient {
    pub fn new(responses: Vec<&str>) -> Self {
        Self::with_results(responses.into_iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn with_results(results: Vec<Result<String, LlmError>>) -> Self {
        Self::with_responses(results.into_iter().map(|r| r.map(default_response)).collect())
    }

    /// Full control over each turn's response, including token counts and cost — for scenarios
    /// (e.g. budget exhaustion) that depend on a specific accumulated cost rather than the
    /// `new`/`with_results` zero-cost default.
    pub fn with_responses(responses: Vec<Result<ChatResponse, LlmError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().rev().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

fn default_response(text: String) -> ChatResponse {
    let input_tokens = text.chars().count().div_ceil(4).max(1) as u64;
    ChatResponse {
        text,
        usage: LlmUsage {
            input_tokens,
            cached_tokens: 0,
            output_tokens: input_tokens,
            cost_usd: 0.0,
            elapsed: Duration::from_millis(1),
        },
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        self.requests.lock().unwrap().push(request);

        self.responses
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| LlmError::Provider("mock client exhausted its scripted responses".to_string()))?
    }

    fn name(&self) -> &str {
        "mock"
    }
}
