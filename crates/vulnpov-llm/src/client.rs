use async_trait::async_trait;
use vulnpov_core::{LlmUsage, Message};

use crate::error::LlmError;

/// One chat-completion request: the full transcript plus sampling/caching controls.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    /// Number of leading messages the provider should tag ephemeral-cached, when it supports
    /// prompt caching. A pure optimization hint; implementations are free to ignore it.
    pub cache_prefix_len: usize,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>, temperature: f32) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature,
            cache_prefix_len: 0,
        }
    }

    pub fn with_cache_prefix(mut self, len: usize) -> Self {
        self.cache_prefix_len = len;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub text: String,
    pub usage: LlmUsage,
}

/// Abstracts the LLM provider as an opaque chat-completion endpoint returning text plus
/// token/cost accounting. `Conversation::generate()` is the sole caller.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LlmError>;

    fn name(&self) -> &str;
}
