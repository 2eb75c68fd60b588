use std::time::Duration;

/// Token/cost accounting returned alongside generated text by the LLM transport, and folded
/// into the Conversation's running accumulators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LlmUsage {
    pub input_tokens: u64,
    pub cached_tokens: u64,
    pub output_tokens: u64,
    pub cost_usd: f64,
    pub elapsed: Duration,
}

impl LlmUsage {
    pub fn zero() -> Self {
        Self {
            input_tokens: 0,
            cached_tokens: 0,
            output_tokens: 0,
            cost_usd: 0.0,
            elapsed: Duration::ZERO,
        }
    }

    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

impl Default for LlmUsage {
    fn default() -> Self {
        Self::zero()
    }
}
