use std::time::Duration;

/// One completed `llm_call` action, reported after every `generate()`/condensation call so a
/// caller (the Engine's Log Record) can persist it without this crate depending on the log
/// format.
#[derive(Debug, Clone)]
pub struct LlmCallRecord {
    pub input_tokens: u64,
    pub cached_tokens: u64,
    pub output_tokens: u64,
    pub cost_usd: f64,
    pub elapsed: Duration,
    pub accumulated_cost: f64,
    pub accumulated_elapsed: Duration,
}

/// One completed tool dispatch, reported so the Log Record can persist a `ToolCall` row without
/// this crate depending on the log format. Tool calls carry no cost, only elapsed time.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    pub tool_name: String,
    pub elapsed: Duration,
    pub accumulated_cost: f64,
    pub accumulated_elapsed: Duration,
}

/// Receives action events as the conversation progresses. The Engine's Logger implements this;
/// tests can use a no-op or recording stub.
pub trait ActionSink: Send + Sync {
    fn record_llm_call(&self, record: LlmCallRecord);
    fn record_tool_call(&self, record: ToolCallRecord);
}

/// An `ActionSink` that discards every event, for tests and dry runs.
#[derive(Debug, Default)]
pub struct NullSink;

impl ActionSink for NullSink {
    fn record_llm_call(&self, _record: LlmCallRecord) {}
    fn record_tool_call(&self, _record: ToolCallRecord) {}
}
