use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use vulnpov_core::{Message, Role};
use vulnpov_llm::{ChatRequest, LlmClient, context_window_for};

use crate::error::ConversationError;
use crate::sink::{ActionSink, LlmCallRecord, NullSink, ToolCallRecord};

const FRACTION_TO_CONDENSE: f64 = 0.7;
const THRESHOLD_FRACTION: f64 = 0.20;
const CONDENSATION_SYSTEM_PROMPT: &str = "You are an intelligent code assistant.";
const CONDENSATION_INSTRUCTIONS: &str = "You are maintaining a context-aware state summary for an interactive agent.\n\
You will be given a list of events corresponding to actions taken by the agent. Track:\n\
FILES READ:\n\
(List of relevant files read by the agent, and a brief summary of each file)\n\
FILES MODIFIED:\n\
(List of files modified by the agent, and a brief summary of each modification)\n\
CODE SUMMARY:\n\
(Brief summary of the understanding gathered by the agent about the functionality and structure of the code)\n\
CODE STATE:\n\
(Brief summary of the current state of the code - does it compile, does it run, etc.)\n\
COMPLETED:\n\
(Tasks completed so far, with brief results)\n\
PENDING:\n\
(Tasks that still need to be done)\n";
const CONDENSATION_CLOSING: &str = "Now summarize the events in the format shown above. Make sure to generate each of the following:\n\
FILES READ, FILES MODIFIED, CODE SUMMARY, CODE STATE, COMPLETED, PENDING.\n";
const TRUNCATION_NOTICE: &str =
    "I am truncating the conversation to minimize cost. Summarize what you have done so far.";
/// Leading messages tagged ephemeral-cached when the provider supports prompt caching.
const CACHE_PREFIX_LEN: usize = 4;

/// The running transcript for one phase: message history, budget enforcement, and
/// condensation, backed by an `LlmClient`.
pub struct Conversation {
    model: String,
    messages: Vec<Message>,
    threshold: usize,
    budget_usd: f64,
    timeout: Duration,
    temperature: f32,
    accumulated_cost: f64,
    accumulated_elapsed: Duration,
    client: Arc<dyn LlmClient>,
    sink: Arc<dyn ActionSink>,
}

impl Conversation {
    pub fn new(
        model: impl Into<String>,
        client: Arc<dyn LlmClient>,
        budget_usd: f64,
        timeout: Duration,
        temperature: f32,
    ) -> Self {
        let model = model.into();
        let threshold = (THRESHOLD_FRACTION * context_window_for(&model) as f64) as usize;
        Self {
            model,
            messages: Vec::new(),
            threshold,
            budget_usd,
            timeout,
            temperature,
            accumulated_cost: 0.0,
            accumulated_elapsed: Duration::ZERO,
            client,
            sink: Arc::new(NullSink),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ActionSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn accumulated_cost(&self) -> f64 {
        self.accumulated_cost
    }

    pub fn accumulated_elapsed(&self) -> Duration {
        self.accumulated_elapsed
    }

    /// Folds a completed tool dispatch's elapsed time into the running wall-clock total and
    /// notifies the sink, mirroring the original's accumulation of tool-call time alongside
    /// LLM-call time into a single running total. Tool calls carry no cost.
    pub fn record_tool_call(&mut self, tool_name: &str, elapsed: Duration) {
        self.accumulated_elapsed += elapsed;
        self.sink.record_tool_call(ToolCallRecord {
            tool_name: tool_name.to_string(),
            elapsed,
            accumulated_cost: self.accumulated_cost,
            accumulated_elapsed: self.accumulated_elapsed,
        });
    }

    /// Appends a `system` or `user` message, enforcing budget/timeout ceilings first and
    /// running condensation afterward if the transcript has grown past the threshold.
    /// Inclusive: cost == budget or elapsed == timeout both fail.
    pub async fn append(&mut self, role: Role, content: impl Into<String>) -> Result<(), ConversationError> {
        if role == Role::Assistant {
            return Err(ConversationError::AssistantRoleReserved);
        }
        if self.accumulated_cost >= self.budget_usd {
            return Err(ConversationError::BudgetExceeded {
                budget: self.budget_usd,
                cost: self.accumulated_cost,
            });
        }
        if self.accumulated_elapsed >= self.timeout {
            return Err(ConversationError::TimeoutExceeded {
                timeout_s: self.timeout.as_secs(),
                elapsed_s: self.accumulated_elapsed.as_secs(),
            });
        }

        self.messages.push(Message::new(role, content));

        let total_tokens: usize = self.messages.iter().map(Message::estimated_tokens).sum();
        if total_tokens >= self.threshold {
            self.condense().await?;
        }
        Ok(())
    }

    /// Calls the model with the full transcript, appends the response as `assistant`, and
    /// records the resulting usage.
    pub async fn generate(&mut self) -> Result<String, ConversationError> {
        let request = ChatRequest::new(self.model.clone(), self.messages.clone(), self.temperature)
            .with_cache_prefix(CACHE_PREFIX_LEN.min(self.messages.len()));
        let response = self.client.chat(request).await?;

        self.messages.push(Message::assistant(response.text.clone()));
        self.record_usage(&response.usage);

        Ok(response.text)
    }

    fn record_usage(&mut self, usage: &vulnpov_core::LlmUsage) {
        self.accumulated_cost += usage.cost_usd;
        self.accumulated_elapsed += usage.elapsed;
        self.sink.record_llm_call(LlmCallRecord {
            input_tokens: usage.input_tokens,
            cached_tokens: usage.cached_tokens,
            output_tokens: usage.output_tokens,
            cost_usd: usage.cost_usd,
            elapsed: usage.elapsed,
            accumulated_cost: self.accumulated_cost,
            accumulated_elapsed: self.accumulated_elapsed,
        });
    }

    /// Compresses the transcript into a fixed-section summary, preserving the original system
    /// and first user message. Idempotent modulo the LLM's summary content.
    async fn condense(&mut self) -> Result<(), ConversationError> {
        if self.messages.len() < 2
            || self.messages[0].role != Role::System
            || self.messages[1].role != Role::User
        {
            return Err(ConversationError::MalformedHistory);
        }

        let total_tokens: usize = self.messages.iter().map(Message::estimated_tokens).sum();
        info!(
            messages = self.messages.len(),
            total_tokens, "condensing conversation to reduce token count"
        );

        let mut to_condense: Vec<Message> = Vec::new();
        let mut retain_tail: Vec<Message> = Vec::new();
        for (i, message) in self.messages.iter().enumerate() {
            to_condense.push(message.clone());
            let bucket_tokens: usize = to_condense.iter().map(Message::estimated_tokens).sum();
            if bucket_tokens as f64 >= total_tokens as f64 * FRACTION_TO_CONDENSE {
                to_condense.pop();
                retain_tail = self.messages[i..].to_vec();
                break;
            }
        }

        let mut prompt = String::from(CONDENSATION_INSTRUCTIONS);
        prompt.push('\n');
        for (i, message) in to_condense.iter().enumerate() {
            prompt.push_str(&format!(
                "<EVENT id={i} role=({})>\n{}\n</EVENT>\n",
                message.role.as_str().to_uppercase(),
                message.content
            ));
        }
        prompt.push_str(CONDENSATION_CLOSING);

        let request = ChatRequest::new(
            self.model.clone(),
            vec![Message::system(CONDENSATION_SYSTEM_PROMPT), Message::user(prompt)],
            0.0,
        );
        let response = self.client.chat(request).await?;
        self.record_usage(&response.usage);

        let summary = response.text;
        let mut new_messages = self.messages[..2].to_vec();
        new_messages.push(Message::user(TRUNCATION_NOTICE));
        new_messages.push(Message::assistant(summary));
        new_messages.extend(retain_tail.iter().cloned());

        warn!(
            retained_tail = retain_tail.len(),
            "retained first 2 messages and condensed the rest"
        );
        self.messages = new_messages;
        Ok(())
    }
}
