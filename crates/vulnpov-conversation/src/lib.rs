//! The message transcript shared by every phase: budget/timeout enforcement on append,
//! LLM-backed generation, and condensation once the transcript grows too large.

pub mod conversation;
pub mod error;
pub mod sink;

pub use conversation::Conversation;
pub use error::ConversationError;
pub use sink::{ActionSink, LlmCallRecord, NullSink};
