use thiserror::Error;
use vulnpov_conversation::ConversationError;

/// A phase failure always terminates that phase's own reason-act loop; the Engine records it as
/// a `failure` row and the run ends there — Flow, Branch, and TestGen failures all abort the run
/// outright, with no phase after the failed one ever running.
#[derive(Debug, Error)]
pub enum PhaseError {
    #[error("{phase} produced no assistant response to extract a terminator from")]
    NoAssistantResponse { phase: &'static str },
    #[error("{phase} response is missing the {tag} terminator")]
    MissingTerminator { phase: &'static str, tag: &'static str },
    #[error(transparent)]
    Conversation(#[from] ConversationError),
}
