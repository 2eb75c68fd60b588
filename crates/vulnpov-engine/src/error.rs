use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("advisory's CWE identifiers {0:?} map to no class this system supports")]
    UnsupportedAdvisory(Vec<String>),
    #[error("docker image cleanup failed during setup: {0}")]
    Setup(#[source] vulnpov_process::ProcessError),
    #[error(transparent)]
    Conversation(#[from] vulnpov_conversation::ConversationError),
    #[error("failed to persist log record to {path}: {source}")]
    LogPersist {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
