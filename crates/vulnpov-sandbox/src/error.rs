use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SandboxError {
    #[error("Tool with name '{0}' is already registered.")]
    DuplicateTool(String),
}
