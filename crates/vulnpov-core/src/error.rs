use thiserror::Error;

/// Errors belonging to the shared data model itself (malformed extracted structures), as
/// opposed to the component-specific error enums each downstream crate defines.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("flow has no program points")]
    EmptyFlow,
    #[error("malformed flow: {0}")]
    MalformedFlow(String),
}
