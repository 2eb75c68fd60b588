use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("failed to spawn docker: {0}")]
    Spawn(#[source] vulnpov_process::ProcessError),
}
