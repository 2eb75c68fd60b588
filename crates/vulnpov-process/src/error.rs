use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to capture output of '{command}': {source}")]
    Capture {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("tool '{0}' is not installed or not in PATH")]
    ToolNotInstalled(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_installed_display() {
        let err = ProcessError::ToolNotInstalled("docker".to_string());
        assert_eq!(err.to_string(), "tool 'docker' is not installed or not in PATH");
    }
}
