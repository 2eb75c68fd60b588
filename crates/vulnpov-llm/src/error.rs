use thiserror::Error;

/// LLM transport errors, split along the retryable/non-retryable line the conversation's
/// `generate()` call relies on: rate limit / timeout / connection / 5xx get exponential
/// backoff; anything else fails the run immediately.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("rate limited by provider")]
    RateLimited,
    #[error("request to provider timed out")]
    Timeout,
    #[error("connection to provider failed: {0}")]
    Connection(String),
    #[error("provider returned server error (status {0})")]
    ServerError(u16),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("authentication with provider failed")]
    Unauthorized,
    #[error("provider endpoint not found (status 404)")]
    NotFound,
    #[error("request could not be processed (status 422): {0}")]
    Unprocessable(String),
    #[error("retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },
    /// Anything the classifier above does not recognize is surfaced verbatim rather than
    /// coerced into a more specific-looking variant that would misrepresent it.
    #[error("provider error: {0}")]
    Provider(String),
}

impl LlmError {
    /// Whether the conversation's retry loop should back off and retry, or fail the run
    /// immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::Timeout | Self::Connection(_) | Self::ServerError(_)
        )
    }

    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            429 => Self::RateLimited,
            401 | 403 => Self::Unauthorized,
            404 => Self::NotFound,
            400 => Self::BadRequest(body.to_string()),
            422 => Self::Unprocessable(body.to_string()),
            500..=599 => Self::ServerError(status),
            _ => Self::Provider(format!("unexpected status {status}: {body}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classes() {
        assert!(LlmError::RateLimited.is_retryable());
        assert!(LlmError::Timeout.is_retryable());
        assert!(LlmError::Connection("x".into()).is_retryable());
        assert!(LlmError::ServerError(503).is_retryable());
    }

    #[test]
    fn non_retryable_classes() {
        assert!(!LlmError::BadRequest("x".into()).is_retryable());
        assert!(!LlmError::Unauthorized.is_retryable());
        assert!(!LlmError::NotFound.is_retryable());
        assert!(!LlmError::Unprocessable("x".into()).is_retryable());
        assert!(!LlmError::Provider("x".into()).is_retryable());
    }

    #[test]
    fn from_status_maps_known_codes() {
        assert!(matches!(LlmError::from_status(429, ""), LlmError::RateLimited));
        assert!(matches!(LlmError::from_status(401, ""), LlmError::Unauthorized));
        assert!(matches!(LlmError::from_status(403, ""), LlmError::Unauthorized));
        assert!(matches!(LlmError::from_status(404, ""), LlmError::NotFound));
        assert!(matches!(LlmError::from_status(400, "bad"), LlmError::BadRequest(m) if m == "bad"));
        assert!(matches!(LlmError::from_status(422, "bad"), LlmError::Unprocessable(m) if m == "bad"));
        assert!(matches!(LlmError::from_status(502, ""), LlmError::ServerError(502)));
    }

    #[test]
    fn from_status_falls_back_to_provider_for_unknown_codes() {
        assert!(matches!(LlmError::from_status(418, ""), LlmError::Provider(_)));
    }

    #[test]
    fn retries_exhausted_display() {
        let err = LlmError::RetriesExhausted {
            attempts: 5,
            last: "timeout".to_string(),
        };
        assert_eq!(err.to_string(), "retries exhausted after 5 attempts: timeout");
    }
}
