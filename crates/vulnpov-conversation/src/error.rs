use thiserror::Error;
use vulnpov_llm::LlmError;

#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("Role 'assistant' is reserved for model responses.")]
    AssistantRoleReserved,
    #[error("Exceeded budget of ${budget:.2}. Current cost: ${cost:.2}")]
    BudgetExceeded { budget: f64, cost: f64 },
    #[error("Exceeded timeout of {timeout_s} seconds. Current time: {elapsed_s} seconds")]
    TimeoutExceeded { timeout_s: u64, elapsed_s: u64 },
    #[error("condensation invariant violated: first two messages must be system, user")]
    MalformedHistory,
    #[error(transparent)]
    Llm(#[from] LlmError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_exceeded_message() {
        let err = ConversationError::BudgetExceeded {
            budget: 5.0,
            cost: 5.25,
        };
        assert_eq!(
            err.to_string(),
            "Exceeded budget of $5.00. Current cost: $5.25"
        );
    }
}
