use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStatus {
    Correct,
    Incorrect,
    Failed,
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Correct => write!(f, "Correct"),
            Self::Incorrect => write!(f, "Incorrect"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// `{status, error}` returned by the Validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFeedback {
    pub status: ValidationStatus,
    pub error: Option<String>,
}

impl ValidationFeedback {
    pub fn correct() -> Self {
        Self {
            status: ValidationStatus::Correct,
            error: None,
        }
    }

    pub fn incorrect(error: impl Into<String>) -> Self {
        Self {
            status: ValidationStatus::Incorrect,
            error: Some(error.into()),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: ValidationStatus::Failed,
            error: Some(error.into()),
        }
    }

    pub fn is_correct(&self) -> bool {
        matches!(self.status, ValidationStatus::Correct)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, ValidationStatus::Failed)
    }
}

/// One row in the Engine's ordered result log: which phase, and its terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    FlowReasoning,
    BranchReasoning,
    TestGen,
    Validation,
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::FlowReasoning => "flow_reasoning",
            Self::BranchReasoning => "branch_reasoning",
            Self::TestGen => "test_gen",
            Self::Validation => "validation",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOutcome {
    Success,
    Failure,
    Incorrect,
}

impl fmt::Display for PhaseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Incorrect => "incorrect",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseResult {
    pub phase: PhaseKind,
    pub outcome: PhaseOutcome,
}

impl PhaseResult {
    pub fn new(phase: PhaseKind, outcome: PhaseOutcome) -> Self {
        Self { phase, outcome }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_feedback_constructors() {
        assert!(ValidationFeedback::correct().is_correct());
        assert!(!ValidationFeedback::incorrect("exit 1").is_correct());
        assert!(ValidationFeedback::failed("docker daemon down").is_failed());
    }

    #[test]
    fn display_strings() {
        assert_eq!(ValidationStatus::Correct.to_string(), "Correct");
        assert_eq!(PhaseKind::FlowReasoning.to_string(), "flow_reasoning");
        assert_eq!(PhaseOutcome::Incorrect.to_string(), "incorrect");
    }

    #[test]
    fn phase_result_carries_both_fields() {
        let row = PhaseResult::new(PhaseKind::Validation, PhaseOutcome::Success);
        assert_eq!(row.phase, PhaseKind::Validation);
        assert_eq!(row.outcome, PhaseOutcome::Success);
    }
}
