use std::fmt;

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStatus {
    Success,
    Failure,
}

impl fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "Success"),
            Self::Failure => write!(f, "Failure"),
        }
    }
}

/// `{status, output}` returned by every Sandbox Tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub status: ToolStatus,
    pub output: String,
}

impl ToolResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::Success,
            output: output.into(),
        }
    }

    pub fn failure(output: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::Failure,
            output: output.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, ToolStatus::Success)
    }
}

/// A JSON object extracted from `<TOOL>...</TOOL>`: `name` plus tool-specific fields.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub name: String,
    pub fields: serde_json::Map<String, Value>,
}

impl ToolInvocation {
    /// Validates that every key in `fields` (besides `name`, which has already been consumed)
    /// is one of `allowed`, and that every entry in `required` is present. Mirrors the
    /// presence-check-then-reject-unknown-fields order every Sandbox Tool follows.
    pub fn validate_schema(&self, required: &[&str], allowed: &[&str]) -> Result<(), String> {
        for field in required {
            if !self.fields.contains_key(*field) {
                return Err(format!("Missing '{field}' field"));
            }
        }
        for key in self.fields.keys() {
            if key != "name" && !allowed.contains(&key.as_str()) {
                return Err(format!("Unknown field '{key}'"));
            }
        }
        Ok(())
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    pub fn get_u64(&self, field: &str) -> Option<u64> {
        self.fields.get(field).and_then(Value::as_u64)
    }
}
