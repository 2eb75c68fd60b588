use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BranchType {
    IfElse,
    TryExcept,
    Switch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchStep {
    #[serde(rename = "type")]
    pub kind: BranchType,
    pub code: String,
    pub file: String,
    pub outcome: String,
}

/// Extracted from `<SEQUENCE>…</SEQUENCE>`. Kept as opaque text downstream, same as `Flow`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchSequence {
    pub raw: String,
    pub steps: Vec<BranchStep>,
}

impl BranchSequence {
    pub fn opaque(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            steps: Vec::new(),
        }
    }
}

/// Extracted from `<CONDITIONS>…</CONDITIONS>`: a numbered list of natural-language predicates
/// constraining external input. Kept as the raw text; no further structure is imposed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conditions {
    pub raw: String,
}

impl Conditions {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }
}
