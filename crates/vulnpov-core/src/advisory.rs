use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::cwe::CweClass;

/// Read-only per-project vulnerability record. Produced by (out-of-scope) dataset
/// preparation and consumed verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    pub cwe_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub details: String,
}

impl Advisory {
    pub fn new(cwe_ids: Vec<String>, summary: Option<String>, details: String) -> Self {
        Self {
            cwe_ids,
            summary,
            details,
        }
    }

    /// The CWE class this system should target: the first advisory entry that maps to a
    /// known instruction. `None` means the run must be rejected before any LLM call.
    pub fn target_class(&self) -> Option<CweClass> {
        CweClass::first_known(&self.cwe_ids)
    }

    pub fn is_supported(&self) -> bool {
        self.target_class().is_some()
    }
}

/// Distinguishes corpora whose container build context and Dockerfile constraints differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[clap(rename_all = "kebab-case")]
pub enum DatasetFamily {
    #[default]
    Generic,
    CweBenchJava,
}

impl DatasetFamily {
    /// The container build context, relative to the workspace root.
    pub fn build_context(&self) -> &'static str {
        match self {
            Self::Generic => ".",
            Self::CweBenchJava => "../..",
        }
    }

    /// Extra prose woven into TestGen's Docker instructions for this family.
    pub fn docker_instruction_note(&self) -> &'static str {
        match self {
            Self::Generic => "",
            Self::CweBenchJava => {
                "Do not modify anything above the marked line in Dockerfile.vuln."
            }
        }
    }
}
