use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use vulnpov_core::DatasetFamily;

/// The per-run budget/timeout/model knobs the Engine reads before `setup()`. Defaults are
/// grounded in the original system's actual call sites (see DESIGN.md), not in any
/// class-level default that is always overridden in practice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub budget_usd: f64,
    pub timeout_s: u64,
    pub max_turns: u32,
    pub model: String,
    pub use_patch: bool,
    pub no_flow: bool,
    pub no_branch: bool,
    pub dataset_family: DatasetFamily,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            budget_usd: 5.0,
            timeout_s: 2400,
            max_turns: 100,
            model: "claude-3-7-sonnet".to_string(),
            use_patch: false,
            no_flow: false,
            no_branch: false,
            dataset_family: DatasetFamily::default(),
        }
    }
}

impl RunConfig {
    /// Loads an optional TOML file, falling back to defaults entirely when the path does not
    /// exist (a missing config file is not an error: CLI flags alone are a valid configuration).
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Fails fast on a config that would only surface as confusing behavior deep inside a run:
    /// a non-positive budget never lets the first message through, a zero timeout or turn cap
    /// never lets a phase do anything at all. Deliberately does not reject an unrecognized
    /// `model` string — `context_window_for`/`pricing_for` already fall back to a conservative
    /// default for one, the same leniency the rest of the LLM subsystem extends to models it
    /// doesn't specifically know about.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.budget_usd > 0.0, "budget_usd must be positive, got {}", self.budget_usd);
        anyhow::ensure!(self.timeout_s > 0, "timeout_s must be positive, got 0");
        anyhow::ensure!(self.max_turns > 0, "max_turns must be positive, got 0");
        Ok(())
    }
}
