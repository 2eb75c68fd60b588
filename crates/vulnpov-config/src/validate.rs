use anyhow::{Result, bail};
use vulnpov_core::{Advisory, CweClass};

use crate::config::RunConfig;

/// Validates the merged `RunConfig` and the advisory it will run against, before any LLM call
/// is made. A project whose advisory CWEs intersect none of the known classes is rejected
/// here, per the §1 user/input-error category.
pub fn validate_config(config: &RunConfig, advisory: &Advisory) -> Result<()> {
    if config.budget_usd <= 0.0 {
        bail!("budget_usd must be > 0 (got {})", config.budget_usd);
    }
    if config.timeout_s == 0 {
        bail!("timeout_s must be > 0 (got 0)");
    }
    if config.max_turns == 0 {
        bail!("max_turns must be > 0 (got 0)");
    }
    if config.model.trim().is_empty() {
        bail!("model must not be empty");
    }
    if CweClass::first_known(&advisory.cwe_ids).is_none() {
        bail!(
            "advisory CWEs {:?} do not include any of the supported classes (CWE-22/78/79/94)",
            advisory.cwe_ids
        );
    }
    Ok(())
}
