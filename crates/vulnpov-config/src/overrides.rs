use vulnpov_core::DatasetFamily;

use crate::config::RunConfig;

/// CLI-flag overrides layered on top of a loaded `RunConfig`. Every field is optional: `None`
/// means "keep whatever the config file (or default) said."
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub budget_usd: Option<f64>,
    pub timeout_s: Option<u64>,
    pub max_turns: Option<u32>,
    pub model: Option<String>,
    pub use_patch: Option<bool>,
    pub no_flow: Option<bool>,
    pub no_branch: Option<bool>,
    pub dataset_family: Option<DatasetFamily>,
}

impl ConfigOverrides {
    pub fn apply(self, mut config: RunConfig) -> RunConfig {
        if let Some(v) = self.budget_usd {
            config.budget_usd = v;
        }
        if let Some(v) = self.timeout_s {
            config.timeout_s = v;
        }
        if let Some(v) = self.max_turns {
            config.max_turns = v;
        }
        if let Some(v) = self.model {
            config.model = v;
        }
        if let Some(v) = self.use_patch {
            config.use_patch = v;
        }
        if let Some(v) = self.no_flow {
            config.no_flow = v;
        }
        if let Some(v) = self.no_branch {
            config.no_branch = v;
        }
        if let Some(v) = self.dataset_family {
            config.dataset_family = v;
        }
        config
    }
}
