//! Per-run configuration: defaults, an optional TOML overlay, and CLI-flag overrides, merged
//! and validated before the Engine ever starts.

pub mod config;
pub mod overrides;
pub mod validate;

pub use config::RunConfig;
pub use overrides::ConfigOverrides;
pub use validate::validate_config;
