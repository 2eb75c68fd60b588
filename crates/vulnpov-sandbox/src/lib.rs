//! The Sandbox Tools and the registry/dispatcher that exposes them to a phase's reason-act
//! loop: filesystem inspection and mutation, process search, and container build/run.

pub mod error;
pub mod registry;
pub mod tools;

pub use error::SandboxError;
pub use registry::{DispatchOutcome, ToolRegistry};
pub use tools::{FULL_SET, READ_ONLY_SET, SandboxTool, ToolContext};
