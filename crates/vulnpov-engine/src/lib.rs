//! Orchestrates one project through the full pipeline — workspace setup, Flow/Branch/TestGen
//! phases, and the validate/repair loop — and persists a Log Record of everything it did.

pub mod engine;
pub mod error;
pub mod logger;

pub use engine::{Engine, RunSummary};
pub use error::EngineError;
pub use logger::{ActionEvent, EngineLog, LogRecord, Logger, NullLogger};
