use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};
use vulnpov_conversation::{ActionSink, LlmCallRecord, ToolCallRecord};
use vulnpov_core::{PhaseKind, PhaseOutcome};

use crate::error::EngineError;

const OUTPUT_FILE: &str = "output.txt";
const LOG_FILE: &str = "log.json";

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionEvent {
    LlmCall {
        input_tokens: u64,
        cached_tokens: u64,
        output_tokens: u64,
        cost_usd: f64,
        elapsed_s: f64,
        accumulated_cost: f64,
        accumulated_time_s: f64,
    },
    ToolCall {
        name: String,
        elapsed_s: f64,
        accumulated_cost: f64,
        accumulated_time_s: f64,
    },
    Validation {
        elapsed_s: f64,
        accumulated_cost: f64,
        accumulated_time_s: f64,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultRow {
    pub phase: String,
    pub outcome: String,
}

/// The persisted document: `{date, args, actions, results}`, rewritten to disk after every
/// mutation.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub date: String,
    pub args: serde_json::Value,
    pub actions: Vec<ActionEvent>,
    pub results: Vec<ResultRow>,
}

/// Extra bookkeeping an `EngineLog` implementation exposes beyond `ActionSink`: validation
/// events (not routed through a `Conversation`), phase results, status/output lines, and the
/// running cost/time totals the Engine consults. `Logger` and `NullLogger` both implement it so
/// the Engine can be run with or without on-disk persistence.
pub trait EngineLog: ActionSink {
    fn log_validation(&self, elapsed: Duration);
    fn log_result(&self, phase: PhaseKind, outcome: PhaseOutcome);
    fn log_status(&self, message: &str);
    fn log_failure(&self, message: &str);
    fn log_success(&self, message: &str);
    fn log_output(&self, message: &str);
    fn cost_and_time(&self) -> (f64, Duration);
}

struct LoggerState {
    record: LogRecord,
    total_cost: f64,
    total_elapsed: Duration,
}

/// Persists the Log Record to `<output_dir>/log.json` (full rewrite on every mutation) and
/// mirrors status lines to `<output_dir>/output.txt`, matching the original run logger: every
/// action the run takes is durable on disk immediately, not just at the end.
pub struct Logger {
    output_dir: PathBuf,
    verbose: bool,
    state: Mutex<LoggerState>,
}

impl Logger {
    pub fn new(output_dir: PathBuf, args: serde_json::Value, verbose: bool, date: String) -> Result<Self, EngineError> {
        std::fs::create_dir_all(&output_dir).map_err(|source| EngineError::LogPersist {
            path: output_dir.display().to_string(),
            source,
        })?;
        std::fs::write(output_dir.join(OUTPUT_FILE), "").map_err(|source| EngineError::LogPersist {
            path: output_dir.join(OUTPUT_FILE).display().to_string(),
            source,
        })?;

        let logger = Self {
            output_dir,
            verbose,
            state: Mutex::new(LoggerState {
                record: LogRecord {
                    date,
                    args,
                    actions: Vec::new(),
                    results: Vec::new(),
                },
                total_cost: 0.0,
                total_elapsed: Duration::ZERO,
            }),
        };
        logger.persist()?;
        Ok(logger)
    }

    fn persist(&self) -> Result<(), EngineError> {
        let state = self.state.lock().unwrap();
        let path = self.output_dir.join(LOG_FILE);
        let json = serde_json::to_vec_pretty(&state.record).expect("LogRecord always serializes");
        std::fs::write(&path, json).map_err(|source| EngineError::LogPersist {
            path: path.display().to_string(),
            source,
        })
    }

    fn append_line(&self, path: &Path, line: &str) {
        use std::io::Write;
        let mut file = match std::fs::OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => file,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to open output file for append");
                return;
            }
        };
        if let Err(err) = writeln!(file, "{line}") {
            warn!(path = %path.display(), error = %err, "failed to append output line");
        }
    }
}

impl ActionSink for Logger {
    fn record_llm_call(&self, record: LlmCallRecord) {
        let event = {
            let mut state = self.state.lock().unwrap();
            state.total_cost += record.cost_usd;
            state.total_elapsed += record.elapsed;
            let event = ActionEvent::LlmCall {
                input_tokens: record.input_tokens,
                cached_tokens: record.cached_tokens,
                output_tokens: record.output_tokens,
                cost_usd: record.cost_usd,
                elapsed_s: record.elapsed.as_secs_f64(),
                accumulated_cost: state.total_cost,
                accumulated_time_s: state.total_elapsed.as_secs_f64(),
            };
            state.record.actions.push(event.clone());
            event
        };
        info!(?event, "llm_call");
        let _ = self.persist();
    }

    fn record_tool_call(&self, record: ToolCallRecord) {
        let event = {
            let mut state = self.state.lock().unwrap();
            state.total_elapsed += record.elapsed;
            let event = ActionEvent::ToolCall {
                name: record.tool_name,
                elapsed_s: record.elapsed.as_secs_f64(),
                accumulated_cost: state.total_cost,
                accumulated_time_s: state.total_elapsed.as_secs_f64(),
            };
            state.record.actions.push(event.clone());
            event
        };
        info!(?event, "tool_call");
        let _ = self.persist();
    }
}

impl EngineLog for Logger {
    fn log_validation(&self, elapsed: Duration) {
        let event = {
            let mut state = self.state.lock().unwrap();
            state.total_elapsed += elapsed;
            let event = ActionEvent::Validation {
                elapsed_s: elapsed.as_secs_f64(),
                accumulated_cost: state.total_cost,
                accumulated_time_s: state.total_elapsed.as_secs_f64(),
            };
            state.record.actions.push(event.clone());
            event
        };
        info!(?event, "validation");
        let _ = self.persist();
    }

    fn log_result(&self, phase: PhaseKind, outcome: PhaseOutcome) {
        {
            let mut state = self.state.lock().unwrap();
            state.record.results.push(ResultRow {
                phase: phase.to_string(),
                outcome: outcome.to_string(),
            });
        }
        info!(phase = %phase, outcome = %outcome, "phase result");
        let _ = self.persist();
    }

    fn log_status(&self, message: &str) {
        info!("{message}");
        self.append_line(&self.output_dir.join(OUTPUT_FILE), message);
    }

    fn log_failure(&self, message: &str) {
        warn!("{message}");
        self.append_line(&self.output_dir.join(OUTPUT_FILE), message);
    }

    fn log_success(&self, message: &str) {
        info!("{message}");
        self.append_line(&self.output_dir.join(OUTPUT_FILE), message);
    }

    fn log_output(&self, message: &str) {
        if self.verbose {
            self.append_line(&self.output_dir.join(OUTPUT_FILE), message);
        }
    }

    fn cost_and_time(&self) -> (f64, Duration) {
        let state = self.state.lock().unwrap();
        (state.total_cost, state.total_elapsed)
    }
}

/// A no-op `EngineLog` for tests and dry runs: every event is discarded, nothing touches disk.
#[derive(Debug, Default)]
pub struct NullLogger;

impl ActionSink for NullLogger {
    fn record_llm_call(&self, _record: LlmCallRecord) {}
    fn record_tool_call(&self, _record: ToolCallRecord) {}
}

impl EngineLog for NullLogger {
    fn log_validation(&self, _elapsed: Duration) {}
    fn log_result(&self, _phase: PhaseKind, _outcome: PhaseOutcome) {}
    fn log_status(&self, _message: &str) {}
    fn log_failure(&self, _message: &str) {}
    fn log_success(&self, _message: &str) {}
    fn log_output(&self, _message: &str) {}
    fn cost_and_time(&self) -> (f64, Duration) {
        (0.0, Duration::ZERO)
    }
}
