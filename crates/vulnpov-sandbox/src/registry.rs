use std::time::{Duration, Instant};

use serde_json::Value;
use vulnpov_core::{ToolInvocation, ToolResult};

use crate::error::SandboxError;
use crate::tools::{SandboxTool, ToolContext};

/// Result of one `dispatch()` call: the tool's own result, plus the bookkeeping the Engine's
/// action log needs (name, elapsed time) without this crate depending on the logging format.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub tool_name: String,
    pub result: ToolResult,
    pub elapsed: Duration,
}

/// Catalogs the tools available to one phase and dispatches `<TOOL>...</TOOL>` invocations
/// against them.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<SandboxTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    pub fn register(&mut self, tool: SandboxTool) -> Result<(), SandboxError> {
        if self.tools.iter().any(|t| t.name() == tool.name()) {
            return Err(SandboxError::DuplicateTool(tool.name().to_string()));
        }
        self.tools.push(tool);
        Ok(())
    }

    pub fn registered(&self) -> &[SandboxTool] {
        &self.tools
    }

    pub fn has_tool_invocation(llm_output: &str) -> bool {
        llm_output.contains("<TOOL>") && llm_output.contains("</TOOL>")
    }

    /// Extracts the first `<TOOL>...</TOOL>` pair, parses it as JSON, and runs the matching
    /// tool. Never returns a Rust `Err`: every failure mode (malformed JSON, missing name,
    /// unregistered name, schema violation) is reported as a `Failure` `ToolResult`, exactly as
    /// the model sees it.
    #[tracing::instrument(skip(self, llm_output, ctx))]
    pub async fn dispatch(&self, llm_output: &str, ctx: &ToolContext) -> DispatchOutcome {
        let invocation_text = match extract_invocation(llm_output) {
            Some(text) => text,
            None => {
                return DispatchOutcome {
                    tool_name: String::new(),
                    result: ToolResult::failure("No tool invocation found"),
                    elapsed: Duration::ZERO,
                };
            }
        };

        let parsed: Value = match serde_json::from_str(&invocation_text) {
            Ok(value) => value,
            Err(_) => {
                return DispatchOutcome {
                    tool_name: String::new(),
                    result: ToolResult::failure("Invalid JSON"),
                    elapsed: Duration::ZERO,
                };
            }
        };

        let Value::Object(fields) = parsed else {
            return DispatchOutcome {
                tool_name: String::new(),
                result: ToolResult::failure("Invalid JSON"),
                elapsed: Duration::ZERO,
            };
        };

        let tool_name = match fields.get("name").and_then(Value::as_str) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                return DispatchOutcome {
                    tool_name: String::new(),
                    result: ToolResult::failure("Missing 'name' field"),
                    elapsed: Duration::ZERO,
                };
            }
        };

        let Some(tool) = self.tools.iter().find(|t| t.name() == tool_name) else {
            return DispatchOutcome {
                tool_name: tool_name.clone(),
                result: ToolResult::failure(format!("Unknown tool: {tool_name}")),
                elapsed: Duration::ZERO,
            };
        };

        let invocation = ToolInvocation {
            name: tool_name.clone(),
            fields,
        };

        let started = Instant::now();
        let result = tool.execute(&invocation, ctx).await;
        DispatchOutcome {
            tool_name,
            result,
            elapsed: started.elapsed(),
        }
    }
}

/// Finds the first `<TOOL>` and the first `</TOOL>` after it and returns the text between them,
/// trimmed. Mirrors `llm_output.index(...)` semantics: only the first pair of delimiters is
/// considered, even if more appear later in the turn.
fn extract_invocation(llm_output: &str) -> Option<String> {
    let start = llm_output.find("<TOOL>")? + "<TOOL>".len();
    let end = llm_output[start..].find("</TOOL>")? + start;
    Some(llm_output[start..end].trim().to_string())
}
