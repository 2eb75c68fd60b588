use std::time::Duration;

use tokio::process::Command;
use vulnpov_core::{ToolInvocation, ToolResult};
use vulnpov_process::{run_with_timeout, truncate_head};

const MAX_CHARS: usize = 2000;
const TIMEOUT: Duration = Duration::from_secs(5);

pub async fn execute(invocation: &ToolInvocation) -> ToolResult {
    if let Err(msg) = invocation.validate_schema(&["query", "path"], &["query", "path"]) {
        return ToolResult::failure(msg);
    }
    let query = invocation.get_str("query").unwrap();
    let path = invocation.get_str("path").unwrap();

    if tokio::fs::metadata(path).await.is_err() {
        return ToolResult::failure(format!("Path {path} does not exist"));
    }

    let mut cmd = Command::new("grep");
    cmd.args(["-nr", "-F", "--exclude=.?*", query, path]);

    let exec = match run_with_timeout(cmd, TIMEOUT).await {
        Ok(exec) => exec,
        Err(err) => return ToolResult::failure(truncate_head(&err.to_string(), MAX_CHARS)),
    };

    if exec.exit_code == 0 {
        if exec.stdout.is_empty() {
            return ToolResult::success("No results found");
        }
        return ToolResult::success(truncate_head(&exec.stdout, MAX_CHARS));
    }

    if exec.stdout.is_empty() && exec.stderr.is_empty() {
        return ToolResult::success("No results found");
    }

    let combined = format!("STDOUT:\n{}\nSTDERR:\n{}", exec.stdout, exec.stderr);
    ToolResult::failure(truncate_head(&combined, MAX_CHARS))
}
