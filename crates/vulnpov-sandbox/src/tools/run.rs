use std::time::Duration;

use tokio::process::Command;
use vulnpov_core::{ToolInvocation, ToolResult, project_image_tag};
use vulnpov_process::{run_with_timeout, truncate_tail};

use super::ToolContext;

const MAX_CHARS: usize = 10_000;
const BUILD_TIMEOUT: Duration = Duration::from_secs(300);
const RUN_TIMEOUT: Duration = Duration::from_secs(200);

const CAUTION_MSG: &str = "Carefully analyze this output for errors or messages that can help you debug your test.\n\
If it is not the behavior you expected:\n\
1. Step back and reflect on 5-7 different possible sources of the problem\n\
2. Assess the likelihood of each possible cause\n\
3. Methodically address the most likely causes, starting with the highest probability\n\
4. If necessary, add print statements to the source code to debug the issue\n\
\n\
If you are having issues with Docker \"refsums\", remember that you don't need to add any new COPY commands in the Dockerfile.\n\
If your Docker build is timing out, try using the Reset tool to reset the working directory and start from scratch.\n\
\n\
Lastly, remember that your test should actually run the vulnerable code in the project.\n\
- It should NOT read the source code to check for the presence of a vulnerability.\n\
- It should NOT \"simulate\" the vulnerability by running some separate code that does not use the project.\n";

pub async fn execute(invocation: &ToolInvocation, ctx: &ToolContext) -> ToolResult {
    if let Err(msg) = invocation.validate_schema(&[], &[]) {
        return ToolResult::failure(msg);
    }

    let tag = project_image_tag(&ctx.project_slug);
    let build_context = ctx.dataset_family.build_context();

    let mut build_cmd = Command::new("docker");
    build_cmd
        .args(["build", "-f", "./Dockerfile.vuln", "-t", &tag, build_context])
        .current_dir(&ctx.workdir);

    let build_result = match run_with_timeout(build_cmd, BUILD_TIMEOUT).await {
        Ok(result) => result,
        Err(err) => return ToolResult::failure(err.to_string()),
    };

    if !build_result.succeeded() {
        let combined = format!(
            "STDOUT:\n{}\nSTDERR:\n{}{}",
            build_result.stdout,
            build_result.stderr,
            if build_result.timed_out { "\nTimeout" } else { "" }
        );
        return ToolResult::success(format!(
            "Build failed: {}\n{CAUTION_MSG}",
            truncate_tail(&combined, MAX_CHARS)
        ));
    }

    let mut run_cmd = Command::new("docker");
    run_cmd
        .args(["run", "--rm", "--network", "none", &tag])
        .current_dir(&ctx.workdir);

    let run_result = match run_with_timeout(run_cmd, RUN_TIMEOUT).await {
        Ok(result) => result,
        Err(err) => return ToolResult::failure(err.to_string()),
    };

    if run_result.succeeded() {
        ToolResult::success(format!(
            "Run succeeded. STDOUT:\n{}\n{CAUTION_MSG}",
            truncate_tail(&run_result.stdout, MAX_CHARS)
        ))
    } else {
        let combined = format!(
            "STDOUT:\n{}\nSTDERR:\n{}{}",
            run_result.stdout,
            run_result.stderr,
            if run_result.timed_out { "\nTimeout" } else { "" }
        );
        ToolResult::success(format!(
            "Run exited with non-zero code.\n{}\n{CAUTION_MSG}",
            truncate_tail(&combined, MAX_CHARS)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vulnpov_core::DatasetFamily;

    fn invocation(fields: serde_json::Value) -> ToolInvocation {
        let serde_json::Value::Object(map) = fields else {
            panic!("expected object")
        };
        ToolInvocation {
            name: "run".to_string(),
            fields: map,
        }
    }

    #[tokio::test]
    async fn rejects_unknown_field() {
        let ctx = ToolContext {
            workdir: std::env::temp_dir(),
            project_slug: "proj".to_string(),
            dataset_family: DatasetFamily::Generic,
        };
        let result = execute(&invocation(json!({"name": "run", "bogus": 1})), &ctx).await;
        assert!(!result.is_success());
    }
}
