use std::path::Path;
use std::time::Duration;

use tokio::process::Command;
use vulnpov_core::{ValidationFeedback, project_image_tag};
use vulnpov_process::{ExecutionResult, ProcessError, run_with_timeout};

use crate::error::ValidatorError;

const BUILD_TIMEOUT: Duration = Duration::from_secs(300);
const RUN_TIMEOUT: Duration = Duration::from_secs(200);

/// Builds and runs the project's `Dockerfile.vuln` image and categorizes the outcome. Unlike the
/// `run` Sandbox Tool, applies no "dual truth" leniency: the exit code is reported as-is.
/// Stateless across calls; each call re-reads the workspace from scratch.
pub struct Validator;

impl Validator {
    #[tracing::instrument(skip(workdir))]
    pub async fn validate(workdir: &Path, project_slug: &str, build_context: &str) -> ValidationFeedback {
        let tag = project_image_tag(project_slug);

        let build = match Self::build(workdir, &tag, build_context).await {
            Ok(result) => result,
            Err(err) => return ValidationFeedback::failed(err.to_string()),
        };
        if !build.succeeded() {
            return ValidationFeedback::failed(format!(
                "docker build failed:\nSTDOUT:\n{}\nSTDERR:\n{}{}",
                build.stdout,
                build.stderr,
                if build.timed_out { "\n(build timed out)" } else { "" }
            ));
        }

        let run = match Self::run(workdir, &tag).await {
            Ok(result) => result,
            Err(err) => return ValidationFeedback::failed(err.to_string()),
        };
        if run.timed_out {
            return ValidationFeedback::failed(format!(
                "docker run timed out:\nSTDOUT:\n{}\nSTDERR:\n{}",
                run.stdout, run.stderr
            ));
        }
        if run.exit_code == 0 {
            ValidationFeedback::correct()
        } else {
            ValidationFeedback::incorrect(format!(
                "STDOUT:\n{}\nSTDERR:\n{}",
                run.stdout, run.stderr
            ))
        }
    }

    async fn build(workdir: &Path, tag: &str, build_context: &str) -> Result<ExecutionResult, ValidatorError> {
        let mut cmd = Command::new("docker");
        cmd.args(["build", "-f", "./Dockerfile.vuln", "-t", tag, build_context])
            .current_dir(workdir);
        run_with_timeout(cmd, BUILD_TIMEOUT)
            .await
            .map_err(map_spawn_error)
    }

    async fn run(workdir: &Path, tag: &str) -> Result<ExecutionResult, ValidatorError> {
        let mut cmd = Command::new("docker");
        cmd.args(["run", "--rm", "--network", "none", tag])
            .current_dir(workdir);
        run_with_timeout(cmd, RUN_TIMEOUT).await.map_err(map_spawn_error)
    }
}

fn map_spawn_error(err: ProcessError) -> ValidatorError {
    ValidatorError::Spawn(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vulnpov_core::ValidationStatus;

    #[tokio::test]
    async fn unbuildable_workspace_is_failed_not_incorrect() {
        let dir = tempfile::tempdir().unwrap();
        let feedback = Validator::validate(dir.path(), "proj", ".").await;
        assert_eq!(feedback.status, ValidationStatus::Failed);
        assert!(feedback.error.is_some());
    }
}
