use std::time::Duration;

use tokio::process::Command;
use vulnpov_core::{PROTECTED_FILES, ToolInvocation, ToolResult};
use vulnpov_process::run_with_timeout;

use super::ToolContext;

const GIT_TIMEOUT: Duration = Duration::from_secs(120);

pub async fn execute(invocation: &ToolInvocation, ctx: &ToolContext) -> ToolResult {
    if let Err(msg) = invocation.validate_schema(&[], &[]) {
        return ToolResult::failure(msg);
    }

    let mut stash_cmd = Command::new("git");
    stash_cmd.arg("stash").current_dir(&ctx.workdir);
    match run_with_timeout(stash_cmd, GIT_TIMEOUT).await {
        Ok(result) if result.succeeded() => {}
        _ => return ToolResult::failure("Reset failed."),
    }

    let mut ls_cmd = Command::new("git");
    ls_cmd
        .args(["ls-files", "--others", "--exclude-standard"])
        .current_dir(&ctx.workdir);
    let listing = match run_with_timeout(ls_cmd, GIT_TIMEOUT).await {
        Ok(result) if result.succeeded() => result.stdout,
        _ => return ToolResult::failure("Reset failed."),
    };

    let created_files: Vec<&str> = listing
        .lines()
        .map(str::trim)
        .filter(|f| !f.is_empty() && !PROTECTED_FILES.contains(f))
        .collect();

    for file in created_files {
        let path = ctx.workdir.join(file);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return ToolResult::failure(format!("Reset failed: {err}")),
        }
    }

    let backup = ctx.workdir.join(".Dockerfile.backup");
    if tokio::fs::metadata(&backup).await.is_ok() {
        let dockerfile = ctx.workdir.join("Dockerfile.vuln");
        let _ = tokio::fs::remove_file(&dockerfile).await;
        if let Err(err) = tokio::fs::copy(&backup, &dockerfile).await {
            return ToolResult::failure(format!("Reset failed: {err}"));
        }
    }

    ToolResult::success("Working directory reset successfully.")
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
            name: "reset".to_string(),
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
        let result = execute(&invocation(json!({"name": "reset", "bogus": 1})), &ctx).await;
        assert!(!result.is_success());
    }

    #[tokio::test]
    async fn non_git_workdir_reports_reset_failed() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ToolContext {
            workdir: dir.path().to_path_buf(),
            project_slug: "proj".to_string(),
            dataset_family: DatasetFamily::Generic,
        };
        let result = execute(&invocation(json!({"name": "reset"})), &ctx).await;
        assert!(!result.is_success());
        assert_eq!(result.output, "Reset failed.");
    }

    async fn run_git(dir: &std::path::Path, args: &[&str]) {
        let status = tokio::process::Command::new("git")
            .args(args)
            .current_dir(dir)
            .status()
            .await
            .unwrap();
        assert!(status.success(), "git {args:?} failed");
    }

    #[tokio::test]
    async fn reset_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path();
        tokio::fs::write(path.join("Dockerfile.vuln"), "FROM scratch\n").await.unwrap();
        tokio::fs::write(path.join(".Dockerfile.backup"), "FROM scratch\n").await.unwrap();
        tokio::fs::write(path.join(".build_diff.patch"), "diff --git a b\n").await.unwrap();

        run_git(path, &["init"]).await;
        run_git(path, &["config", "user.email", "test@example.com"]).await;
        run_git(path, &["config", "user.name", "test"]).await;
        run_git(path, &["add", "-A"]).await;
        run_git(path, &["commit", "-m", "initial"]).await;

        let ctx = ToolContext {
            workdir: path.to_path_buf(),
            project_slug: "proj".to_string(),
            dataset_family: DatasetFamily::Generic,
        };

        let first = execute(&invocation(json!({"name": "reset"})), &ctx).await;
        assert!(first.is_success());
        let after_first: Vec<_> = std::fs::read_dir(path)
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .filter(|name| name != ".git")
            .collect();

        let second = execute(&invocation(json!({"name": "reset"})), &ctx).await;
        assert!(second.is_success());
        let after_second: Vec<_> = std::fs::read_dir(path)
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .filter(|name| name != ".git")
            .collect();

        let mut after_first = after_first;
        let mut after_second = after_second;
        after_first.sort();
        after_second.sort();
        assert_eq!(after_first, after_second);

        let dockerfile = tokio::fs::read(path.join("Dockerfile.vuln")).await.unwrap();
        let backup = tokio::fs::read(path.join(".Dockerfile.backup")).await.unwrap();
        assert_eq!(dockerfile, backup);
    }
}
