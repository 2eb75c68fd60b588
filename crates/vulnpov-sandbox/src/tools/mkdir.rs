use vulnpov_core::{ToolInvocation, ToolResult};
use vulnpov_process::truncate_head;

const MAX_CHARS: usize = 10_000;

pub async fn execute(invocation: &ToolInvocation) -> ToolResult {
    if let Err(msg) = invocation.validate_schema(&["path"], &["path"]) {
        return ToolResult::failure(msg);
    }
    let dirpath = invocation.get_str("path").unwrap();
    let path = std::path::Path::new(dirpath);

    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        if tokio::fs::metadata(parent).await.is_err() {
            return ToolResult::failure(format!(
                "Directory {} does not exist",
                parent.display()
            ));
        }
    }

    match tokio::fs::create_dir_all(path).await {
        Ok(()) => ToolResult::success("Directory created successfully"),
        Err(err) => ToolResult::failure(truncate_head(&err.to_string(), MAX_CHARS)),
    }
}
