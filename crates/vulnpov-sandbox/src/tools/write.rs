use vulnpov_core::{ToolInvocation, ToolResult};
use vulnpov_process::truncate_head;

const MAX_CHARS: usize = 10_000;

pub async fn execute(invocation: &ToolInvocation) -> ToolResult {
    if let Err(msg) = invocation.validate_schema(&["file", "content"], &["file", "content"]) {
        return ToolResult::failure(msg);
    }
    let fpath = invocation.get_str("file").unwrap();
    let content = invocation.get_str("content").unwrap_or_default();
    let path = std::path::Path::new(fpath);

    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        if tokio::fs::metadata(parent).await.is_err() {
            return ToolResult::failure(format!(
                "Directory {} does not exist",
                parent.display()
            ));
        }
    }

    match tokio::fs::write(path, content).await {
        Ok(()) => ToolResult::success("File written successfully"),
        Err(err) => ToolResult::failure(truncate_head(&err.to_string(), MAX_CHARS)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn invocation(fields: serde_json::Value) -> ToolInvocation {
        let serde_json::Value::Object(map) = fields else {
            panic!("expected object")
        };
        ToolInvocation {
            name: "write".to_string(),
            fields: map,
        }
    }

    #[tokio::test]
    async fn missing_content_field_fails() {
        let result = execute(&invocation(json!({"name": "write", "file": "/a"}))).await;
        assert!(!result.is_success());
    }

    #[tokio::test]
    async fn missing_parent_directory_fails() {
        let result = execute(&invocation(
            json!({"name": "write", "file": "/no/such/dir/a.txt", "content": "x"}),
        ))
        .await;
        assert!(!result.is_success());
        assert!(result.output.contains("does not exist"));
    }

    #[tokio::test]
    async fn writes_new_file_with_sentinel_success() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("new.txt");
        let result = execute(&invocation(
            json!({"name": "write", "file": file.to_str().unwrap(), "content": "hello"}),
        ))
        .await;
        assert!(result.is_success());
        assert_eq!(result.output, "File written successfully");
        assert_eq!(tokio::fs::read_to_string(&file).await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn overwrites_existing_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.txt");
        tokio::fs::write(&file, "old").await.unwrap();
        execute(&invocation(
            json!({"name": "write", "file": file.to_str().unwrap(), "content": "new"}),
        ))
        .await;
        assert_eq!(tokio::fs::read_to_string(&file).await.unwrap(), "new");
    }
}
