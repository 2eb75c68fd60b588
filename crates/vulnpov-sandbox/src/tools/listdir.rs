use vulnpov_core::{ToolInvocation, ToolResult};
use vulnpov_process::truncate_head;

const MAX_CHARS: usize = 10_000;

pub async fn execute(invocation: &ToolInvocation) -> ToolResult {
    if let Err(msg) = invocation.validate_schema(&["directory"], &["directory"]) {
        return ToolResult::failure(msg);
    }
    let directory = invocation.get_str("directory").unwrap();
    let path = std::path::Path::new(directory);

    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => {}
        _ => return ToolResult::failure(format!("Directory {directory} does not exist")),
    }

    let mut entries = match tokio::fs::read_dir(path).await {
        Ok(entries) => entries,
        Err(err) => return ToolResult::failure(truncate_head(&err.to_string(), MAX_CHARS)),
    };

    let mut names = Vec::new();
    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if !name.starts_with('.') {
                    names.push(name.into_owned());
                }
            }
            Ok(None) => break,
            Err(err) => return ToolResult::failure(truncate_head(&err.to_string(), MAX_CHARS)),
        }
    }
    names.sort();

    ToolResult::success(truncate_head(&names.join("\n"), MAX_CHARS))
}
