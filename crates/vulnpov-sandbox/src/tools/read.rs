use vulnpov_core::{ToolInvocation, ToolResult, has_hidden_segment};
use vulnpov_process::truncate_head;

const MAX_CHARS: usize = 3000;

pub async fn execute(invocation: &ToolInvocation) -> ToolResult {
    if let Err(msg) = invocation.validate_schema(&["file"], &["file", "start_line", "end_line"]) {
        return ToolResult::failure(msg);
    }
    let fpath = invocation.get_str("file").unwrap();
    let path = std::path::Path::new(fpath);

    if !path.is_absolute() {
        return ToolResult::failure("File path should be absolute");
    }
    if has_hidden_segment(path) {
        return ToolResult::failure(format!("File {fpath} is a hidden file and cannot be read"));
    }
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => {}
        _ => return ToolResult::failure(format!("File {fpath} does not exist")),
    }

    let start_line = invocation.get_u64("start_line").unwrap_or(1) as i64;
    if start_line < 1 {
        return ToolResult::failure("start_line must be >= 1");
    }
    let end_line = invocation.get_u64("end_line").map(|v| v as i64).unwrap_or(i64::MAX);
    if end_line < start_line {
        return ToolResult::failure("end_line must be >= start_line");
    }

    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) => return ToolResult::failure(truncate_head(&err.to_string(), MAX_CHARS)),
    };

    let start_idx = (start_line - 1) as usize;
    let end_idx = end_line as usize;
    let lines: Vec<&str> = content.split_inclusive('\n').collect();
    let slice = if start_idx >= lines.len() {
        String::new()
    } else {
        lines[start_idx..end_idx.min(lines.len())].concat()
    };

    if slice.is_empty() {
        return ToolResult::failure("File is empty or start_line is too high");
    }

    ToolResult::success(truncate_head(&slice, MAX_CHARS))
}
