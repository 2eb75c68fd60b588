/// Keeps the head of `text` (used for file/search output, where the beginning is what a
/// reader orients around) truncated to at most `max_chars` characters, with a trailing marker
/// when truncation occurred.
pub fn truncate_head(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!("{head}\n... [truncated, {} more characters elided]", total - max_chars)
}

/// Keeps the tail of `text` (used for build/run debug output, where the most recent lines
/// matter most) truncated to at most `max_chars` characters, with a leading marker announcing
/// how much was elided from the head.
pub fn truncate_tail(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }
    let elided = total - max_chars;
    let tail: String = text.chars().skip(elided).collect();
    format!("[truncated, {elided} characters elided from the start]\n{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_unchanged_by_either_policy() {
        assert_eq!(truncate_head("hello", 100), "hello");
        assert_eq!(truncate_tail("hello", 100), "hello");
    }

    #[test]
    fn head_keeps_beginning() {
        let text = "a".repeat(10) + &"b".repeat(10);
        let result = truncate_head(&text, 10);
        assert!(result.starts_with("aaaaaaaaaa"));
        assert!(result.contains("10 more characters elided"));
    }

    #[test]
    fn tail_keeps_end() {
        let text = "a".repeat(10) + &"b".repeat(10);
        let result = truncate_tail(&text, 10);
        assert!(result.ends_with("bbbbbbbbbb"));
        assert!(result.starts_with("[truncated, 10 characters elided from the start]"));
    }

    #[test]
    fn exact_boundary_is_not_truncated() {
        let text = "a".repeat(10);
        assert_eq!(truncate_head(&text, 10), text);
        assert_eq!(truncate_tail(&text, 10), text);
    }
}
