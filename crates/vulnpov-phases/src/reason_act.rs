use vulnpov_conversation::{Conversation, ConversationError};
use vulnpov_core::Role;
use vulnpov_sandbox::{ToolContext, ToolRegistry};

/// The loop shared by FlowReasoning and BranchReasoning: generate, dispatch a tool invocation
/// and loop back as a user turn, or exit on the first turn with no invocation. TestGen's loop is
/// similar in shape but has its own terminator/nudge handling, so it is not built on this helper.
pub async fn run_reason_act_loop(
    conversation: &mut Conversation,
    registry: &ToolRegistry,
    ctx: &ToolContext,
    max_turns: u32,
) -> Result<(), ConversationError> {
    for _ in 0..max_turns {
        let response = conversation.generate().await?;
        if !ToolRegistry::has_tool_invocation(&response) {
            break;
        }
        let outcome = registry.dispatch(&response, ctx).await;
        conversation.record_tool_call(&outcome.tool_name, outcome.elapsed);
        if outcome.result.is_success() {
            conversation.append(Role::User, outcome.result.output).await?;
        } else {
            conversation
                .append(Role::User, format!("Tool invocation failed: {}", outcome.result.output))
                .await?;
        }
    }
    Ok(())
}

/// Finds the first `open` and the first `close` after it, returning the trimmed text between.
/// Mirrors `text.split(open)[1].split(close)[0]`: only the first delimiter pair is honored.
pub fn extract_terminator<'a>(text: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let start = text.find(open)? + open.len();
    let end = text[start..].find(close)? + start;
    Some(text[start..end].trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_pair_trimmed() {
        let text = "prelude <FLOW>\n  inner text  \n</FLOW> trailer <FLOW>ignored</FLOW>";
        assert_eq!(extract_terminator(text, "<FLOW>", "</FLOW>"), Some("inner text"));
    }

    #[test]
    fn missing_open_tag_returns_none() {
        assert_eq!(extract_terminator("no tags here", "<FLOW>", "</FLOW>"), None);
    }

    #[test]
    fn missing_close_tag_returns_none() {
        assert_eq!(extract_terminator("<FLOW>unterminated", "<FLOW>", "</FLOW>"), None);
    }
}
