use vulnpov_conversation::Conversation;
use vulnpov_core::{Advisory, Flow, Role};
use vulnpov_sandbox::{READ_ONLY_SET, ToolContext, ToolRegistry};

use crate::error::PhaseError;
use crate::prompts::{construct_issue_desc_prompt, construct_tool_prompt};
use crate::reason_act::{extract_terminator, run_reason_act_loop};

const PHASE: &str = "flow_reasoning";

const FLOW_REQUEST: &str = "Could you generate a sequence of program points to reach the vulnerable point (sink), \
starting from an external input (source)? This corresponds to a vulnerable \u{201c}flow\u{201d} through the program.\
The flow should take the form of a sequence of program points, each in the following format:\n\
{\"role\": \"Source|Intermediate|Sink\",\n \
\"code\": \"Source code of program point (1-2 lines),\n \
\"variable\": \"Variable name\",\n \
\"file\": \"File path (absolute)\",\n \
\"remarks\": \"Comments about this point, if any\"\n}\n \
You can use multiple intermediate steps and tool invocations, but when you are finished, your final response \
should contain the flow in the above format, within the tags <FLOW> and </FLOW>.\n";

/// Infers a taint-flow from an external source to the vulnerable sink, grounded in tool-mediated
/// inspection of the project. Registers the read-only tool set.
pub struct FlowReasoning;

impl FlowReasoning {
    /// `conversation` must already contain the system message; this call appends the phase's
    /// seed prompt and drives the reason-act loop to completion or `max_turns`.
    #[tracing::instrument(skip(conversation, ctx, advisory, diff))]
    pub async fn run(
        conversation: &mut Conversation,
        ctx: &ToolContext,
        advisory: &Advisory,
        diff: Option<&str>,
        max_turns: u32,
    ) -> Result<Flow, PhaseError> {
        let mut registry = ToolRegistry::new();
        for tool in READ_ONLY_SET {
            registry.register(tool).expect("read-only set has no duplicate names");
        }

        let mut prompt =
            construct_issue_desc_prompt(&advisory.details, advisory.summary.as_deref(), diff);
        prompt.push_str(&construct_tool_prompt(&READ_ONLY_SET, &ctx.workdir.display().to_string()));
        prompt.push_str(FLOW_REQUEST);

        conversation.append(Role::User, prompt).await?;
        run_reason_act_loop(conversation, &registry, ctx, max_turns).await?;

        let last = conversation
            .messages()
            .last()
            .filter(|m| m.role == Role::Assistant)
            .ok_or(PhaseError::NoAssistantResponse { phase: PHASE })?;

        let raw = extract_terminator(&last.content, "<FLOW>", "</FLOW>").ok_or(
            PhaseError::MissingTerminator {
                phase: PHASE,
                tag: "<FLOW>",
            },
        )?;

        Ok(Flow::opaque(raw.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use vulnpov_core::DatasetFamily;
    use vulnpov_llm::MockLlmClient;

    fn ctx() -> ToolContext {
        ToolContext {
            workdir: std::env::temp_dir(),
            project_slug: "proj".to_string(),
            dataset_family: DatasetFamily::Generic,
        }
    }

    fn advisory() -> Advisory {
        Advisory::new(vec!["CWE-22".to_string()], None, "a path traversal bug".to_string())
    }

    #[tokio::test]
    async fn extracts_flow_from_final_response() {
        let client = Arc::new(MockLlmClient::new(vec![
            "<FLOW>\nsource -> sink\n</FLOW>",
        ]));
        let mut conversation =
            Conversation::new("m", client, 5.0, Duration::from_secs(60), 0.3);
        conversation.append(Role::System, "sys").await.unwrap();

        let flow = FlowReasoning::run(&mut conversation, &ctx(), &advisory(), None, 10)
            .await
            .unwrap();
        assert_eq!(flow.raw, "source -> sink");
    }

    #[tokio::test]
    async fn missing_terminator_is_a_phase_failure() {
        let client = Arc::new(MockLlmClient::new(vec!["no flow tags here"]));
        let mut conversation =
            Conversation::new("m", client, 5.0, Duration::from_secs(60), 0.3);
        conversation.append(Role::System, "sys").await.unwrap();

        let err = FlowReasoning::run(&mut conversation, &ctx(), &advisory(), None, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, PhaseError::MissingTerminator { .. }));
    }

    #[tokio::test]
    async fn turn_cap_leaves_last_message_as_user_and_fails() {
        let client = Arc::new(MockLlmClient::new(vec![
            "<TOOL>{\"name\": \"listdir\", \"directory\": \"/tmp\"}</TOOL>",
            "<TOOL>{\"name\": \"listdir\", \"directory\": \"/tmp\"}</TOOL>",
        ]));
        let mut conversation =
            Conversation::new("m", client, 5.0, Duration::from_secs(60), 0.3);
        conversation.append(Role::System, "sys").await.unwrap();

        let err = FlowReasoning::run(&mut conversation, &ctx(), &advisory(), None, 2)
            .await
            .unwrap_err();
        assert!(matches!(err, PhaseError::NoAssistantResponse { .. }));
    }
}
