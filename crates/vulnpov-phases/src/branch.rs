use vulnpov_conversation::Conversation;
use vulnpov_core::{Advisory, BranchSequence, Conditions, Role};
use vulnpov_sandbox::{READ_ONLY_SET, ToolContext, ToolRegistry};

use crate::error::PhaseError;
use crate::prompts::{construct_issue_desc_prompt, construct_tool_prompt};
use crate::reason_act::{extract_terminator, run_reason_act_loop};

const PHASE: &str = "branch_reasoning";

const SEQUENCE_REQUEST: &str = "Could you generate the sequence of branch conditions encountered on the way to the \
sink, starting from the source? Include *every single* if-else, try-except, or switch statement that the \
program flow will encounter in the path from the source to the sink.\n\
This should take the form of a sequence of program points, each in the following format:\n\
{\"type\": \"If-Else | Try-Except | Switch\",\n \
\"code\": \"Source code of program point (1-2 lines),\n \
\"file\": \"File path (absolute)\",\n \
\"outcome\": \"What should be the outcome of the branch statement in order to reach the vulnerability?\"\n}\n \
You can use multiple intermediate steps and tool invocations, but when you are finished, your final response \
should contain the sequence in the above format, within the tags <SEQUENCE> and </SEQUENCE>.\n";

const CONDITIONS_REQUEST: &str = "Based on the above branch conditions that you generated, infer a set of \
conditions that the external input must satisfy in order to reach the vulnerability.\n\
Your final answer should be in the following format:\n\
<CONDITIONS>\n\
1. Condition 1\n\
2. Condition 2\n\
...\n\
</CONDITIONS>\n";

/// Infers, from a flow, the branch conditions encountered on the way to the sink and the
/// input-level conditions that follow from them. Two sequential sub-loops share one
/// conversation, each up to `max_turns`.
pub struct BranchReasoning;

impl BranchReasoning {
    #[tracing::instrument(skip(conversation, ctx, advisory, flow))]
    pub async fn run(
        conversation: &mut Conversation,
        ctx: &ToolContext,
        advisory: &Advisory,
        flow: Option<&str>,
        max_turns: u32,
    ) -> Result<(BranchSequence, Conditions), PhaseError> {
        let mut registry = ToolRegistry::new();
        for tool in READ_ONLY_SET {
            registry.register(tool).expect("read-only set has no duplicate names");
        }

        let mut prompt = construct_issue_desc_prompt(&advisory.details, advisory.summary.as_deref(), None);
        if let Some(flow) = flow {
            prompt.push_str("Here is a flow consisting of a sequence of program points to reach the vulnerability:\n");
            prompt.push_str(flow);
            prompt.push('\n');
        }
        prompt.push_str(SEQUENCE_REQUEST);
        prompt.push_str(&construct_tool_prompt(&READ_ONLY_SET, &ctx.workdir.display().to_string()));

        conversation.append(Role::User, prompt).await?;
        run_reason_act_loop(conversation, &registry, ctx, max_turns).await?;

        let sequence_text = {
            let last = conversation
                .messages()
                .last()
                .filter(|m| m.role == Role::Assistant)
                .ok_or(PhaseError::NoAssistantResponse { phase: PHASE })?;
            extract_terminator(&last.content, "<SEQUENCE>", "</SEQUENCE>")
                .ok_or(PhaseError::MissingTerminator {
                    phase: PHASE,
                    tag: "<SEQUENCE>",
                })?
                .to_string()
        };

        conversation.append(Role::User, CONDITIONS_REQUEST).await?;
        run_reason_act_loop(conversation, &registry, ctx, max_turns).await?;

        let conditions_text = {
            let last = conversation
                .messages()
                .last()
                .filter(|m| m.role == Role::Assistant)
                .ok_or(PhaseError::NoAssistantResponse { phase: PHASE })?;
            extract_terminator(&last.content, "<CONDITIONS>", "</CONDITIONS>")
                .ok_or(PhaseError::MissingTerminator {
                    phase: PHASE,
                    tag: "<CONDITIONS>",
                })?
                .to_string()
        };

        Ok((
            BranchSequence::opaque(sequence_text),
            Conditions::new(conditions_text),
        ))
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
        Advisory::new(vec!["CWE-78".to_string()], None, "a command injection bug".to_string())
    }

    #[tokio::test]
    async fn extracts_sequence_then_conditions() {
        let client = Arc::new(MockLlmClient::new(vec![
            "<SEQUENCE>\nif x: ...\n</SEQUENCE>",
            "<CONDITIONS>\n1. x must be set\n</CONDITIONS>",
        ]));
        let mut conversation = Conversation::new("m", client, 5.0, Duration::from_secs(60), 0.3);
        conversation.append(Role::System, "sys").await.unwrap();

        let (sequence, conditions) =
            BranchReasoning::run(&mut conversation, &ctx(), &advisory(), Some("source -> sink"), 10)
                .await
                .unwrap();
        assert_eq!(sequence.raw, "if x: ...");
        assert_eq!(conditions.raw, "1. x must be set");
    }

    #[tokio::test]
    async fn missing_sequence_terminator_fails_before_conditions_subloop() {
        let client = Arc::new(MockLlmClient::new(vec!["no sequence tags"]));
        let mut conversation = Conversation::new("m", client, 5.0, Duration::from_secs(60), 0.3);
        conversation.append(Role::System, "sys").await.unwrap();

        let err = BranchReasoning::run(&mut conversation, &ctx(), &advisory(), None, 10)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PhaseError::MissingTerminator { tag: "<SEQUENCE>", .. }
        ));
    }
}
