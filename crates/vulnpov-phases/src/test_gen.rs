use vulnpov_conversation::Conversation;
use vulnpov_core::{Advisory, CweClass, Role};
use vulnpov_sandbox::{FULL_SET, ToolContext, ToolRegistry};

use crate::error::PhaseError;
use crate::prompts::{
    construct_cwe_instruction, construct_docker_instructions, construct_issue_desc_prompt,
    construct_tool_prompt,
};
const PHASE: &str = "test_gen";

const WRITE_NUDGE: &str = "If you have finished generating your test, use the Run tool to check it.";
const CONTINUE_MESSAGE: &str = "Your output doesn't contain a <TOOL>...</TOOL> invocation. \
If you have generated, run and checked your test, respond <DONE>.";
const DONE_INSTRUCTION: &str = "If you successfully generate the test case and confirm that it satisfies all the \
above conditions, respond <DONE>.";

/// Generates a failing-then-passing proof-of-vulnerability test against the full tool set,
/// iterating with the model until `<DONE>` is emitted or `max_turns` is exhausted. `repair`
/// drives the same conversation again, seeded with validator feedback.
pub struct TestGen;

impl TestGen {
    #[tracing::instrument(skip(conversation, ctx, advisory, flow, conditions))]
    pub async fn run(
        conversation: &mut Conversation,
        ctx: &ToolContext,
        advisory: &Advisory,
        cwe: CweClass,
        flow: Option<&str>,
        conditions: Option<&str>,
        max_turns: u32,
    ) -> Result<(), PhaseError> {
        let registry = full_registry();
        let workdir = ctx.workdir.display().to_string();

        let mut prompt = construct_issue_desc_prompt(&advisory.details, advisory.summary.as_deref(), None);
        prompt.push_str(&format!(
            "\nNow create a test case that FAILS (exits with non-zero code) if the vulnerability EXISTS,\n\
             and PASSES (exits with code 0) if the vulnerability DOES NOT EXIST.\n\
             {}\n\
             This test should actually run the vulnerable code in the project.\n\
             - It should NOT read the source code to check for the presence of a vulnerability.\n\
             - It should NOT \"simulate\" the vulnerability by running some separate code that does not use the project.\n\n",
            construct_cwe_instruction(cwe)
        ));
        if let Some(flow) = flow {
            prompt.push_str(&format!(
                "Here is a flow consisting of a sequence of program points to reach the vulnerability:\n{flow}\n\n"
            ));
        }
        prompt.push_str(
            "The test should start from the vulnerability 'source' and reach the 'sink'.\n\
             It should be designed such that it passes through all the branch conditions on the way.\n",
        );
        if let Some(conditions) = conditions {
            prompt.push_str(&format!(
                "This means that the input and method calls should be carefully crafted, satisfying the following conditions:\n{conditions}\n"
            ));
        }
        prompt.push('\n');
        prompt.push_str(&construct_docker_instructions(ctx.dataset_family, &workdir));
        prompt.push_str(
            "\nFeel free to create any new files to create the test case.\n\
             You are highly encouraged to insert print statements in the existing source files to debug your test.\n\
             Remember the branch conditions and flow that you derived earlier, and use them to guide your test generation and debugging process.\n\n\
             Once you verify that the flow has reached the 'sink', you should analyze the observed behavior of the program\n\
             to ensure that the test FAILS if the vulnerability exists, and PASSES if it does not exist.\n\
             To re-emphasize, this test should NOT be based on reading the source code, but rather on the actual behavior of the program when it is run.\n\
             If I fix the vulnerability in the project, the test should PASS.\n",
        );
        prompt.push_str(&construct_tool_prompt(&FULL_SET, &workdir));
        prompt.push_str(DONE_INSTRUCTION);

        conversation.append(Role::User, prompt).await?;
        drive_until_done(conversation, &registry, ctx, max_turns).await
    }

    #[tracing::instrument(skip(conversation, ctx, feedback))]
    pub async fn repair(
        conversation: &mut Conversation,
        ctx: &ToolContext,
        feedback: &str,
        max_turns: u32,
    ) -> Result<(), PhaseError> {
        let registry = full_registry();

        let prompt = format!(
            "The test you generated had the following error:\n\
             {feedback}\n\
             Please fix the test case. Carefully analyze this output for errors or messages that can help you debug your test. \
             Reason step-by-step about what might have gone wrong, and how you can fix it.\n\
             You can use the <TOOL>...</TOOL> format to invoke tools, and you can also add new files.\n\
             When you have generated, run and checked your test again, respond with a message containing the string \"<DONE>\".\n\
             Remember that the test should actually run the vulnerable code in the project, \
             - It should NOT read the source code to check for the presence of a vulnerability.\n\
             - It should NOT \"simulate\" the vulnerability by running some separate code that does not use the project.\n"
        );

        conversation.append(Role::User, prompt).await?;
        drive_until_done(conversation, &registry, ctx, max_turns).await
    }
}

fn full_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    for tool in FULL_SET {
        registry.register(tool).expect("full set has no duplicate names");
    }
    registry
}

/// The loop specialization TestGen/repair share: a successful `write` earns a nudge to run the
/// test, a turn with neither a tool invocation nor `<DONE>` earns a prod to do one or the other.
async fn drive_until_done(
    conversation: &mut Conversation,
    registry: &ToolRegistry,
    ctx: &ToolContext,
    max_turns: u32,
) -> Result<(), PhaseError> {
    for _ in 0..max_turns {
        let response = conversation.generate().await?;
        if ToolRegistry::has_tool_invocation(&response) {
            let outcome = registry.dispatch(&response, ctx).await;
            conversation.record_tool_call(&outcome.tool_name, outcome.elapsed);
            if outcome.result.is_success() {
                let wrote_a_file = outcome.tool_name == "write";
                conversation.append(Role::User, outcome.result.output).await?;
                if wrote_a_file {
                    conversation.append(Role::User, WRITE_NUDGE).await?;
                }
            } else {
                conversation
                    .append(Role::User, format!("Tool invocation failed: {}", outcome.result.output))
                    .await?;
            }
        } else if response.contains("<DONE>") {
            break;
        } else {
            conversation.append(Role::User, CONTINUE_MESSAGE).await?;
        }
    }

    let last = conversation
        .messages()
        .last()
        .filter(|m| m.role == Role::Assistant)
        .ok_or(PhaseError::NoAssistantResponse { phase: PHASE })?;

    if last.content.contains("<DONE>") {
        Ok(())
    } else {
        Err(PhaseError::MissingTerminator {
            phase: PHASE,
            tag: "<DONE>",
        })
    }
}
