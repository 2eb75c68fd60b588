use vulnpov_core::{CweClass, DatasetFamily};
use vulnpov_sandbox::SandboxTool;

/// Fixed system prompt every phase seeds its conversation with.
pub const SYS_PROMPT: &str = "You are a helpful AI assistant that can interact with a computer to solve tasks.\n\
\n\
<ROLE>\n\
Your primary role is to assist users by executing commands, modifying code, and solving technical problems effectively.\n\
You should be thorough, methodical, and prioritize quality over speed.\n\
Your code will never be read by humans, so focus on correctness, not style.\n\
</ROLE>\n\
\n\
<EFFICIENCY>\n\
* Each action you take is somewhat expensive. Minimize unnecessary actions.\n\
* When exploring the codebase, use the find and grep tools with appropriate filters to minimize unnecessary operations.\n\
* You do not have access to the internet, so do not attempt to search online for information.\n\
</EFFICIENCY>\n\
\n\
<CODE_QUALITY>\n\
* Write clean, efficient code with minimal comments. Avoid redundancy in comments: Do not repeat information that can be easily inferred from the code itself.\n\
* When implementing solutions, focus on making the minimal changes needed to solve the problem.\n\
* Before implementing any changes, first thoroughly understand the codebase through exploration.\n\
* If you are adding a lot of code to a function or file, consider splitting the function or file into smaller pieces when appropriate.\n\
</CODE_QUALITY>\n\
\n\
<PROBLEM_SOLVING_WORKFLOW>\n\
1. EXPLORATION: Thoroughly explore relevant files and understand the context before proposing solutions\n\
2. ANALYSIS: Consider multiple approaches and select the most promising one\n\
3. IMPLEMENTATION: Make focused, minimal changes to address the problem\n\
</PROBLEM_SOLVING_WORKFLOW>\n\
\n\
<TROUBLESHOOTING>\n\
* If you've made repeated attempts to solve a problem but tests still fail or the user reports it's still broken:\n\
  1. Step back and reflect on 5-7 different possible sources of the problem\n\
  2. Assess the likelihood of each possible cause\n\
  3. Methodically address the most likely causes, starting with the highest probability\n\
  4. Document your reasoning process\n\
</TROUBLESHOOTING>\n";

/// Renders the tool catalog for whichever subset a phase registers, plus the working directory
/// and the one-invocation-per-turn rule.
pub fn construct_tool_prompt(tools: &[SandboxTool], workdir: &str) -> String {
    let mut prompt = String::from("The following tools are available:\n");
    for tool in tools {
        prompt.push_str(&format!("- {}: {}\n", tool.name(), tool.description()));
        prompt.push_str(&format!("  Usage:\n{}\n", tool.usage()));
    }
    prompt.push('\n');
    prompt.push_str(
        "If you emit output in one of the above formats, you will get the output of the corresponding tool as a reply.\n",
    );
    prompt.push_str(
        "Note that each tool invocation must be in a separate reply! You can only invoke one tool per turn.\n",
    );
    prompt.push_str(&format!("The current working directory is {workdir}\n"));
    prompt
}

/// Renders the advisory's issue description, optionally followed by the fix patch.
pub fn construct_issue_desc_prompt(issue_desc: &str, issue_summary: Option<&str>, diff: Option<&str>) -> String {
    let desc_str = match issue_summary {
        Some(summary) => format!("\"Summary: {summary}\nDescription: {issue_desc}\""),
        None => format!("\"{issue_desc}\""),
    };
    let mut prompt = format!(
        "The project I am working with has a vulnerability, reported as a CWE. The issue description says:\n\
         {desc_str}\n\
         You do not have access to the internet or GitHub to look up more details.\n\
         There are no vulnerability reports in the project directory either.\n"
    );
    if let Some(diff) = diff {
        prompt.push_str(&format!(
            "```\nHere is the patch that fixed the vulnerability:\n{diff}\n```\n"
        ));
    }
    prompt
}

/// Renders the Docker build/run instructions TestGen weaves into its prompt, parameterized by
/// dataset family.
pub fn construct_docker_instructions(dataset_family: DatasetFamily, workdir: &str) -> String {
    match dataset_family {
        DatasetFamily::CweBenchJava => format!(
            "\nThe project is built and run as a Docker container, and the Dockerfile is at `{workdir}/Dockerfile.vuln`.\n\
             All the build dependencies for the project are already installed in `Dockerfile.vuln`.\n\
             However, if you need any new dependencies, you can add them to `Dockerfile.vuln`.\n\
             Make sure to not modify any of the lines in the Dockerfile above \"# Do not modify anything above this line\".\n\
             The entire project directory is copied into the Docker container, so you don't need to write any new COPY commands in the Dockerfile.\n\
             The command to run the test should be the `CMD` command in `Dockerfile.vuln`, so that the test can be run with\n\
             `docker run -t imagename`.\n"
        ),
        DatasetFamily::Generic => format!(
            "\nThe project is built and run as a Docker container, and the Dockerfile is at `{workdir}/Dockerfile.vuln`.\n\
             The Dockerfile currently has some build dependencies, but you may need to add more.\n\
             Analyze the installation instructions in the project README or other documentation files, and add the necessary build/installation commands to `Dockerfile.vuln`.\n\
             The Dockerfile contains an instruction to copy the entire project directory into the Docker container, so you don't need to write any new COPY commands in the Dockerfile.\n\
             The command to run the test should be the `CMD` command in `Dockerfile.vuln`, so that the test can be run with\n\
             `docker run -t imagename`.\n"
        ),
    }
}

/// The CWE-specific instruction injected into TestGen's prompt (§6's CWE-instruction table).
pub fn construct_cwe_instruction(class: CweClass) -> String {
    format!(
        "The vulnerability is classified as {class}. To demonstrate it, {}.\n",
        class.instruction_essence()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_prompt_lists_each_tool_name_and_usage() {
        let prompt = construct_tool_prompt(&vulnpov_sandbox::READ_ONLY_SET, "/work");
        assert!(prompt.contains("- read:"));
        assert!(prompt.contains("- listdir:"));
        assert!(prompt.contains("The current working directory is /work"));
        assert!(prompt.contains("only invoke one tool per turn"));
    }

    #[test]
    fn issue_desc_prompt_includes_summary_when_present() {
        let prompt = construct_issue_desc_prompt("desc", Some("summary"), None);
        assert!(prompt.contains("Summary: summary"));
        assert!(prompt.contains("Description: desc"));
    }

    #[test]
    fn issue_desc_prompt_omits_summary_section_when_absent() {
        let prompt = construct_issue_desc_prompt("desc", None, None);
        assert!(!prompt.contains("Summary:"));
        assert!(prompt.contains("\"desc\""));
    }

    #[test]
    fn issue_desc_prompt_includes_diff_when_present() {
        let prompt = construct_issue_desc_prompt("desc", None, Some("--- a\n+++ b"));
        assert!(prompt.contains("Here is the patch that fixed the vulnerability"));
        assert!(prompt.contains("--- a"));
    }

    #[test]
    fn docker_instructions_differ_by_dataset_family() {
        let java = construct_docker_instructions(DatasetFamily::CweBenchJava, "/w");
        let generic = construct_docker_instructions(DatasetFamily::Generic, "/w");
        assert!(java.contains("Do not modify anything above"));
        assert!(!generic.contains("Do not modify anything above"));
    }

    #[test]
    fn cwe_instruction_names_the_class() {
        let prompt = construct_cwe_instruction(CweClass::PathTraversal);
        assert!(prompt.contains("CWE-22"));
        assert!(prompt.contains("outside the project directory"));
    }
}
