mod find;
mod grep;
mod listdir;
mod mkdir;
mod read;
mod reset;
mod run;
mod write;

use std::path::PathBuf;

use vulnpov_core::{DatasetFamily, ToolInvocation, ToolResult};

/// Everything a tool needs from the run that is outside the invocation itself: the project's
/// working directory and the facts that vary the container build.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub workdir: PathBuf,
    pub project_slug: String,
    pub dataset_family: DatasetFamily,
}

/// The fixed set of Sandbox Tools. A closed enum rather than a trait object: the tool set is
/// known at compile time and never grows at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SandboxTool {
    Read,
    Write,
    ListDir,
    Grep,
    Find,
    Mkdir,
    Run,
    Reset,
}

impl SandboxTool {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::ListDir => "listdir",
            Self::Grep => "grep",
            Self::Find => "find",
            Self::Mkdir => "mkdir",
            Self::Run => "run",
            Self::Reset => "reset",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Read => "Read the contents of a file.",
            Self::Write => "Write the contents to a file.",
            Self::ListDir => "Lists the contents of a directory.",
            Self::Grep => {
                "Searches for a string in the contents of a single file or all files in a directory."
            }
            Self::Find => "Finds files or directories with a name containing a search string.",
            Self::Mkdir => "Create a directory.",
            Self::Run => "Builds and runs the docker image for the project.",
            Self::Reset => "Resets the working directory to the initial state.",
        }
    }

    pub fn usage(&self) -> &'static str {
        match self {
            Self::Read => {
                "<TOOL>\n\
                 {\"name\": \"read\",\n\
                 \"file\": \"/path/to/file\",\n\
                 \"start_line\": <line_num>,\n\
                 \"end_line\": <line_num>\n\
                 }\n\
                 </TOOL>\n\
                 Note that the /path/to/file should be absolute, not relative.\n\
                 `start_line` (optional) is the line number to start reading from. Defaults to 1.\n"
            }
            Self::Write => {
                "<TOOL>\n\
                 {\"name\": \"write\",\n\
                 \"file\": \"/path/to/file\",\n\
                 \"content\": \"<contents to write>\"}\n\
                 </TOOL>\n\
                 If the file doesn't exist, it will be created.\n\
                 Note that the /path/to/file should be absolute, not relative.\n"
            }
            Self::ListDir => {
                "<TOOL>\n\
                 {\"name\": \"listdir\",\n\
                 \"directory\": \"/path/to/directory\"}\n\
                 </TOOL>\n\
                 Note that the /path/to/directory should be absolute, not relative.\n"
            }
            Self::Grep => {
                "<TOOL>\n\
                 {\"name\": \"grep\",\n\
                 \"query\": \"search_string\",\n\
                 \"path\": \"/path/to/directory_or_file\"}\n\
                 </TOOL>\n\
                 Note that the /path/to/directory_or_file should be absolute, not relative.\n"
            }
            Self::Find => {
                "<TOOL>\n\
                 {\"name\": \"find\",\n\
                 \"query\": \"search_string\",\n\
                 \"path\": \"/path/to/base_directory_or_file\"}\n\
                 </TOOL>\n\
                 Note that the /path/to/base_directory_or_file should be absolute, not relative.\n"
            }
            Self::Mkdir => {
                "<TOOL>\n\
                 {\"name\": \"mkdir\",\n\
                 \"path\": \"/path/to/directory\"}\n\
                 </TOOL>\n\
                 If the directory doesn't exist, it will be created.\n\
                 Note that the /path/to/directory should be absolute, not relative.\n"
            }
            Self::Run => "<TOOL>\n{\"name\": \"run\"}\n</TOOL>\n",
            Self::Reset => "<TOOL>\n{\"name\": \"reset\"}\n</TOOL>\n",
        }
    }

    pub async fn execute(&self, invocation: &ToolInvocation, ctx: &ToolContext) -> ToolResult {
        match self {
            Self::Read => read::execute(invocation).await,
            Self::Write => write::execute(invocation).await,
            Self::ListDir => listdir::execute(invocation).await,
            Self::Grep => grep::execute(invocation).await,
            Self::Find => find::execute(invocation).await,
            Self::Mkdir => mkdir::execute(invocation).await,
            Self::Run => run::execute(invocation, ctx).await,
            Self::Reset => reset::execute(invocation, ctx).await,
        }
    }
}

/// The default set of tools TestGen registers; FlowReasoning/BranchReasoning register only the
/// read-only prefix.
pub const FULL_SET: [SandboxTool; 8] = [
    SandboxTool::ListDir,
    SandboxTool::Read,
    SandboxTool::Grep,
    SandboxTool::Find,
    SandboxTool::Write,
    SandboxTool::Mkdir,
    SandboxTool::Run,
    SandboxTool::Reset,
];

pub const READ_ONLY_SET: [SandboxTool; 4] = [
    SandboxTool::ListDir,
    SandboxTool::Read,
    SandboxTool::Grep,
    SandboxTool::Find,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_match_wire_protocol() {
        assert_eq!(SandboxTool::Read.name(), "read");
        assert_eq!(SandboxTool::Run.name(), "run");
        assert_eq!(SandboxTool::Reset.name(), "reset");
    }

    #[test]
    fn full_set_has_no_duplicate_names() {
        let mut names: Vec<&str> = FULL_SET.iter().map(SandboxTool::name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), FULL_SET.len());
    }
}
