use std::path::PathBuf;

use clap::{Parser, Subcommand};
use vulnpov_core::DatasetFamily;

#[derive(Parser)]
#[command(name = "vulnpov", version)]
#[command(about = "Generates a vulnerability proof-of-concept test for one project's advisory")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Drive one project through Flow/Branch/TestGen and the validate/repair loop
    Run {
        /// Project workspace directory (a checkout the run owns exclusively)
        #[arg(long)]
        workspace: PathBuf,

        /// Path to the project's advisory record (JSON or TOML)
        #[arg(long)]
        advisory: PathBuf,

        /// Optional RunConfig TOML file; CLI flags below override its fields
        #[arg(long)]
        config: Option<PathBuf>,

        /// Budget in dollars
        #[arg(long)]
        budget: Option<f64>,

        /// Time budget per phase, in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Reason-act loop turn ceiling per phase
        #[arg(long)]
        max_turns: Option<u32>,

        /// Model identifier passed to the LLM transport
        #[arg(long)]
        model: Option<String>,

        /// Apply `.fix.patch` in the workspace before prompting, if present
        #[arg(long)]
        use_patch: bool,

        /// Skip flow reasoning
        #[arg(long)]
        no_flow: bool,

        /// Skip branch reasoning
        #[arg(long)]
        no_branch: bool,

        /// Dataset family, controlling the Docker build context and instruction text
        #[arg(long, value_enum)]
        dataset_family: Option<DatasetFamily>,

        /// Directory to write the persisted log record and output transcript into
        #[arg(long, default_value = "logs")]
        log_dir: PathBuf,

        /// Mirror status/output lines into the log directory's output.txt
        #[arg(long)]
        verbose: bool,

        /// Base URL of the OpenAI-compatible chat-completions endpoint
        #[arg(long, env = "VULNPOV_LLM_BASE_URL")]
        llm_base_url: String,

        /// API key for the LLM transport
        #[arg(long, env = "VULNPOV_LLM_API_KEY")]
        llm_api_key: String,
    },
}
