use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::Parser;
use vulnpov_core::Advisory;
use vulnpov_engine::{Engine, Logger};

mod cli;

use cli::{Cli, Commands};

fn load_advisory(path: &Path) -> Result<Advisory> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading advisory file {}", path.display()))?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&content)
            .with_context(|| format!("parsing advisory TOML {}", path.display())),
        _ => serde_json::from_str(&content)
            .with_context(|| format!("parsing advisory JSON {}", path.display())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            workspace,
            advisory,
            config,
            budget,
            timeout,
            max_turns,
            model,
            use_patch,
            no_flow,
            no_branch,
            dataset_family,
            log_dir,
            verbose,
            llm_base_url,
            llm_api_key,
        } => {
            if !workspace.exists() {
                bail!("workspace {} does not exist", workspace.display());
            }

            let mut run_config = match &config {
                Some(path) => vulnpov_config::RunConfig::load(path)?,
                None => vulnpov_config::RunConfig::default(),
            };
            if let Some(budget) = budget {
                run_config.budget_usd = budget;
            }
            if let Some(timeout) = timeout {
                run_config.timeout_s = timeout;
            }
            if let Some(max_turns) = max_turns {
                run_config.max_turns = max_turns;
            }
            if let Some(model) = model {
                run_config.model = model;
            }
            if use_patch {
                run_config.use_patch = true;
            }
            if no_flow {
                run_config.no_flow = true;
            }
            if no_branch {
                run_config.no_branch = true;
            }
            if let Some(dataset_family) = dataset_family {
                run_config.dataset_family = dataset_family;
            }
            run_config.validate()?;

            let advisory = load_advisory(&advisory)?;
            if !advisory.is_supported() {
                bail!(
                    "advisory's CWE identifiers {:?} map to no class this system supports",
                    advisory.cwe_ids
                );
            }

            let project_slug = workspace
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("project")
                .to_string();

            let log_dir = log_dir.join(format!("{project_slug}_{}", Local::now().format("%Y%m%d_%H%M%S")));
            let args = serde_json::json!({
                "workspace": workspace.display().to_string(),
                "project": project_slug,
                "model": run_config.model,
                "budget": run_config.budget_usd,
                "timeout": run_config.timeout_s,
                "use_patch": run_config.use_patch,
                "no_flow": run_config.no_flow,
                "no_branch": run_config.no_branch,
            });
            let logger = Arc::new(Logger::new(
                log_dir.clone(),
                args,
                verbose,
                Local::now().to_rfc3339(),
            )?);

            let client = Arc::new(vulnpov_llm::HttpLlmClient::new(llm_base_url, llm_api_key));

            let engine = Engine::new(workspace, project_slug, advisory, run_config, client, logger.clone());

            let summary = engine.run().await?;

            println!("log record: {}", log_dir.join("log.json").display());
            for row in &summary.results {
                println!("  {:<16} {}", row.phase.to_string(), row.outcome);
            }
            if let Some(feedback) = &summary.final_feedback {
                println!("Final validation: {}", feedback.status);
                if let Some(error) = &feedback.error {
                    println!("  {error}");
                }
            }
            let (cost, elapsed) = logger.cost_and_time();
            println!("Total cost: ${cost:.4}, total time: {:.1}s", elapsed.as_secs_f64());

            if summary.final_feedback.is_none_or(|feedback| !feedback.is_correct()) {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
