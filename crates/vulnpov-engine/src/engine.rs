use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::{info, warn};
use vulnpov_conversation::{ActionSink, Conversation};
use vulnpov_core::{
    Advisory, PhaseKind, PhaseOutcome, PhaseResult, Role, ToolInvocation, ValidationFeedback,
    ValidationStatus, project_image_tag,
};
use vulnpov_llm::LlmClient;
use vulnpov_phases::prompts::SYS_PROMPT;
use vulnpov_phases::{BranchReasoning, FlowReasoning, TestGen};
use vulnpov_process::run_with_timeout;
use vulnpov_sandbox::{SandboxTool, ToolContext};
use vulnpov_validator::Validator;

use crate::error::EngineError;
use crate::logger::EngineLog;

const SETUP_TIMEOUT: Duration = Duration::from_secs(300);
const TEMPERATURE: f32 = 0.3;
const MAX_REPAIR_CYCLES: u32 = 5;
const FIX_PATCH_FILE: &str = ".fix.patch";

/// Outcome of one complete run: the ordered phase result log plus the last validation feedback
/// observed, if validation ever ran.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub results: Vec<PhaseResult>,
    pub final_feedback: Option<ValidationFeedback>,
}

/// Drives one project through Flow → Branch → TestGen → {validate, repair}, exactly as
/// `RunConfig` configures it, against a single workspace checkout.
pub struct Engine {
    workdir: PathBuf,
    project_slug: String,
    advisory: Advisory,
    config: vulnpov_config::RunConfig,
    client: Arc<dyn LlmClient>,
    logger: Arc<dyn EngineLog>,
}

impl Engine {
    pub fn new(
        workdir: PathBuf,
        project_slug: String,
        advisory: Advisory,
        config: vulnpov_config::RunConfig,
        client: Arc<dyn LlmClient>,
        logger: Arc<dyn EngineLog>,
    ) -> Self {
        Self {
            workdir,
            project_slug,
            advisory,
            config,
            client,
            logger,
        }
    }

    fn ctx(&self) -> ToolContext {
        ToolContext {
            workdir: self.workdir.clone(),
            project_slug: self.project_slug.clone(),
            dataset_family: self.config.dataset_family,
        }
    }

    fn new_conversation(&self) -> Conversation {
        let sink: Arc<dyn ActionSink> = Arc::clone(&self.logger);
        Conversation::new(
            self.config.model.clone(),
            Arc::clone(&self.client),
            self.config.budget_usd,
            Duration::from_secs(self.config.timeout_s),
            TEMPERATURE,
        )
        .with_sink(sink)
    }

    fn load_diff(&self) -> Option<String> {
        if !self.config.use_patch {
            return None;
        }
        std::fs::read_to_string(self.workdir.join(FIX_PATCH_FILE)).ok()
    }

    /// Removes the project's previous vulnerability-test image so `run` rebuilds from scratch.
    /// Best-effort: a missing image is not an error, only a genuinely broken docker daemon is.
    #[tracing::instrument(skip(self))]
    pub async fn setup(&self) -> Result<(), EngineError> {
        let tag = project_image_tag(&self.project_slug);

        let mut rmi = Command::new("docker");
        rmi.args(["rmi", "-f", &tag]);
        let _ = run_with_timeout(rmi, SETUP_TIMEOUT).await;

        let mut prune = Command::new("docker");
        prune.args(["image", "prune", "-f"]);
        run_with_timeout(prune, SETUP_TIMEOUT)
            .await
            .map_err(EngineError::Setup)?;
        Ok(())
    }

    /// Restores the workspace to its checked-out state between phases: stashes tracked edits,
    /// deletes untracked files outside the protected set, and restores `Dockerfile.vuln` from its
    /// backup if one was made. Reuses the Reset Sandbox Tool's own logic rather than
    /// reimplementing it. Failures are logged and swallowed: a reset that can't fully clean up is
    /// still worth attempting the next phase against.
    #[tracing::instrument(skip(self))]
    pub async fn reset(&self) {
        let invocation = ToolInvocation {
            name: "reset".to_string(),
            fields: serde_json::Map::new(),
        };
        let result = SandboxTool::Reset.execute(&invocation, &self.ctx()).await;
        if !result.is_success() {
            warn!(output = %result.output, "workspace reset did not fully succeed");
            self.logger.log_failure(&format!("Reset failed: {}", result.output));
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn run(&self) -> Result<RunSummary, EngineError> {
        let mut results = Vec::new();

        let Some(cwe) = self.advisory.target_class() else {
            return Err(EngineError::UnsupportedAdvisory(self.advisory.cwe_ids.clone()));
        };

        self.setup().await?;
        let ctx = self.ctx();

        let mut flow_text: Option<String> = None;
        if !self.config.no_flow {
            self.reset().await;
            let mut conversation = self.new_conversation();
            conversation.append(Role::System, SYS_PROMPT).await?;

            let diff = self.load_diff();
            match FlowReasoning::run(&mut conversation, &ctx, &self.advisory, diff.as_deref(), self.config.max_turns).await {
                Ok(flow) => {
                    self.record(&mut results, PhaseKind::FlowReasoning, PhaseOutcome::Success);
                    flow_text = Some(flow.raw);
                }
                Err(err) => {
                    info!(error = %err, "flow reasoning did not produce a flow");
                    self.record(&mut results, PhaseKind::FlowReasoning, PhaseOutcome::Failure);
                    return Ok(RunSummary {
                        results,
                        final_feedback: None,
                    });
                }
            }
        }

        let mut conditions_text: Option<String> = None;
        if !self.config.no_branch {
            self.reset().await;
            let mut conversation = self.new_conversation();
            conversation.append(Role::System, SYS_PROMPT).await?;

            match BranchReasoning::run(&mut conversation, &ctx, &self.advisory, flow_text.as_deref(), self.config.max_turns).await {
                Ok((_sequence, conditions)) => {
                    self.record(&mut results, PhaseKind::BranchReasoning, PhaseOutcome::Success);
                    conditions_text = Some(conditions.raw);
                }
                Err(err) => {
                    info!(error = %err, "branch reasoning did not produce a sequence");
                    self.record(&mut results, PhaseKind::BranchReasoning, PhaseOutcome::Failure);
                    return Ok(RunSummary {
                        results,
                        final_feedback: None,
                    });
                }
            }
        }

        self.reset().await;
        let mut conversation = self.new_conversation();
        conversation.append(Role::System, SYS_PROMPT).await?;

        match TestGen::run(
            &mut conversation,
            &ctx,
            &self.advisory,
            cwe,
            flow_text.as_deref(),
            conditions_text.as_deref(),
            self.config.max_turns,
        )
        .await
        {
            Ok(()) => self.record(&mut results, PhaseKind::TestGen, PhaseOutcome::Success),
            Err(err) => {
                info!(error = %err, "test generation did not reach <DONE>");
                self.record(&mut results, PhaseKind::TestGen, PhaseOutcome::Failure);
                return Ok(RunSummary {
                    results,
                    final_feedback: None,
                });
            }
        }

        for _ in 0..MAX_REPAIR_CYCLES {
            let feedback = self.validate().await;
            let outcome = outcome_for(feedback.status);
            self.record(&mut results, PhaseKind::Validation, outcome);

            match feedback.status {
                ValidationStatus::Correct => {
                    return Ok(RunSummary {
                        results,
                        final_feedback: Some(feedback),
                    });
                }
                ValidationStatus::Incorrect => {
                    let error = feedback.error.clone().unwrap_or_default();
                    if let Err(err) =
                        TestGen::repair(&mut conversation, &ctx, &error, self.config.max_turns).await
                    {
                        warn!(error = %err, "repair did not reach <DONE>; still running the final validate");
                    }
                }
                ValidationStatus::Failed => break,
            }
        }

        let feedback = self.validate().await;
        let outcome = outcome_for(feedback.status);
        self.record(&mut results, PhaseKind::Validation, outcome);

        Ok(RunSummary {
            results,
            final_feedback: Some(feedback),
        })
    }

    async fn validate(&self) -> ValidationFeedback {
        let started = Instant::now();
        let feedback = Validator::validate(&self.workdir, &self.project_slug, self.config.dataset_family.build_context()).await;
        self.logger.log_validation(started.elapsed());
        feedback
    }

    fn record(&self, results: &mut Vec<PhaseResult>, phase: PhaseKind, outcome: PhaseOutcome) {
        self.logger.log_result(phase, outcome);
        results.push(PhaseResult::new(phase, outcome));
    }
}

fn outcome_for(status: ValidationStatus) -> PhaseOutcome {
    match status {
        ValidationStatus::Correct => PhaseOutcome::Success,
        ValidationStatus::Incorrect => PhaseOutcome::Incorrect,
        ValidationStatus::Failed => PhaseOutcome::Failure,
    }
}


/// End-to-end scenarios driving the whole Engine against a scripted `MockLlmClient` and a
/// stand-in `docker` binary prepended to `PATH`, so `setup`/`Validator` never touch a real
/// daemon. Every scenario that reaches `Engine::setup` needs the stand-in, since `setup` runs
/// unconditionally before any phase.
#[cfg(test)]
mod e2e {
    use std::os::unix::fs::PermissionsExt;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use vulnpov_core::{DatasetFamily, LlmUsage};
    use vulnpov_llm::{ChatResponse, LlmError, MockLlmClient};

    use super::*;
    use crate::logger::NullLogger;

    /// Serializes the tests in this module against each other, since they all mutate the
    /// process-wide `PATH` environment variable to point at a scripted `docker`.
    static PATH_LOCK: StdMutex<()> = StdMutex::new(());

    struct PathGuard {
        original: Option<String>,
        _lock: std::sync::MutexGuard<'static, ()>,
    }

    impl Drop for PathGuard {
        fn drop(&mut self) {
            match &self.original {
                Some(path) => std::env::set_var("PATH", path),
                None => std::env::remove_var("PATH"),
            }
        }
    }

    fn write_fake_docker(bin_dir: &std::path::Path) {
        std::fs::create_dir_all(bin_dir).unwrap();
        let script = "#!/bin/sh\n\
case \"$1\" in\n\
  build) exit 0 ;;\n\
  run)\n\
    if [ -f Dockerfile.vuln ] && grep -q FIXED Dockerfile.vuln; then exit 0; else exit 1; fi ;;\n\
  *) exit 0 ;;\n\
esac\n";
        let path = bin_dir.join("docker");
        std::fs::write(&path, script).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
    }

    /// Prepends `bin_dir` (holding the scripted `docker`) to `PATH` for the guard's lifetime.
    fn fake_docker_path(bin_dir: &std::path::Path) -> PathGuard {
        write_fake_docker(bin_dir);
        let lock = PATH_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let original = std::env::var("PATH").ok();
        let prefixed = match &original {
            Some(path) => format!("{}:{path}", bin_dir.display()),
            None => bin_dir.display().to_string(),
        };
        std::env::set_var("PATH", prefixed);
        PathGuard { original, _lock: lock }
    }

    fn workspace_fixture(dockerfile_fixed: bool) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let marker = if dockerfile_fixed { "# FIXED\n" } else { "" };
        std::fs::write(dir.path().join("Dockerfile.vuln"), format!("FROM scratch\n{marker}")).unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/app.py"), "def handler(path):\n    open(path)\n").unwrap();
        dir
    }

    fn advisory() -> Advisory {
        Advisory::new(vec!["CWE-22".to_string()], None, "a path traversal bug".to_string())
    }

    fn ok(text: &str) -> Result<ChatResponse, LlmError> {
        ok_with_cost(text, 0.0)
    }

    fn ok_with_cost(text: &str, cost_usd: f64) -> Result<ChatResponse, LlmError> {
        Ok(ChatResponse {
            text: text.to_string(),
            usage: LlmUsage {
                input_tokens: 1,
                cached_tokens: 0,
                output_tokens: 1,
                cost_usd,
                elapsed: Duration::from_millis(1),
            },
        })
    }

    fn engine_scripted(
        dir: &std::path::Path,
        responses: Vec<Result<ChatResponse, LlmError>>,
        config: vulnpov_config::RunConfig,
    ) -> Engine {
        Engine::new(
            dir.to_path_buf(),
            "proj".to_string(),
            advisory(),
            config,
            Arc::new(MockLlmClient::with_responses(responses)),
            Arc::new(NullLogger),
        )
    }

    #[tokio::test]
    async fn happy_path_reaches_correct_on_the_first_validation() {
        let dir = workspace_fixture(true);
        let bin_dir = dir.path().join(".fakebin");
        let _guard = fake_docker_path(&bin_dir);
        let app = dir.path().join("src/app.py").display().to_string();

        let responses = vec![
            ok(&format!("<TOOL>{{\"name\": \"read\", \"file\": \"{app}\", \"start_line\": 1, \"end_line\": 2}}</TOOL>")),
            ok("<FLOW>\nsource -> sink\n</FLOW>"),
            ok("<SEQUENCE>\nif path: ...\n</SEQUENCE>"),
            ok("<CONDITIONS>\n1. path must escape the project\n</CONDITIONS>"),
            ok(&format!(
                "<TOOL>{{\"name\": \"write\", \"file\": \"{}\", \"content\": \"echo hi\"}}</TOOL>",
                dir.path().join("test.sh").display()
            )),
            ok("<DONE>"),
        ];
        let config = vulnpov_config::RunConfig { max_turns: 10, ..Default::default() };
        let engine = engine_scripted(dir.path(), responses, config);

        let summary = engine.run().await.unwrap();
        let outcomes: Vec<_> = summary.results.iter().map(|r| (r.phase, r.outcome)).collect();
        assert_eq!(
            outcomes,
            vec![
                (PhaseKind::FlowReasoning, PhaseOutcome::Success),
                (PhaseKind::BranchReasoning, PhaseOutcome::Success),
                (PhaseKind::TestGen, PhaseOutcome::Success),
                (PhaseKind::Validation, PhaseOutcome::Success),
            ]
        );
        assert!(summary.final_feedback.unwrap().is_correct());
    }

    #[tokio::test]
    async fn repair_converges_to_correct_on_the_second_validation() {
        let dir = workspace_fixture(false);
        let bin_dir = dir.path().join(".fakebin");
        let _guard = fake_docker_path(&bin_dir);
        let app = dir.path().join("src/app.py").display().to_string();
        let dockerfile = dir.path().join("Dockerfile.vuln").display().to_string();

        let responses = vec![
            ok(&format!("<TOOL>{{\"name\": \"read\", \"file\": \"{app}\", \"start_line\": 1, \"end_line\": 2}}</TOOL>")),
            ok("<FLOW>\nsource -> sink\n</FLOW>"),
            ok("<SEQUENCE>\nif path: ...\n</SEQUENCE>"),
            ok("<CONDITIONS>\n1. path must escape the project\n</CONDITIONS>"),
            ok(&format!(
                "<TOOL>{{\"name\": \"write\", \"file\": \"{}\", \"content\": \"echo hi\"}}</TOOL>",
                dir.path().join("test.sh").display()
            )),
            ok("<DONE>"),
            // First validate() fails (no FIXED marker). Repair rewrites Dockerfile.vuln.
            ok(&format!(
                "<TOOL>{{\"name\": \"write\", \"file\": \"{dockerfile}\", \"content\": \"FROM scratch\\n# FIXED\\n\"}}</TOOL>"
            )),
            ok("<DONE>"),
        ];
        let config = vulnpov_config::RunConfig { max_turns: 10, ..Default::default() };
        let engine = engine_scripted(dir.path(), responses, config);

        let summary = engine.run().await.unwrap();
        let validations: Vec<_> = summary
            .results
            .iter()
            .filter(|r| r.phase == PhaseKind::Validation)
            .map(|r| r.outcome)
            .collect();
        assert_eq!(validations, vec![PhaseOutcome::Incorrect, PhaseOutcome::Success]);
        assert!(summary.final_feedback.unwrap().is_correct());
    }

    #[tokio::test]
    async fn budget_exhaustion_mid_phase_is_a_flow_failure_with_no_downstream_rows() {
        let dir = workspace_fixture(true);
        let bin_dir = dir.path().join(".fakebin");
        let _guard = fake_docker_path(&bin_dir);

        // One tool invocation that dispatches successfully but whose cost already clears the
        // budget; the reason-act loop's post-dispatch `append` is where the overage surfaces.
        let responses = vec![ok_with_cost(
            &format!("<TOOL>{{\"name\": \"listdir\", \"directory\": \"{}\"}}</TOOL>", dir.path().display()),
            0.02,
        )];
        let config = vulnpov_config::RunConfig { max_turns: 10, budget_usd: 0.01, ..Default::default() };
        let engine = engine_scripted(dir.path(), responses, config);

        let summary = engine.run().await.unwrap();
        assert_eq!(
            summary.results,
            vec![PhaseResult::new(PhaseKind::FlowReasoning, PhaseOutcome::Failure)]
        );
        assert!(summary.final_feedback.is_none());
    }

    #[tokio::test]
    async fn flow_without_a_terminator_fails_before_branch_or_test_gen_ever_run() {
        let dir = workspace_fixture(true);
        let bin_dir = dir.path().join(".fakebin");
        let _guard = fake_docker_path(&bin_dir);

        let responses = vec![ok("still thinking"), ok("still no flow tags")];
        let config = vulnpov_config::RunConfig { max_turns: 2, ..Default::default() };
        let engine = engine_scripted(dir.path(), responses, config);

        let summary = engine.run().await.unwrap();
        assert_eq!(
            summary.results,
            vec![PhaseResult::new(PhaseKind::FlowReasoning, PhaseOutcome::Failure)]
        );
        assert!(summary.final_feedback.is_none());
    }

    #[tokio::test]
    async fn malformed_tool_invocation_self_corrects_on_the_next_turn() {
        let dir = workspace_fixture(true);
        let bin_dir = dir.path().join(".fakebin");
        let _guard = fake_docker_path(&bin_dir);

        let responses = vec![
            ok("<TOOL>{not json}</TOOL>"),
            ok("<FLOW>\nsource -> sink\n</FLOW>"),
            ok("<SEQUENCE>\nif path: ...\n</SEQUENCE>"),
            ok("<CONDITIONS>\n1. path must escape the project\n</CONDITIONS>"),
            ok("<DONE>"),
        ];
        let config = vulnpov_config::RunConfig { max_turns: 10, ..Default::default() };
        let engine = engine_scripted(dir.path(), responses, config);

        let summary = engine.run().await.unwrap();
        assert!(
            summary
                .results
                .iter()
                .any(|r| r.phase == PhaseKind::FlowReasoning && r.outcome == PhaseOutcome::Success)
        );
    }

    #[tokio::test]
    async fn reset_preserves_the_protected_set_and_drops_everything_else() {
        let dir = tempfile::tempdir().unwrap();
        let workdir = dir.path();
        std::fs::write(workdir.join("Dockerfile.vuln"), "FROM scratch\n# modified\n").unwrap();
        std::fs::write(workdir.join(".Dockerfile.backup"), "FROM scratch\n").unwrap();
        std::fs::write(workdir.join(".build_diff.patch"), "diff --git a b\n").unwrap();

        let init = std::process::Command::new("git").arg("init").current_dir(workdir).output().unwrap();
        assert!(init.status.success());
        std::process::Command::new("git")
            .args(["add", "-A"])
            .current_dir(workdir)
            .output()
            .unwrap();
        std::process::Command::new("git")
            .args(["-c", "user.email=t@t", "-c", "user.name=t", "commit", "-m", "init"])
            .current_dir(workdir)
            .output()
            .unwrap();

        std::fs::write(workdir.join("junk.txt"), "scratch output").unwrap();

        let config = vulnpov_config::RunConfig::default();
        let engine = Engine::new(
            workdir.to_path_buf(),
            "proj".to_string(),
            advisory(),
            config,
            Arc::new(MockLlmClient::new(vec![])),
            Arc::new(NullLogger),
        );

        engine.reset().await;

        assert!(!workdir.join("junk.txt").exists());
        assert_eq!(
            std::fs::read_to_string(workdir.join("Dockerfile.vuln")).unwrap(),
            std::fs::read_to_string(workdir.join(".Dockerfile.backup")).unwrap()
        );
        assert!(workdir.join(".build_diff.patch").exists());
    }
}
