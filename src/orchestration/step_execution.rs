use crate::config::{CleanupMode, StepType, WorkflowAgent, WorkflowDefinition, WorkflowStep};
use crate::orchestration::acceptance::validate_acceptance;
use crate::orchestration::error::OrchestratorError;
use crate::orchestration::progress_log::{AppendOutcome, ProgressLog};
use crate::orchestration::prompt_render::render_template;
use crate::orchestration::run::WorkflowRun;
use crate::orchestration::run_store::{validate_run_id, WorkflowRunStore};
use crate::orchestration::session_config::resolve_session_config;
use crate::orchestration::session_context::build_session_context;
use crate::orchestration::structured_output::{parse_step_output, ParsedOutput};
use crate::policy::{ToolFilter, ToolPolicyStore};
use crate::session::{SessionRequest, SessionSpawner};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub step_id: String,
    /// Structured output when the output hint asked for YAML/JSON and it
    /// parsed, otherwise the raw text.
    pub output: Value,
    pub raw_output: String,
    pub artifact_path: PathBuf,
    pub session_handle: Option<String>,
    pub parse_warning: Option<String>,
    pub progress: AppendOutcome,
}

/// Executes single workflow steps against a run.
///
/// The policy store and session runtime are injected; the executor holds no
/// process-wide state.
pub struct StepExecutor {
    workflow: WorkflowDefinition,
    run_store: WorkflowRunStore,
    policies: Arc<ToolPolicyStore>,
    spawner: Box<dyn SessionSpawner>,
    default_fresh_session: Option<bool>,
}

impl StepExecutor {
    pub fn new(
        workflow: WorkflowDefinition,
        run_store: WorkflowRunStore,
        policies: Arc<ToolPolicyStore>,
        spawner: Box<dyn SessionSpawner>,
    ) -> Self {
        Self {
            workflow,
            run_store,
            policies,
            spawner,
            default_fresh_session: None,
        }
    }

    /// Global fresh-session default, consulted when the workflow does not set
    /// its own.
    pub fn with_default_fresh_session(mut self, fresh: Option<bool>) -> Self {
        self.default_fresh_session = fresh;
        self
    }

    pub fn workflow(&self) -> &WorkflowDefinition {
        &self.workflow
    }

    pub fn run_store(&self) -> &WorkflowRunStore {
        &self.run_store
    }

    pub fn execute(
        &self,
        step: &WorkflowStep,
        run: &WorkflowRun,
        now: DateTime<Utc>,
    ) -> Result<StepResult, OrchestratorError> {
        validate_run_id(&run.id)?;
        match step.step_type {
            StepType::Agent => self.execute_agent_step(step, run, now),
            StepType::Loop | StepType::Gate | StepType::Parallel => {
                Err(OrchestratorError::UnsupportedStepType {
                    step_id: step.id.clone(),
                    step_type: step.step_type,
                })
            }
        }
    }

    fn resolve_agent(&self, step: &WorkflowStep) -> Option<&WorkflowAgent> {
        let agent_id = step.agent.as_deref()?;
        let agent = self.workflow.agent(agent_id);
        if agent.is_none() {
            warn!(
                step_id = %step.id,
                agent_id,
                "step references an undeclared agent; running without a role"
            );
        }
        agent
    }

    fn execute_agent_step(
        &self,
        step: &WorkflowStep,
        run: &WorkflowRun,
        now: DateTime<Utc>,
    ) -> Result<StepResult, OrchestratorError> {
        let agent = self.resolve_agent(step);
        let session = resolve_session_config(
            step,
            self.workflow.fresh_session.or(self.default_fresh_session),
        );
        let progress_log = self.run_store.progress_log(&run.id)?;
        let progress = progress_log.read()?;
        let context = build_session_context(&session, run, progress.as_deref());
        let prompt = render_template(&step.input, &context);
        let tool_filter = match agent {
            Some(agent) => self.policies.tool_filter_for_role(&agent.role)?,
            None => ToolFilter::default(),
        };

        let request = SessionRequest {
            prompt,
            tool_filter,
            timeout: Duration::from_secs(session.timeout),
            model: agent.and_then(|agent| agent.model.clone()),
            mode: session.mode,
        };
        debug!(
            run_id = %run.id,
            step_id = %step.id,
            role = agent.map(|agent| agent.role.as_str()).unwrap_or("<none>"),
            mode = ?session.mode,
            context = ?session.context,
            "dispatching agent step"
        );
        let output =
            self.spawner
                .spawn(&request)
                .map_err(|source| OrchestratorError::Session {
                    step_id: step.id.clone(),
                    source,
                })?;

        let recorded = self.record_output(step, run, &progress_log, &output.text, now);

        if session.cleanup == CleanupMode::Delete {
            if let Some(handle) = output.handle.as_deref() {
                if let Err(err) = self.spawner.cleanup(handle) {
                    warn!(step_id = %step.id, handle, error = %err, "session cleanup failed");
                }
            }
        }
        let (parsed, artifact_path, progress) = recorded?;
        info!(run_id = %run.id, step_id = %step.id, "step completed");

        Ok(StepResult {
            step_id: step.id.clone(),
            output: parsed.value,
            raw_output: output.text,
            artifact_path,
            session_handle: output.handle,
            parse_warning: parsed.warning,
            progress,
        })
    }

    /// Parses, checks acceptance and persists the session output. Nothing is
    /// written when acceptance fails.
    fn record_output(
        &self,
        step: &WorkflowStep,
        run: &WorkflowRun,
        progress_log: &ProgressLog,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<(ParsedOutput, PathBuf, AppendOutcome), OrchestratorError> {
        let parsed = parse_step_output(step.output.as_deref(), text);
        if let Some(reason) = &parsed.warning {
            warn!(step_id = %step.id, reason = %reason, "using raw step output");
        }

        validate_acceptance(&step.id, &step.acceptance, text)?;

        let artifact_path =
            self.run_store
                .write_step_artifact(&run.id, &step.id, step.output.as_deref(), text)?;
        let progress = progress_log.append(&step.id, text, now)?;
        if let Err(err) = self.run_store.append_engine_log(
            &run.id,
            now.timestamp(),
            format!(
                "step_id={} artifact={} progress={:?}",
                step.id,
                artifact_path.display(),
                progress
            ),
        ) {
            warn!(run_id = %run.id, step_id = %step.id, error = %err, "engine log append failed");
        }
        Ok((parsed, artifact_path, progress))
    }
}
