use chrono::{TimeZone, Utc};
use direflow::config::{
    CleanupMode, ContextMode, SessionMode, StepSessionOverride, StepType, WorkflowAgent,
    WorkflowDefinition, WorkflowStep,
};
use direflow::orchestration::progress_log::AppendOutcome;
use direflow::orchestration::{
    OrchestratorError, StepExecutor, WorkflowRun, WorkflowRunStore,
};
use direflow::policy::ToolPolicyStore;
use direflow::session::{SessionError, SessionOutput, SessionRequest, SessionSpawner};
use serde_json::json;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct SpawnLog {
    requests: Vec<SessionRequest>,
    cleaned: Vec<String>,
}

struct ScriptedSpawner {
    text: String,
    handle: Option<String>,
    fail: bool,
    log: Arc<Mutex<SpawnLog>>,
}

impl ScriptedSpawner {
    fn new(text: &str, handle: Option<&str>) -> (Self, Arc<Mutex<SpawnLog>>) {
        let log = Arc::new(Mutex::new(SpawnLog::default()));
        (
            Self {
                text: text.to_string(),
                handle: handle.map(str::to_string),
                fail: false,
                log: log.clone(),
            },
            log,
        )
    }
}

impl SessionSpawner for ScriptedSpawner {
    fn spawn(&self, request: &SessionRequest) -> Result<SessionOutput, SessionError> {
        self.log
            .lock()
            .expect("spawn log")
            .requests
            .push(request.clone());
        if self.fail {
            return Err(SessionError::NonZeroExit {
                exit_code: 2,
                stderr: "agent crashed".to_string(),
            });
        }
        Ok(SessionOutput {
            text: self.text.clone(),
            handle: self.handle.clone(),
        })
    }

    fn cleanup(&self, handle: &str) -> Result<(), SessionError> {
        self.log
            .lock()
            .expect("spawn log")
            .cleaned
            .push(handle.to_string());
        Ok(())
    }
}

fn workflow(steps: Vec<WorkflowStep>) -> WorkflowDefinition {
    WorkflowDefinition {
        id: "feature".to_string(),
        fresh_session: None,
        agents: vec![WorkflowAgent {
            id: "architect".to_string(),
            role: "planner".to_string(),
            model: Some("opus".to_string()),
        }],
        steps,
    }
}

fn plan_step() -> WorkflowStep {
    let mut step = WorkflowStep::agent_step("plan", "Plan task {{task.id}} for run {{runId}}");
    step.agent = Some("architect".to_string());
    step
}

fn executor(
    root: &Path,
    definition: WorkflowDefinition,
    spawner: ScriptedSpawner,
) -> StepExecutor {
    let policies =
        Arc::new(ToolPolicyStore::open(root.join("policies"), 100).expect("open policies"));
    StepExecutor::new(
        definition,
        WorkflowRunStore::new(root),
        policies,
        Box::new(spawner),
    )
}

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5)
        .single()
        .expect("timestamp")
}

#[test]
fn agent_step_renders_prompt_applies_role_filter_and_persists_output() {
    let temp = tempfile::tempdir().expect("tempdir");
    let (spawner, log) = ScriptedSpawner::new("STATUS: planned", None);
    let exec = executor(temp.path(), workflow(vec![plan_step()]), spawner);
    let run = WorkflowRun::new("run-1", "feature", "task-9");

    let result = exec
        .execute(&plan_step(), &run, now())
        .expect("execute plan");

    assert_eq!(result.output, json!("STATUS: planned"));
    assert_eq!(result.raw_output, "STATUS: planned");
    assert_eq!(result.parse_warning, None);
    assert_eq!(result.progress, AppendOutcome::Appended);
    assert_eq!(
        result.artifact_path,
        temp.path().join("runs/run-1/step-outputs/plan.md")
    );
    assert_eq!(
        fs::read_to_string(&result.artifact_path).expect("artifact"),
        "STATUS: planned"
    );
    let progress = fs::read_to_string(temp.path().join("runs/run-1/progress.md"))
        .expect("progress log");
    assert_eq!(
        progress,
        "## Step: plan (2026-01-02T03:04:05.000Z)\n\nSTATUS: planned\n\n---\n\n"
    );

    let log = log.lock().expect("spawn log");
    assert_eq!(log.requests.len(), 1);
    let request = &log.requests[0];
    assert_eq!(request.prompt, "Plan task task-9 for run run-1");
    assert_eq!(request.model.as_deref(), Some("opus"));
    assert_eq!(request.mode, SessionMode::Fresh);
    assert_eq!(request.timeout.as_secs(), 600);
    let denied = request.tool_filter.denied.clone().expect("planner denies");
    assert!(denied.contains(&"Write".to_string()));

    let engine_log =
        fs::read_to_string(temp.path().join("logs/engine.log")).expect("engine log");
    assert!(engine_log.contains("run_id=run-1 step_id=plan"));
}

#[test]
fn structured_hint_parses_yaml_and_names_artifact() {
    let temp = tempfile::tempdir().expect("tempdir");
    let (spawner, _log) = ScriptedSpawner::new("```yaml\nstatus: done\nfiles: [a.rs]\n```", None);
    let mut step = plan_step();
    step.output = Some("plans/../plan.yaml".to_string());
    let exec = executor(temp.path(), workflow(vec![step.clone()]), spawner);

    let result = exec
        .execute(&step, &WorkflowRun::new("run-1", "feature", "t"), now())
        .expect("execute");
    assert_eq!(result.output, json!({"status": "done", "files": ["a.rs"]}));
    assert_eq!(
        result.artifact_path,
        temp.path().join("runs/run-1/step-outputs/plan.yaml")
    );
}

#[test]
fn unparseable_structured_output_falls_back_with_warning() {
    let temp = tempfile::tempdir().expect("tempdir");
    let (spawner, _log) = ScriptedSpawner::new("definitely { not json", None);
    let mut step = plan_step();
    step.output = Some("result.json".to_string());
    let exec = executor(temp.path(), workflow(vec![step.clone()]), spawner);

    let result = exec
        .execute(&step, &WorkflowRun::new("run-1", "feature", "t"), now())
        .expect("execute");
    assert_eq!(result.output, json!("definitely { not json"));
    assert!(result.parse_warning.is_some());
    assert!(result.artifact_path.is_file());
}

#[test]
fn failed_acceptance_writes_no_artifact_or_progress_but_still_cleans_up() {
    let temp = tempfile::tempdir().expect("tempdir");
    let (spawner, log) = ScriptedSpawner::new("STATUS: blocked", Some("sess-1"));
    let mut step = plan_step();
    step.acceptance = vec!["STATUS: blocked".to_string(), "TESTS: pass".to_string()];
    let exec = executor(temp.path(), workflow(vec![step.clone()]), spawner);

    let err = exec
        .execute(&step, &WorkflowRun::new("run-1", "feature", "t"), now())
        .expect_err("acceptance should fail");
    match err {
        OrchestratorError::AcceptanceFailed { step_id, criterion } => {
            assert_eq!(step_id, "plan");
            assert_eq!(criterion, "TESTS: pass");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!temp.path().join("runs/run-1/step-outputs").exists());
    assert!(!temp.path().join("runs/run-1/progress.md").exists());
    assert_eq!(
        log.lock().expect("spawn log").cleaned,
        vec!["sess-1".to_string()]
    );
}

#[test]
fn unwritable_engine_log_does_not_fail_a_persisted_step() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("logs"), "not a directory").expect("block logs dir");
    let (spawner, log) = ScriptedSpawner::new("STATUS: planned", Some("sess-7"));
    let exec = executor(temp.path(), workflow(vec![plan_step()]), spawner);
    let run = WorkflowRun::new("run-1", "feature", "t");

    let result = exec
        .execute(&plan_step(), &run, now())
        .expect("step succeeds without engine log");

    assert_eq!(result.progress, AppendOutcome::Appended);
    assert_eq!(
        fs::read_to_string(&result.artifact_path).expect("artifact"),
        "STATUS: planned"
    );
    assert!(temp.path().join("runs/run-1/progress.md").is_file());
    assert!(temp.path().join("logs").is_file());
    assert_eq!(
        log.lock().expect("spawn log").cleaned,
        vec!["sess-7".to_string()]
    );
}

#[test]
fn non_agent_step_types_fail_fast_without_spawning() {
    let temp = tempfile::tempdir().expect("tempdir");
    let (spawner, log) = ScriptedSpawner::new("unused", None);
    let exec = executor(temp.path(), workflow(vec![plan_step()]), spawner);
    let run = WorkflowRun::new("run-1", "feature", "t");

    for step_type in [StepType::Loop, StepType::Gate, StepType::Parallel] {
        let mut step = plan_step();
        step.step_type = step_type;
        match exec.execute(&step, &run, now()) {
            Err(OrchestratorError::UnsupportedStepType {
                step_id,
                step_type: reported,
            }) => {
                assert_eq!(step_id, "plan");
                assert_eq!(reported, step_type);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
    assert!(log.lock().expect("spawn log").requests.is_empty());
}

#[test]
fn unsafe_run_id_is_rejected_before_any_io() {
    let temp = tempfile::tempdir().expect("tempdir");
    let (spawner, log) = ScriptedSpawner::new("unused", None);
    let exec = executor(temp.path(), workflow(vec![plan_step()]), spawner);

    let err = exec
        .execute(
            &plan_step(),
            &WorkflowRun::new("../escape", "feature", "t"),
            now(),
        )
        .expect_err("invalid run id");
    assert!(matches!(err, OrchestratorError::InvalidId { .. }));
    assert!(!temp.path().join("runs").exists());
    assert!(log.lock().expect("spawn log").requests.is_empty());
}

#[test]
fn cleanup_follows_resolved_cleanup_mode() {
    let temp = tempfile::tempdir().expect("tempdir");
    let (spawner, log) = ScriptedSpawner::new("done", Some("sess-42"));
    let mut keep = plan_step();
    keep.id = "keep".to_string();
    keep.session = Some(StepSessionOverride {
        cleanup: Some(CleanupMode::Keep),
        ..StepSessionOverride::default()
    });
    let exec = executor(
        temp.path(),
        workflow(vec![plan_step(), keep.clone()]),
        spawner,
    );
    let run = WorkflowRun::new("run-1", "feature", "t");

    let result = exec.execute(&plan_step(), &run, now()).expect("plan");
    assert_eq!(result.session_handle.as_deref(), Some("sess-42"));
    exec.execute(&keep, &run, now()).expect("keep");

    assert_eq!(
        log.lock().expect("spawn log").cleaned,
        vec!["sess-42".to_string()]
    );
}

#[test]
fn undeclared_agent_runs_without_tool_restrictions() {
    let temp = tempfile::tempdir().expect("tempdir");
    let (spawner, log) = ScriptedSpawner::new("ok", None);
    let mut step = plan_step();
    step.agent = Some("ghost".to_string());
    let exec = executor(temp.path(), workflow(vec![step.clone()]), spawner);

    exec.execute(&step, &WorkflowRun::new("run-1", "feature", "t"), now())
        .expect("execute");
    let log = log.lock().expect("spawn log");
    assert!(log.requests[0].tool_filter.is_unrestricted());
    assert_eq!(log.requests[0].model, None);
}

#[test]
fn session_failures_are_wrapped_with_step_id() {
    let temp = tempfile::tempdir().expect("tempdir");
    let (mut spawner, _log) = ScriptedSpawner::new("", None);
    spawner.fail = true;
    let exec = executor(temp.path(), workflow(vec![plan_step()]), spawner);

    match exec.execute(&plan_step(), &WorkflowRun::new("run-1", "feature", "t"), now()) {
        Err(OrchestratorError::Session { step_id, source }) => {
            assert_eq!(step_id, "plan");
            assert!(matches!(source, SessionError::NonZeroExit { exit_code: 2, .. }));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(!temp.path().join("runs/run-1/progress.md").exists());
}

#[test]
fn workflow_and_global_fresh_defaults_select_session_mode() {
    let temp = tempfile::tempdir().expect("tempdir");
    let (spawner, log) = ScriptedSpawner::new("ok", None);
    let mut definition = workflow(vec![plan_step()]);
    definition.fresh_session = None;
    let exec = executor(temp.path(), definition, spawner).with_default_fresh_session(Some(false));
    let run = WorkflowRun::new("run-1", "feature", "t");

    exec.execute(&plan_step(), &run, now()).expect("inherit global");
    let mut fresh = plan_step();
    fresh.fresh_session = Some(true);
    exec.execute(&fresh, &run, now()).expect("step override");

    let log = log.lock().expect("spawn log");
    assert_eq!(log.requests[0].mode, SessionMode::Reuse);
    assert_eq!(log.requests[1].mode, SessionMode::Fresh);
}

#[test]
fn progress_from_earlier_steps_reaches_later_prompts() {
    let temp = tempfile::tempdir().expect("tempdir");
    let (spawner, log) = ScriptedSpawner::new("first output", None);
    let mut review = WorkflowStep::agent_step("review", "Log so far:\n{{progress}}");
    review.session = Some(StepSessionOverride {
        context: Some(ContextMode::Minimal),
        ..StepSessionOverride::default()
    });
    let exec = executor(
        temp.path(),
        workflow(vec![plan_step(), review.clone()]),
        spawner,
    );
    let run = WorkflowRun::new("run-1", "feature", "t");

    exec.execute(&plan_step(), &run, now()).expect("plan");
    exec.execute(&review, &run, now()).expect("review");

    let log = log.lock().expect("spawn log");
    assert!(log.requests[1].prompt.contains("## Step: plan ("));
    assert!(log.requests[1].prompt.contains("first output"));
}
