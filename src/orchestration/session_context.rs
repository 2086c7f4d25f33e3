use crate::config::ContextMode;
use crate::orchestration::run::{StepStatus, WorkflowRun};
use crate::orchestration::session_config::StepSessionConfig;
use serde_json::{Map, Value};

fn base_context(run: &WorkflowRun) -> Map<String, Value> {
    let mut task = Map::from_iter([("id".to_string(), Value::String(run.task_id.clone()))]);
    if let Some(title) = &run.task_title {
        task.insert("title".to_string(), Value::String(title.clone()));
    }
    Map::from_iter([
        ("task".to_string(), Value::Object(task)),
        (
            "workflow".to_string(),
            Value::Object(Map::from_iter([
                ("id".to_string(), Value::String(run.workflow_id.clone())),
                ("runId".to_string(), Value::String(run.id.clone())),
            ])),
        ),
        (
            "workflowId".to_string(),
            Value::String(run.workflow_id.clone()),
        ),
        ("runId".to_string(), Value::String(run.id.clone())),
    ])
}

fn step_entry(run: &WorkflowRun, step_id: &str) -> Option<Value> {
    let output = run.context.get(step_id)?;
    let record = run.step_run(step_id);
    Some(Value::Object(Map::from_iter([
        ("output".to_string(), output.clone()),
        (
            "status".to_string(),
            record
                .map(|step| Value::String(step.status.to_string()))
                .unwrap_or(Value::Null),
        ),
        (
            "duration".to_string(),
            record
                .and_then(|step| step.duration_ms)
                .map(Value::from)
                .unwrap_or(Value::Null),
        ),
    ])))
}

/// Projects run state into what a spawned session may see, per the step's
/// context mode.
pub fn build_session_context(
    config: &StepSessionConfig,
    run: &WorkflowRun,
    progress: Option<&str>,
) -> Map<String, Value> {
    let progress = Value::String(progress.unwrap_or_default().to_string());

    match &config.context {
        ContextMode::Minimal => {
            let mut context = base_context(run);
            context.insert("progress".to_string(), progress);
            context
        }
        ContextMode::Full => {
            let mut context = run.context.clone();
            context.extend(base_context(run));
            context.insert("progress".to_string(), progress);
            let steps = run
                .steps
                .iter()
                .filter(|step| step.status == StepStatus::Completed)
                .filter_map(|step| {
                    step_entry(run, &step.step_id).map(|entry| (step.step_id.clone(), entry))
                })
                .collect::<Map<_, _>>();
            context.insert("steps".to_string(), Value::Object(steps));
            context
        }
        ContextMode::Custom => {
            let mut context = base_context(run);
            context.insert("progress".to_string(), progress);
            let steps = config
                .include_outputs_from
                .iter()
                .filter_map(|step_id| {
                    step_entry(run, step_id).map(|entry| (step_id.clone(), entry))
                })
                .collect::<Map<_, _>>();
            context.insert("steps".to_string(), Value::Object(steps));
            context
        }
        ContextMode::Other(_) => base_context(run),
    }
}
