use crate::app::command_support::{now_secs, open_policy_store};
use crate::config::{Settings, WorkflowDefinition};
use crate::orchestration::{StepExecutor, WorkflowEngine, WorkflowRun, WorkflowRunStore};
use crate::session::ProcessSessionSpawner;
use crate::tasks::{FileTaskStore, TaskStore};
use getrandom::getrandom;
use std::path::Path;
use std::sync::Arc;

const BASE36_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const RUN_SUFFIX_SPACE: u32 = 36 * 36 * 36 * 36;
const RUN_ID_MAX_GENERATION_ATTEMPTS: usize = 16;

pub fn cmd_run(settings: &Settings, args: &[String]) -> Result<String, String> {
    if args.len() != 2 {
        return Err("usage: run <workflow.yaml> <task_id>".to_string());
    }
    let workflow = WorkflowDefinition::from_path(Path::new(&args[0])).map_err(|e| e.to_string())?;

    let tasks = FileTaskStore::new(settings.tasks_dir());
    let task = tasks
        .get_task(&args[1])
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("unknown task `{}`", args[1]))?;

    let run_store = WorkflowRunStore::new(&settings.state_root);
    let run_id = allocate_compact_run_id_with_retry(&run_store, now_secs())?;
    let mut run = WorkflowRun::new(run_id, workflow.id.clone(), task.id.clone());
    if !task.title.trim().is_empty() {
        run.task_title = Some(task.title.clone());
    }
    run_store.persist_run(&run).map_err(|e| e.to_string())?;

    let policies = Arc::new(open_policy_store(settings)?);
    let spawner = ProcessSessionSpawner::new(&settings.state_root)
        .with_binary(settings.agent_binary.clone())
        .with_transcript_dir(settings.transcripts_dir());
    let executor = StepExecutor::new(workflow, run_store, policies, Box::new(spawner))
        .with_default_fresh_session(settings.default_fresh_session);
    let engine = WorkflowEngine::new(executor);

    let results = engine
        .run(&mut run)
        .map_err(|e| format!("run `{}` failed: {e}", run.id))?;

    let mut lines = vec![format!("run_id={}", run.id)];
    for result in results {
        let mut line = format!(
            "step={} artifact={}",
            result.step_id,
            result.artifact_path.display()
        );
        if let Some(warning) = result.parse_warning {
            line.push_str(&format!(" warning={warning}"));
        }
        lines.push(line);
    }
    Ok(lines.join("\n"))
}

fn base36_encode_u64(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut chars = Vec::new();
    while value > 0 {
        chars.push(BASE36_ALPHABET[(value % 36) as usize] as char);
        value /= 36;
    }
    chars.iter().rev().collect()
}

fn base36_encode_fixed_u32(mut value: u32, width: usize) -> String {
    let mut chars = vec!['0'; width];
    for idx in (0..width).rev() {
        chars[idx] = BASE36_ALPHABET[(value % 36) as usize] as char;
        value /= 36;
    }
    chars.into_iter().collect()
}

pub fn generate_compact_run_id(now: i64) -> Result<String, String> {
    let timestamp =
        u64::try_from(now).map_err(|_| "run requires a non-negative timestamp".to_string())?;
    let mut bytes = [0_u8; 4];
    getrandom(&mut bytes).map_err(|err| format!("failed to generate run id randomness: {err}"))?;
    let sample = u32::from_le_bytes(bytes) % RUN_SUFFIX_SPACE;
    Ok(format!(
        "run-{}-{}",
        base36_encode_u64(timestamp),
        base36_encode_fixed_u32(sample, 4)
    ))
}

fn allocate_compact_run_id_with_retry(
    run_store: &WorkflowRunStore,
    now: i64,
) -> Result<String, String> {
    for _ in 0..RUN_ID_MAX_GENERATION_ATTEMPTS {
        let run_id = generate_compact_run_id(now)?;
        if !run_store.run_exists(&run_id) {
            return Ok(run_id);
        }
    }
    Err(format!(
        "failed to allocate unique run id after {RUN_ID_MAX_GENERATION_ATTEMPTS} attempts"
    ))
}
