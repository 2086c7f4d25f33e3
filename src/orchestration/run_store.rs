use crate::orchestration::error::OrchestratorError;
use crate::orchestration::progress_log::{ProgressLog, PROGRESS_LOG_FILE_NAME};
use crate::orchestration::run::WorkflowRun;
use crate::shared::fs_atomic::atomic_write_file;
use crate::shared::ids::{sanitize_file_name, sanitize_identifier};
use crate::shared::logging::{append_engine_log_line, engine_log_path};
use std::fs;
use std::path::{Path, PathBuf};

pub const STEP_OUTPUTS_DIR: &str = "step-outputs";
const RUN_RECORD_FILE_NAME: &str = "run.json";

/// Rejects run ids that would change under filename sanitization.
pub fn validate_run_id(run_id: &str) -> Result<&str, OrchestratorError> {
    let sanitized = sanitize_identifier(run_id);
    if sanitized.is_empty() || sanitized != run_id {
        return Err(OrchestratorError::InvalidId {
            run_id: run_id.to_string(),
        });
    }
    Ok(run_id)
}

/// File name for a step's artifact: the sanitized output hint, or
/// `<step_id>.md` when there is no usable hint.
pub fn step_artifact_file_name(step_id: &str, output_hint: Option<&str>) -> String {
    output_hint
        .and_then(sanitize_file_name)
        .unwrap_or_else(|| format!("{}.md", sanitize_identifier(step_id)))
}

/// Per-run directory layout under `<state_root>/runs/<run_id>/`.
#[derive(Debug, Clone)]
pub struct WorkflowRunStore {
    state_root: PathBuf,
}

impl WorkflowRunStore {
    pub fn new(state_root: impl Into<PathBuf>) -> Self {
        Self {
            state_root: state_root.into(),
        }
    }

    pub fn state_root(&self) -> &Path {
        &self.state_root
    }

    pub fn run_dir(&self, run_id: &str) -> Result<PathBuf, OrchestratorError> {
        let run_id = validate_run_id(run_id)?;
        Ok(self.state_root.join("runs").join(run_id))
    }

    pub fn step_outputs_dir(&self, run_id: &str) -> Result<PathBuf, OrchestratorError> {
        Ok(self.run_dir(run_id)?.join(STEP_OUTPUTS_DIR))
    }

    pub fn progress_log(&self, run_id: &str) -> Result<ProgressLog, OrchestratorError> {
        Ok(ProgressLog::new(
            self.run_dir(run_id)?.join(PROGRESS_LOG_FILE_NAME),
        ))
    }

    pub fn write_step_artifact(
        &self,
        run_id: &str,
        step_id: &str,
        output_hint: Option<&str>,
        content: &str,
    ) -> Result<PathBuf, OrchestratorError> {
        let path = self
            .step_outputs_dir(run_id)?
            .join(step_artifact_file_name(step_id, output_hint));
        atomic_write_file(&path, content.as_bytes()).map_err(|err| io_error(&path, err))?;
        Ok(path)
    }

    pub fn list_step_artifacts(&self, run_id: &str) -> Result<Vec<PathBuf>, OrchestratorError> {
        let dir = self.step_outputs_dir(run_id)?;
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut paths = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|err| io_error(&dir, err))? {
            let path = entry.map_err(|err| io_error(&dir, err))?.path();
            if path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    pub fn persist_run(&self, run: &WorkflowRun) -> Result<PathBuf, OrchestratorError> {
        let path = self.run_dir(&run.id)?.join(RUN_RECORD_FILE_NAME);
        let body = serde_json::to_vec_pretty(run).map_err(|err| json_error(&path, err))?;
        atomic_write_file(&path, &body).map_err(|err| io_error(&path, err))?;
        Ok(path)
    }

    pub fn load_run(&self, run_id: &str) -> Result<WorkflowRun, OrchestratorError> {
        let path = self.run_dir(run_id)?.join(RUN_RECORD_FILE_NAME);
        let raw = fs::read_to_string(&path).map_err(|err| io_error(&path, err))?;
        serde_json::from_str(&raw).map_err(|err| json_error(&path, err))
    }

    pub fn run_exists(&self, run_id: &str) -> bool {
        self.run_dir(run_id)
            .map(|dir| dir.join(RUN_RECORD_FILE_NAME).is_file())
            .unwrap_or(false)
    }

    pub fn append_engine_log(
        &self,
        run_id: &str,
        now: i64,
        message: impl AsRef<str>,
    ) -> Result<(), OrchestratorError> {
        let line = format!("ts={now} run_id={run_id} {}", message.as_ref());
        append_engine_log_line(&self.state_root, &line)
            .map_err(|source| io_error(engine_log_path(&self.state_root).as_path(), source))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> OrchestratorError {
    OrchestratorError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn json_error(path: &Path, source: serde_json::Error) -> OrchestratorError {
    OrchestratorError::Json {
        path: path.display().to_string(),
        source,
    }
}
