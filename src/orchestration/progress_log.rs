use crate::orchestration::error::OrchestratorError;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const PROGRESS_LOG_FILE_NAME: &str = "progress.md";
pub const PROGRESS_LOG_MAX_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended,
    SkippedCeiling,
}

pub fn format_progress_entry(step_id: &str, output: &str, at: DateTime<Utc>) -> String {
    format!(
        "## Step: {step_id} ({})\n\n{output}\n\n---\n\n",
        at.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

/// Append-only markdown record of a run's step outputs.
///
/// The size check before each append is read-then-act; it relies on steps of
/// a run executing one at a time.
#[derive(Debug, Clone)]
pub struct ProgressLog {
    path: PathBuf,
    max_bytes: u64,
}

impl ProgressLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_bytes: PROGRESS_LOG_MAX_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<Option<String>, OrchestratorError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error(&self.path, err)),
        }
    }

    pub fn append(
        &self,
        step_id: &str,
        output: &str,
        at: DateTime<Utc>,
    ) -> Result<AppendOutcome, OrchestratorError> {
        let current = match fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(err) if err.kind() == ErrorKind::NotFound => 0,
            Err(err) => return Err(io_error(&self.path, err)),
        };
        if current >= self.max_bytes {
            warn!(
                path = %self.path.display(),
                size = current,
                ceiling = self.max_bytes,
                step_id,
                "progress log at size ceiling; dropping entry"
            );
            return Ok(AppendOutcome::SkippedCeiling);
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| io_error(parent, err))?;
        }
        let entry = format_progress_entry(step_id, output, at);
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(entry.as_bytes()))
            .map_err(|err| io_error(&self.path, err))?;
        Ok(AppendOutcome::Appended)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> OrchestratorError {
    OrchestratorError::Io {
        path: path.display().to_string(),
        source,
    }
}
