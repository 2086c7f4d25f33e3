//! Task records the engine runs workflows against.
//!
//! The engine itself only reads a task's id and title; updates are exposed
//! for callers that track task status alongside runs.

mod front_matter;
mod store;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub use front_matter::{render_front_matter, split_front_matter};
pub use store::FileTaskStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Front matter keys the engine does not interpret, kept on rewrite.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
    #[serde(skip)]
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub status: Option<String>,
    pub body: Option<String>,
}

impl TaskPatch {
    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(status) = &self.status {
            task.status = Some(status.clone());
        }
        if let Some(body) = &self.body {
            task.body = body.clone();
        }
    }
}

pub trait TaskStore {
    fn get_task(&self, task_id: &str) -> Result<Option<Task>, TaskError>;

    fn update_task(&self, task_id: &str, patch: &TaskPatch) -> Result<Option<Task>, TaskError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("invalid task id `{task_id}`")]
    InvalidId { task_id: String },
    #[error("task file {path} is malformed: {reason}")]
    Malformed { path: String, reason: String },
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode task {path}: {source}")]
    Encode {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

pub(crate) fn io_error(path: &Path, source: std::io::Error) -> TaskError {
    TaskError::Io {
        path: path.display().to_string(),
        source,
    }
}
