use super::front_matter::{render_front_matter, split_front_matter};
use super::{io_error, Task, TaskError, TaskPatch, TaskStore};
use crate::shared::fs_atomic::atomic_write_file;
use crate::shared::ids::sanitize_identifier;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// One markdown file per task under `<root>/<id>.md`.
#[derive(Debug, Clone)]
pub struct FileTaskStore {
    root: PathBuf,
}

impl FileTaskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn task_path(&self, task_id: &str) -> Result<PathBuf, TaskError> {
        let sanitized = sanitize_identifier(task_id);
        if sanitized.is_empty() || sanitized != task_id {
            return Err(TaskError::InvalidId {
                task_id: task_id.to_string(),
            });
        }
        Ok(self.root.join(format!("{sanitized}.md")))
    }

    pub fn save_task(&self, task: &Task) -> Result<PathBuf, TaskError> {
        let path = self.task_path(&task.id)?;
        let front = serde_yaml::to_string(task).map_err(|source| TaskError::Encode {
            path: path.display().to_string(),
            source,
        })?;
        atomic_write_file(&path, render_front_matter(&front, &task.body).as_bytes())
            .map_err(|err| io_error(&path, err))?;
        Ok(path)
    }

    fn read_task(&self, path: &Path, task_id: &str) -> Result<Option<Task>, TaskError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io_error(path, err)),
        };
        let malformed = |reason: String| TaskError::Malformed {
            path: path.display().to_string(),
            reason,
        };
        let (front, body) =
            split_front_matter(&raw).ok_or_else(|| malformed("missing front matter".to_string()))?;
        let mut task: Task =
            serde_yaml::from_str(front).map_err(|err| malformed(err.to_string()))?;
        if task.id != task_id {
            return Err(malformed(format!(
                "front matter id `{}` does not match file name",
                task.id
            )));
        }
        task.body = body.to_string();
        Ok(Some(task))
    }
}

impl TaskStore for FileTaskStore {
    fn get_task(&self, task_id: &str) -> Result<Option<Task>, TaskError> {
        let path = self.task_path(task_id)?;
        self.read_task(&path, task_id)
    }

    fn update_task(&self, task_id: &str, patch: &TaskPatch) -> Result<Option<Task>, TaskError> {
        let Some(mut task) = self.get_task(task_id)? else {
            return Ok(None);
        };
        patch.apply(&mut task);
        self.save_task(&task)?;
        Ok(Some(task))
    }
}
