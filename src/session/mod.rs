//! The agent session runtime the engine drives through [`SessionSpawner`].

mod invocation;
mod output_parse;
mod process;

use crate::config::SessionMode;
use crate::policy::ToolFilter;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use invocation::{build_invocation, InvocationSpec};
pub use output_parse::parse_session_stdout;
pub use process::ProcessSessionSpawner;

pub const DEFAULT_AGENT_BINARY: &str = "claude";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("agent binary missing: {binary}")]
    MissingBinary { binary: String },
    #[error("agent session exited with code {exit_code}: {stderr}")]
    NonZeroExit { exit_code: i32, stderr: String },
    #[error("agent session timed out after {timeout_seconds}s")]
    Timeout { timeout_seconds: u64 },
    #[error("agent session output parse failure: {0}")]
    ParseFailure(String),
    #[error("agent session failed: {0}")]
    Failed(String),
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    pub prompt: String,
    pub tool_filter: ToolFilter,
    pub timeout: Duration,
    pub model: Option<String>,
    pub mode: SessionMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutput {
    pub text: String,
    /// Runtime identifier of the session, when the runtime reports one.
    pub handle: Option<String>,
}

impl SessionOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            handle: None,
        }
    }
}

/// Runs one agent session to completion and returns its raw text output.
///
/// Implementations own the timeout: the engine passes the resolved deadline
/// through `SessionRequest::timeout` and never enforces it itself.
pub trait SessionSpawner {
    fn spawn(&self, request: &SessionRequest) -> Result<SessionOutput, SessionError>;

    fn cleanup(&self, _handle: &str) -> Result<(), SessionError> {
        Ok(())
    }
}

pub(crate) fn io_error(path: &Path, source: std::io::Error) -> SessionError {
    SessionError::Io {
        path: path.display().to_string(),
        source,
    }
}

pub(crate) fn transcript_path(dir: &Path, handle: &str) -> Option<PathBuf> {
    let name = crate::shared::ids::sanitize_identifier(handle);
    if name.is_empty() || name != handle {
        return None;
    }
    Some(dir.join(format!("{name}.jsonl")))
}
