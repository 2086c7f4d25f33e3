use super::{
    build_invocation, io_error, parse_session_stdout, transcript_path, SessionError,
    SessionOutput, SessionRequest, SessionSpawner, DEFAULT_AGENT_BINARY,
};
use crate::shared::fs_atomic::remove_file_if_exists;
use std::io::{BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Spawns the agent CLI as a child process and waits for its result.
#[derive(Debug, Clone)]
pub struct ProcessSessionSpawner {
    binary: String,
    cwd: PathBuf,
    transcript_dir: Option<PathBuf>,
}

impl ProcessSessionSpawner {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            binary: DEFAULT_AGENT_BINARY.to_string(),
            cwd: cwd.into(),
            transcript_dir: None,
        }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Directory holding `<session>.jsonl` transcripts that `cleanup` removes.
    pub fn with_transcript_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.transcript_dir = Some(dir.into());
        self
    }
}

impl SessionSpawner for ProcessSessionSpawner {
    fn spawn(&self, request: &SessionRequest) -> Result<SessionOutput, SessionError> {
        let spec = build_invocation(request, &self.binary);
        info!(
            binary = %spec.binary,
            cwd = %self.cwd.display(),
            timeout_secs = request.timeout.as_secs(),
            "spawning agent session"
        );

        let mut child = match Command::new(&spec.binary)
            .current_dir(&self.cwd)
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(SessionError::MissingBinary {
                    binary: spec.binary,
                })
            }
            Err(err) => return Err(io_error(&self.cwd, err)),
        };

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io_error(&self.cwd, std::io::Error::other("missing stdout pipe")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| io_error(&self.cwd, std::io::Error::other("missing stderr pipe")))?;

        let stdout_reader = thread::spawn(move || {
            let mut buf = String::new();
            let _ = BufReader::new(stdout).read_to_string(&mut buf);
            buf
        });
        let stderr_reader = thread::spawn(move || {
            let mut buf = String::new();
            let _ = BufReader::new(stderr).read_to_string(&mut buf);
            buf
        });

        let start = Instant::now();
        let exit_status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if start.elapsed() > request.timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        let _ = stdout_reader.join();
                        let _ = stderr_reader.join();
                        return Err(SessionError::Timeout {
                            timeout_seconds: request.timeout.as_secs(),
                        });
                    }
                    thread::sleep(Duration::from_millis(10));
                }
                Err(err) => return Err(io_error(&self.cwd, err)),
            }
        };

        let stdout = stdout_reader.join().unwrap_or_default();
        let stderr = stderr_reader.join().unwrap_or_default();
        if !exit_status.success() {
            return Err(SessionError::NonZeroExit {
                exit_code: exit_status.code().unwrap_or(-1),
                stderr: stderr.trim().to_string(),
            });
        }
        parse_session_stdout(&stdout)
    }

    fn cleanup(&self, handle: &str) -> Result<(), SessionError> {
        let Some(dir) = &self.transcript_dir else {
            return Ok(());
        };
        let Some(path) = transcript_path(dir, handle) else {
            debug!(handle, "skipping cleanup of session with unsafe handle");
            return Ok(());
        };
        let removed = remove_file_if_exists(&path).map_err(|err| io_error(&path, err))?;
        debug!(handle, removed, "session transcript cleanup");
        Ok(())
    }
}
