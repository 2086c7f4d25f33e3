use crate::config::{ConfigError, StepType};
use crate::orchestration::run::StepStatus;
use crate::policy::PolicyError;
use crate::session::SessionError;

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("invalid run id `{run_id}`")]
    InvalidId { run_id: String },
    #[error("step `{step_id}` has type `{step_type}`, which is not yet implemented")]
    UnsupportedStepType { step_id: String, step_type: StepType },
    #[error("step `{step_id}` failed acceptance criterion `{criterion}`")]
    AcceptanceFailed { step_id: String, criterion: String },
    #[error("session failed for step `{step_id}`: {source}")]
    Session {
        step_id: String,
        #[source]
        source: SessionError,
    },
    #[error(transparent)]
    Policy(#[from] PolicyError),
    #[error("workflow `{workflow_id}` has no step `{step_id}`")]
    UnknownStep {
        workflow_id: String,
        step_id: String,
    },
    #[error("run `{run_id}` belongs to workflow `{run_workflow_id}`, not `{workflow_id}`")]
    WorkflowMismatch {
        run_id: String,
        run_workflow_id: String,
        workflow_id: String,
    },
    #[error("step `{step_id}` status transition `{from}` -> `{to}` is invalid")]
    InvalidStepTransition {
        step_id: String,
        from: StepStatus,
        to: StepStatus,
    },
    #[error("config error: {0}")]
    Config(String),
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("json error at {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<ConfigError> for OrchestratorError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value.to_string())
    }
}
