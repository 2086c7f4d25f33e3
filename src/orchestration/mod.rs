pub mod acceptance;
pub mod error;
pub mod progress_log;
pub mod prompt_render;
pub mod run;
pub mod run_store;
pub mod session_config;
pub mod session_context;
pub mod step_execution;
pub mod structured_output;
pub mod workflow_engine;

pub use error::OrchestratorError;
pub use run::{StepRun, StepStatus, WorkflowRun};
pub use run_store::WorkflowRunStore;
pub use step_execution::{StepExecutor, StepResult};
pub use workflow_engine::WorkflowEngine;
