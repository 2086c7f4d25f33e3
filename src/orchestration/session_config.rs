use crate::config::{CleanupMode, ContextMode, SessionMode, WorkflowStep};

pub const DEFAULT_STEP_TIMEOUT_SECONDS: u64 = 600;

/// Effective session behavior for one step invocation. Computed per call,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSessionConfig {
    pub mode: SessionMode,
    pub context: ContextMode,
    pub cleanup: CleanupMode,
    pub timeout: u64,
    pub include_outputs_from: Vec<String>,
}

/// Resolves the session policy for `step`.
///
/// Precedence: the step's `session` block, then its legacy `fresh_session`
/// flag, then `workflow_default` (fresh when absent).
pub fn resolve_session_config(
    step: &WorkflowStep,
    workflow_default: Option<bool>,
) -> StepSessionConfig {
    let step_timeout = step.timeout.unwrap_or(DEFAULT_STEP_TIMEOUT_SECONDS);

    if let Some(session) = &step.session {
        let context = session.context.clone().unwrap_or(ContextMode::Minimal);
        let include_outputs_from = if context == ContextMode::Custom {
            session.include_outputs_from.clone()
        } else {
            Vec::new()
        };
        return StepSessionConfig {
            mode: session.mode.unwrap_or(SessionMode::Fresh),
            context,
            cleanup: session.cleanup.unwrap_or(CleanupMode::Delete),
            timeout: session.timeout.unwrap_or(step_timeout),
            include_outputs_from,
        };
    }

    let fresh = step.fresh_session.or(workflow_default).unwrap_or(true);
    StepSessionConfig {
        mode: SessionMode::from_fresh_flag(fresh),
        context: ContextMode::Minimal,
        cleanup: CleanupMode::Delete,
        timeout: step_timeout,
        include_outputs_from: Vec::new(),
    }
}
