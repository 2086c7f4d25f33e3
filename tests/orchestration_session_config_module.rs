use direflow::config::{CleanupMode, ContextMode, SessionMode, StepSessionOverride, WorkflowStep};
use direflow::orchestration::session_config::{
    resolve_session_config, DEFAULT_STEP_TIMEOUT_SECONDS,
};

fn step() -> WorkflowStep {
    WorkflowStep::agent_step("plan", "plan it")
}

#[test]
fn absent_everything_resolves_to_fresh_minimal_delete() {
    let config = resolve_session_config(&step(), None);
    assert_eq!(config.mode, SessionMode::Fresh);
    assert_eq!(config.context, ContextMode::Minimal);
    assert_eq!(config.cleanup, CleanupMode::Delete);
    assert_eq!(config.timeout, DEFAULT_STEP_TIMEOUT_SECONDS);
    assert!(config.include_outputs_from.is_empty());
}

#[test]
fn legacy_flag_beats_workflow_default() {
    let mut step = step();
    assert_eq!(
        resolve_session_config(&step, Some(false)).mode,
        SessionMode::Reuse
    );
    step.fresh_session = Some(true);
    assert_eq!(
        resolve_session_config(&step, Some(false)).mode,
        SessionMode::Fresh
    );
    step.fresh_session = Some(false);
    step.timeout = Some(30);
    let config = resolve_session_config(&step, Some(true));
    assert_eq!(config.mode, SessionMode::Reuse);
    assert_eq!(config.timeout, 30);
    assert_eq!(config.context, ContextMode::Minimal);
}

#[test]
fn session_block_beats_legacy_flag_with_independent_defaults() {
    let mut step = step();
    step.fresh_session = Some(false);
    step.timeout = Some(45);
    step.session = Some(StepSessionOverride {
        context: Some(ContextMode::Full),
        ..StepSessionOverride::default()
    });

    let config = resolve_session_config(&step, Some(false));
    assert_eq!(config.mode, SessionMode::Fresh);
    assert_eq!(config.context, ContextMode::Full);
    assert_eq!(config.cleanup, CleanupMode::Delete);
    assert_eq!(config.timeout, 45);
}

#[test]
fn session_block_fields_override_and_custom_keeps_included_outputs() {
    let mut step = step();
    step.session = Some(StepSessionOverride {
        mode: Some(SessionMode::Reuse),
        context: Some(ContextMode::Custom),
        cleanup: Some(CleanupMode::Keep),
        timeout: Some(90),
        include_outputs_from: vec!["research".to_string()],
    });
    let config = resolve_session_config(&step, None);
    assert_eq!(config.mode, SessionMode::Reuse);
    assert_eq!(config.cleanup, CleanupMode::Keep);
    assert_eq!(config.timeout, 90);
    assert_eq!(config.include_outputs_from, vec!["research".to_string()]);
}

#[test]
fn session_block_parses_from_workflow_yaml() {
    let step: WorkflowStep = serde_yaml::from_str(
        "id: review\ntype: agent\ninput: check\nsession:\n  mode: reuse\n  context: custom\n  include_outputs_from: [plan]\n",
    )
    .expect("parse step");
    let config = resolve_session_config(&step, None);
    assert_eq!(config.mode, SessionMode::Reuse);
    assert_eq!(config.context, ContextMode::Custom);
    assert_eq!(config.include_outputs_from, vec!["plan".to_string()]);
}
