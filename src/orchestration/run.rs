use crate::orchestration::error::OrchestratorError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl StepStatus {
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (StepStatus::Pending, StepStatus::Running)
                | (StepStatus::Pending, StepStatus::Failed)
                | (StepStatus::Running, StepStatus::Completed)
                | (StepStatus::Running, StepStatus::Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Running => "running",
            StepStatus::Completed => "completed",
            StepStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRun {
    pub step_id: String,
    pub status: StepStatus,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl StepRun {
    pub fn pending(step_id: impl Into<String>) -> Self {
        Self {
            step_id: step_id.into(),
            status: StepStatus::Pending,
            duration_ms: None,
            error: None,
        }
    }

    pub fn transition(&mut self, next: StepStatus) -> Result<(), OrchestratorError> {
        if !self.status.can_transition_to(next) {
            return Err(OrchestratorError::InvalidStepTransition {
                step_id: self.step_id.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    pub fn complete(&mut self, duration_ms: u64) -> Result<(), OrchestratorError> {
        self.transition(StepStatus::Completed)?;
        self.duration_ms = Some(duration_ms);
        self.error = None;
        Ok(())
    }

    pub fn fail(&mut self, duration_ms: u64, error: String) -> Result<(), OrchestratorError> {
        self.transition(StepStatus::Failed)?;
        self.duration_ms = Some(duration_ms);
        self.error = Some(error);
        Ok(())
    }
}

/// One execution of a workflow against a task.
///
/// `context` is the free-form bag steps accumulate into; every completed
/// step's output lands under its step id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRun {
    pub id: String,
    pub workflow_id: String,
    pub task_id: String,
    #[serde(default)]
    pub task_title: Option<String>,
    #[serde(default)]
    pub context: Map<String, Value>,
    #[serde(default)]
    pub steps: Vec<StepRun>,
}

impl WorkflowRun {
    pub fn new(
        id: impl Into<String>,
        workflow_id: impl Into<String>,
        task_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            workflow_id: workflow_id.into(),
            task_id: task_id.into(),
            task_title: None,
            context: Map::new(),
            steps: Vec::new(),
        }
    }

    pub fn step_run(&self, step_id: &str) -> Option<&StepRun> {
        self.steps.iter().find(|step| step.step_id == step_id)
    }

    pub fn step_run_mut(&mut self, step_id: &str) -> Option<&mut StepRun> {
        self.steps.iter_mut().find(|step| step.step_id == step_id)
    }

    pub fn is_step_completed(&self, step_id: &str) -> bool {
        self.step_run(step_id)
            .is_some_and(|step| step.status == StepStatus::Completed)
    }

    /// Starts a fresh execution record for `step_id`, replacing any earlier
    /// record for the same step, and marks it running.
    pub fn begin_step(&mut self, step_id: &str) -> Result<(), OrchestratorError> {
        let mut record = StepRun::pending(step_id);
        record.transition(StepStatus::Running)?;
        match self.step_run_mut(step_id) {
            Some(existing) => *existing = record,
            None => self.steps.push(record),
        }
        Ok(())
    }

    pub fn record_output(&mut self, step_id: &str, output: Value) {
        self.context.insert(step_id.to_string(), output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_step_status_rejects_further_transitions() {
        let mut run = WorkflowRun::new("run-1", "wf", "task-1");
        run.begin_step("plan").expect("begin");
        let step = run.step_run_mut("plan").expect("step run");
        step.complete(12).expect("complete");
        assert!(matches!(
            step.fail(1, "late".to_string()),
            Err(OrchestratorError::InvalidStepTransition { .. })
        ));
        assert_eq!(step.status, StepStatus::Completed);
        assert_eq!(step.duration_ms, Some(12));
    }

    #[test]
    fn begin_step_replaces_previous_record() {
        let mut run = WorkflowRun::new("run-1", "wf", "task-1");
        run.begin_step("plan").expect("begin");
        run.step_run_mut("plan")
            .expect("step run")
            .fail(3, "boom".to_string())
            .expect("fail");
        run.begin_step("plan").expect("begin again");
        assert_eq!(run.steps.len(), 1);
        assert_eq!(run.steps[0].status, StepStatus::Running);
        assert_eq!(run.steps[0].error, None);
    }
}
