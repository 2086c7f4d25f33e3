use crate::orchestration::error::OrchestratorError;
use crate::orchestration::run::WorkflowRun;
use crate::orchestration::step_execution::{StepExecutor, StepResult};
use chrono::Utc;
use std::time::Instant;
use tracing::warn;

/// Drives a run through its workflow's steps in declaration order.
///
/// Steps already completed on the run are skipped, so a persisted run can be
/// reloaded and resumed after a failure.
pub struct WorkflowEngine {
    executor: StepExecutor,
}

impl WorkflowEngine {
    pub fn new(executor: StepExecutor) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &StepExecutor {
        &self.executor
    }

    pub fn run(&self, run: &mut WorkflowRun) -> Result<Vec<StepResult>, OrchestratorError> {
        let workflow = self.executor.workflow();
        if run.workflow_id != workflow.id {
            return Err(OrchestratorError::WorkflowMismatch {
                run_id: run.id.clone(),
                run_workflow_id: run.workflow_id.clone(),
                workflow_id: workflow.id.clone(),
            });
        }

        let mut results = Vec::new();
        for step in &workflow.steps {
            if run.is_step_completed(&step.id) {
                continue;
            }
            results.push(self.run_step(run, &step.id)?);
        }
        Ok(results)
    }

    /// Executes one step and records its status, duration and output on the
    /// run. The run record is persisted either way.
    pub fn run_step(
        &self,
        run: &mut WorkflowRun,
        step_id: &str,
    ) -> Result<StepResult, OrchestratorError> {
        let workflow = self.executor.workflow();
        let step = workflow
            .step(step_id)
            .ok_or_else(|| OrchestratorError::UnknownStep {
                workflow_id: workflow.id.clone(),
                step_id: step_id.to_string(),
            })?;

        run.begin_step(&step.id)?;
        let started = Instant::now();
        let outcome = self.executor.execute(step, run, Utc::now());
        let duration_ms = elapsed_ms(started);

        match outcome {
            Ok(result) => {
                if let Some(record) = run.step_run_mut(&step.id) {
                    record.complete(duration_ms)?;
                }
                run.record_output(&step.id, result.output.clone());
                self.executor.run_store().persist_run(run)?;
                Ok(result)
            }
            Err(err) => {
                if let Some(record) = run.step_run_mut(&step.id) {
                    record.fail(duration_ms, err.to_string())?;
                }
                if let Err(persist_err) = self.executor.run_store().persist_run(run) {
                    warn!(
                        run_id = %run.id,
                        step_id = %step.id,
                        error = %persist_err,
                        "failed to persist run after step failure"
                    );
                }
                let _ = self.executor.run_store().append_engine_log(
                    &run.id,
                    Utc::now().timestamp(),
                    format!("step_id={} transition=failed error={err}", step.id),
                );
                Err(err)
            }
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
