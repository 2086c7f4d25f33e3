use super::ConfigError;
use crate::shared::ids::validate_identifier_value;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Keys every session context carries. A step with one of these ids would
/// have its output hidden behind them in full context mode.
pub const RESERVED_STEP_IDS: [&str; 6] =
    ["task", "workflow", "workflowId", "runId", "progress", "steps"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    Agent,
    Loop,
    Gate,
    Parallel,
}

impl StepType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Loop => "loop",
            Self::Gate => "gate",
            Self::Parallel => "parallel",
        }
    }
}

impl std::fmt::Display for StepType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    Fresh,
    Reuse,
}

impl SessionMode {
    pub fn from_fresh_flag(fresh: bool) -> Self {
        if fresh {
            Self::Fresh
        } else {
            Self::Reuse
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupMode {
    Delete,
    Keep,
}

/// How much run state a spawned session gets to see.
///
/// Unknown values survive deserialization as `Other` so that a typo in a
/// workflow file degrades to the base context instead of rejecting the file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum ContextMode {
    Minimal,
    Full,
    Custom,
    Other(String),
}

impl From<String> for ContextMode {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "minimal" => Self::Minimal,
            "full" => Self::Full,
            "custom" => Self::Custom,
            _ => Self::Other(value),
        }
    }
}

impl From<ContextMode> for String {
    fn from(value: ContextMode) -> Self {
        match value {
            ContextMode::Minimal => "minimal".to_string(),
            ContextMode::Full => "full".to_string(),
            ContextMode::Custom => "custom".to_string(),
            ContextMode::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct StepSessionOverride {
    #[serde(default)]
    pub mode: Option<SessionMode>,
    #[serde(default)]
    pub context: Option<ContextMode>,
    #[serde(default)]
    pub cleanup: Option<CleanupMode>,
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub include_outputs_from: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WorkflowAgent {
    pub id: String,
    pub role: String,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WorkflowStep {
    pub id: String,
    #[serde(rename = "type")]
    pub step_type: StepType,
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub acceptance: Vec<String>,
    #[serde(default)]
    pub session: Option<StepSessionOverride>,
    #[serde(default)]
    pub fresh_session: Option<bool>,
    #[serde(default)]
    pub timeout: Option<u64>,
}

impl WorkflowStep {
    pub fn agent_step(id: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            step_type: StepType::Agent,
            agent: None,
            input: input.into(),
            output: None,
            acceptance: Vec::new(),
            session: None,
            fresh_session: None,
            timeout: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WorkflowDefinition {
    pub id: String,
    #[serde(default)]
    pub fresh_session: Option<bool>,
    #[serde(default)]
    pub agents: Vec<WorkflowAgent>,
    #[serde(default)]
    pub steps: Vec<WorkflowStep>,
}

impl WorkflowDefinition {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let definition: Self =
            serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        definition.validate()?;
        Ok(definition)
    }

    pub fn agent(&self, agent_id: &str) -> Option<&WorkflowAgent> {
        self.agents.iter().find(|agent| agent.id == agent_id)
    }

    pub fn step(&self, step_id: &str) -> Option<&WorkflowStep> {
        self.steps.iter().find(|step| step.id == step_id)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::Workflow {
            workflow_id: self.id.clone(),
            reason,
        };
        validate_identifier_value("workflow id", &self.id).map_err(invalid)?;
        if self.steps.is_empty() {
            return Err(invalid("workflow must declare at least one step".to_string()));
        }

        let mut agent_ids = HashSet::new();
        for agent in &self.agents {
            validate_identifier_value("agent id", &agent.id).map_err(invalid)?;
            if agent.role.trim().is_empty() {
                return Err(invalid(format!("agent `{}` must declare a role", agent.id)));
            }
            if !agent_ids.insert(agent.id.as_str()) {
                return Err(invalid(format!("duplicate agent id `{}`", agent.id)));
            }
        }

        let mut step_ids = HashSet::new();
        for step in &self.steps {
            validate_identifier_value("step id", &step.id).map_err(invalid)?;
            if RESERVED_STEP_IDS.contains(&step.id.as_str()) {
                return Err(invalid(format!(
                    "step id `{}` is reserved for session context",
                    step.id
                )));
            }
            if !step_ids.insert(step.id.as_str()) {
                return Err(invalid(format!("duplicate step id `{}`", step.id)));
            }
        }
        Ok(())
    }
}
