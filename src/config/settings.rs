use super::{default_global_config_path, default_state_root, ConfigError};
use crate::policy::DEFAULT_MAX_POLICIES;
use crate::session::DEFAULT_AGENT_BINARY;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_max_policies() -> usize {
    DEFAULT_MAX_POLICIES
}

fn default_agent_binary() -> String {
    DEFAULT_AGENT_BINARY.to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub state_root: PathBuf,
    #[serde(default)]
    pub default_fresh_session: Option<bool>,
    #[serde(default = "default_max_policies")]
    pub max_policies: usize,
    #[serde(default = "default_agent_binary")]
    pub agent_binary: String,
    /// Where agent session transcripts land. Defaults to
    /// `<state_root>/transcripts`.
    #[serde(default)]
    pub transcript_dir: Option<PathBuf>,
}

impl Settings {
    pub fn default_for_root(state_root: impl Into<PathBuf>) -> Self {
        Self {
            state_root: state_root.into(),
            default_fresh_session: None,
            max_policies: default_max_policies(),
            agent_binary: default_agent_binary(),
            transcript_dir: None,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.state_root.as_os_str().is_empty() {
            return Err(ConfigError::Settings(
                "`state_root` must be non-empty".to_string(),
            ));
        }
        if self.max_policies == 0 {
            return Err(ConfigError::Settings(
                "`max_policies` must be greater than zero".to_string(),
            ));
        }
        if self.agent_binary.trim().is_empty() {
            return Err(ConfigError::Settings(
                "`agent_binary` must be non-empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn policies_dir(&self) -> PathBuf {
        self.state_root.join("policies")
    }

    pub fn tasks_dir(&self) -> PathBuf {
        self.state_root.join("tasks")
    }

    pub fn transcripts_dir(&self) -> PathBuf {
        self.transcript_dir
            .clone()
            .unwrap_or_else(|| self.state_root.join("transcripts"))
    }
}

/// Loads the global settings file, falling back to defaults rooted at
/// `~/.direflow` when no file has been written yet.
pub fn load_settings() -> Result<Settings, ConfigError> {
    let path = default_global_config_path()?;
    let settings = if path.is_file() {
        Settings::from_path(&path)?
    } else {
        Settings::default_for_root(default_state_root()?)
    };
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_yaml_applies_defaults_for_optional_fields() {
        let settings: Settings =
            serde_yaml::from_str("state_root: /tmp/direflow\n").expect("parse settings");
        assert_eq!(settings.max_policies, DEFAULT_MAX_POLICIES);
        assert_eq!(settings.agent_binary, "claude");
        assert_eq!(settings.default_fresh_session, None);
        assert_eq!(
            settings.transcripts_dir(),
            PathBuf::from("/tmp/direflow/transcripts")
        );
        settings.validate().expect("valid settings");
    }

    #[test]
    fn explicit_transcript_dir_overrides_state_root_default() {
        let settings: Settings = serde_yaml::from_str(
            "state_root: /tmp/direflow\ntranscript_dir: /var/tmp/agent-transcripts\n",
        )
        .expect("parse settings");
        assert_eq!(
            settings.transcripts_dir(),
            PathBuf::from("/var/tmp/agent-transcripts")
        );
    }

    #[test]
    fn settings_validation_rejects_zero_policy_limit() {
        let mut settings = Settings::default_for_root("/tmp/direflow");
        settings.max_policies = 0;
        let err = settings.validate().expect_err("zero limit rejected");
        assert!(err.to_string().contains("max_policies"));
    }
}
