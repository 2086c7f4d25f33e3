//! Role-based tool access policies.
//!
//! A [`ToolPolicy`] names the tools an agent role may and may not invoke
//! during a session. Policies live one record per role under the policy
//! directory and are served through the read-through [`ToolPolicyStore`].

mod defaults;
mod store;
mod validate;

use serde::{Deserialize, Serialize};
use std::path::Path;

pub use defaults::{default_policies, is_default_role, DEFAULT_ROLES};
pub use store::ToolPolicyStore;
pub use validate::{
    validate_policy, MAX_DESCRIPTION_CHARS, MAX_ROLE_CHARS, MAX_TOOL_ENTRIES,
};

pub const WILDCARD_TOOL: &str = "*";
pub const DEFAULT_MAX_POLICIES: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPolicy {
    pub role: String,
    #[serde(default)]
    pub allowed: Vec<String>,
    #[serde(default)]
    pub denied: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ToolPolicy {
    pub fn new(
        role: impl Into<String>,
        allowed: &[&str],
        denied: &[&str],
        description: Option<&str>,
    ) -> Self {
        Self {
            role: role.into(),
            allowed: allowed.iter().map(|tool| tool.to_string()).collect(),
            denied: denied.iter().map(|tool| tool.to_string()).collect(),
            description: description.map(str::to_string),
        }
    }

    pub fn allows_all(&self) -> bool {
        self.allowed.iter().any(|tool| tool == WILDCARD_TOOL)
    }

    /// Denied entries win over everything, then the wildcard, then explicit
    /// allow-list membership.
    pub fn permits(&self, tool: &str) -> bool {
        if self.denied.iter().any(|denied| denied == tool) {
            return false;
        }
        if self.allows_all() {
            return true;
        }
        self.allowed.iter().any(|allowed| allowed == tool)
    }

    /// Projects the policy into the filter handed to the session runtime.
    pub fn tool_filter(&self) -> ToolFilter {
        let denied = (!self.denied.is_empty()).then(|| self.denied.clone());
        let allowed = (!self.allowed.is_empty() && !self.allows_all())
            .then(|| self.allowed.clone());
        ToolFilter { allowed, denied }
    }
}

/// Allow/deny lists passed to a spawned session. `None` means no restriction
/// on that side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denied: Option<Vec<String>>,
}

impl ToolFilter {
    pub fn is_unrestricted(&self) -> bool {
        self.allowed.is_none() && self.denied.is_none()
    }
}

/// Trimmed, lower-cased role name used as the cache and record key.
pub fn normalize_role(role: &str) -> String {
    role.trim().to_lowercase()
}

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("tool policy `{role}` is invalid: {reason}")]
    Invalid { role: String, reason: String },
    #[error("tool policy limit of {max} reached; cannot add role `{role}`")]
    LimitExceeded { role: String, max: usize },
    #[error("tool policy `{role}` is a default role and cannot be deleted")]
    Protected { role: String },
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode tool policy {path}: {source}")]
    Encode {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

pub(crate) fn io_error(path: &Path, source: std::io::Error) -> PolicyError {
    PolicyError::Io {
        path: path.display().to_string(),
        source,
    }
}
