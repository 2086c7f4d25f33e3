use super::{normalize_role, PolicyError, ToolPolicy};
use std::collections::BTreeSet;

pub const MAX_ROLE_CHARS: usize = 50;
pub const MAX_TOOL_ENTRIES: usize = 100;
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// Structural checks run on every save and on every record loaded from disk.
pub fn validate_policy(policy: &ToolPolicy) -> Result<(), PolicyError> {
    let role = policy.role.trim();
    let invalid = |reason: String| PolicyError::Invalid {
        role: role.to_string(),
        reason,
    };

    if role.is_empty() {
        return Err(invalid("role name is required".to_string()));
    }
    if role.chars().count() > MAX_ROLE_CHARS {
        return Err(invalid(format!(
            "role name exceeds {MAX_ROLE_CHARS} characters"
        )));
    }
    if !normalize_role(role)
        .chars()
        .all(|ch| ch.is_alphanumeric() || ch == '-' || ch == '_')
    {
        return Err(invalid(
            "role name must use only letters, digits, '-' or '_'".to_string(),
        ));
    }
    if policy.allowed.len() > MAX_TOOL_ENTRIES {
        return Err(invalid(format!(
            "allowed list exceeds {MAX_TOOL_ENTRIES} entries"
        )));
    }
    if policy.denied.len() > MAX_TOOL_ENTRIES {
        return Err(invalid(format!(
            "denied list exceeds {MAX_TOOL_ENTRIES} entries"
        )));
    }
    if let Some(description) = &policy.description {
        if description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(invalid(format!(
                "description exceeds {MAX_DESCRIPTION_CHARS} characters"
            )));
        }
    }

    let allowed = policy.allowed.iter().collect::<BTreeSet<_>>();
    let overlap = policy
        .denied
        .iter()
        .filter(|tool| allowed.contains(tool))
        .map(String::as_str)
        .collect::<BTreeSet<_>>();
    if !overlap.is_empty() {
        return Err(invalid(format!(
            "tools both allowed and denied: {}",
            overlap.into_iter().collect::<Vec<_>>().join(", ")
        )));
    }
    Ok(())
}
