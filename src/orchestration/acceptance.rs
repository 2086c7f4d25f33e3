use crate::orchestration::error::OrchestratorError;

/// Checks each criterion as a literal substring of `output`, failing on the
/// first one that is missing.
pub fn validate_acceptance(
    step_id: &str,
    criteria: &[String],
    output: &str,
) -> Result<(), OrchestratorError> {
    match criteria
        .iter()
        .find(|criterion| !output.contains(criterion.as_str()))
    {
        Some(unmet) => Err(OrchestratorError::AcceptanceFailed {
            step_id: step_id.to_string(),
            criterion: unmet.clone(),
        }),
        None => Ok(()),
    }
}
