use super::{SessionError, SessionOutput};
use serde_json::Value;

/// Reads the runtime's JSON result envelope (`result` plus `session_id`),
/// accepting plain text output as-is.
pub fn parse_session_stdout(stdout: &str) -> Result<SessionOutput, SessionError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Err(SessionError::ParseFailure("stdout was empty".to_string()));
    }

    let Ok(value) = serde_json::from_str::<Value>(trimmed) else {
        return Ok(SessionOutput::text(trimmed));
    };
    let Some(envelope) = value.as_object() else {
        return Ok(SessionOutput::text(trimmed));
    };
    if envelope.get("is_error").and_then(Value::as_bool) == Some(true) {
        let reason = envelope
            .get("result")
            .and_then(Value::as_str)
            .unwrap_or("runtime reported an error");
        return Err(SessionError::Failed(reason.to_string()));
    }
    let Some(result) = envelope.get("result").and_then(Value::as_str) else {
        return Err(SessionError::ParseFailure(
            "json envelope is missing a string `result`".to_string(),
        ));
    };
    Ok(SessionOutput {
        text: result.to_string(),
        handle: envelope
            .get("session_id")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}
