use serde_json::Value;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Yaml,
    Json,
}

/// Format implied by the extension of a step's output file hint.
pub fn structured_format(output_hint: Option<&str>) -> Option<OutputFormat> {
    let extension = Path::new(output_hint?)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    match extension.as_str() {
        "yaml" | "yml" => Some(OutputFormat::Yaml),
        "json" => Some(OutputFormat::Json),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedOutput {
    pub value: Value,
    /// Set when a structured format was expected but the text did not parse.
    pub warning: Option<String>,
}

/// Parses `raw` as YAML or JSON when the hint asks for it. Parse failures fall
/// back to the raw text and are reported through `warning`.
pub fn parse_step_output(output_hint: Option<&str>, raw: &str) -> ParsedOutput {
    let Some(format) = structured_format(output_hint) else {
        return ParsedOutput {
            value: Value::String(raw.to_string()),
            warning: None,
        };
    };

    let body = strip_code_fence(raw);
    let parsed = match format {
        OutputFormat::Yaml => serde_yaml::from_str::<Value>(body).map_err(|err| err.to_string()),
        OutputFormat::Json => serde_json::from_str::<Value>(body).map_err(|err| err.to_string()),
    };
    match parsed {
        Ok(value) => ParsedOutput {
            value,
            warning: None,
        },
        Err(reason) => ParsedOutput {
            value: Value::String(raw.to_string()),
            warning: Some(format!(
                "output is not valid {}: {reason}",
                match format {
                    OutputFormat::Yaml => "yaml",
                    OutputFormat::Json => "json",
                }
            )),
        },
    }
}

/// Unwraps a single fenced block (```yaml ... ```) surrounding the whole text.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    match body.split_once('\n') {
        Some((_language, inner)) => inner.trim(),
        None => trimmed,
    }
}
