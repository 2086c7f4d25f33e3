pub fn validate_identifier_value(kind: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{kind} must be non-empty"));
    }
    if value.chars().all(is_identifier_char) {
        return Ok(());
    }
    Err(format!(
        "{kind} must use only ASCII letters, digits, '-' or '_'"
    ))
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}

/// Strips every character that is not safe inside a single path segment.
pub fn sanitize_identifier(raw: &str) -> String {
    raw.chars().filter(|ch| is_identifier_char(*ch)).collect()
}

/// Reduces a requested artifact name to a bare file name.
///
/// Directory components, `..` segments and characters outside
/// `[A-Za-z0-9._-]` are dropped. Returns `None` when nothing usable remains.
pub fn sanitize_file_name(raw: &str) -> Option<String> {
    let last = raw
        .rsplit(['/', '\\'])
        .find(|segment| !segment.trim().is_empty())?;
    let cleaned = last
        .chars()
        .filter(|ch| is_identifier_char(*ch) || *ch == '.')
        .collect::<String>();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        return None;
    }
    Some(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_file_name_drops_traversal_segments() {
        assert_eq!(
            sanitize_file_name("../../etc/passwd").as_deref(),
            Some("passwd")
        );
        assert_eq!(sanitize_file_name("plan.yaml").as_deref(), Some("plan.yaml"));
        assert_eq!(sanitize_file_name("..").as_deref(), None);
        assert_eq!(sanitize_file_name("out/").as_deref(), Some("out"));
    }

    #[test]
    fn sanitize_identifier_keeps_safe_characters_only() {
        assert_eq!(sanitize_identifier("run-1_a"), "run-1_a");
        assert_eq!(sanitize_identifier("../run"), "run");
    }
}
