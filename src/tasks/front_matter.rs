const DELIMITER: &str = "---";

/// Splits `---` delimited YAML front matter from the markdown body.
///
/// Returns `None` when the text does not open with a delimiter line or the
/// closing delimiter is missing.
pub fn split_front_matter(content: &str) -> Option<(&str, &str)> {
    let rest = content
        .strip_prefix(DELIMITER)?
        .strip_prefix('\n')
        .or_else(|| content.strip_prefix("---\r\n"))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            let front = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((front, body.strip_prefix('\n').unwrap_or(body)));
        }
        offset += line.len();
    }
    None
}

pub fn render_front_matter(front: &str, body: &str) -> String {
    let mut rendered = String::with_capacity(front.len() + body.len() + 10);
    rendered.push_str(DELIMITER);
    rendered.push('\n');
    rendered.push_str(front);
    if !front.ends_with('\n') {
        rendered.push('\n');
    }
    rendered.push_str(DELIMITER);
    rendered.push_str("\n\n");
    rendered.push_str(body);
    rendered
}
