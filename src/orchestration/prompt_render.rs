use serde_json::{Map, Value};

fn resolve_json_path<'a>(context: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = context.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn value_to_rendered_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Fills `{{ dotted.path }}` placeholders from `context`.
///
/// Placeholders whose path does not resolve are copied through verbatim so a
/// broken template stays visible in the rendered prompt. Never fails.
pub fn render_template(template: &str, context: &Map<String, Value>) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut cursor = template;

    while let Some(start) = cursor.find("{{") {
        rendered.push_str(&cursor[..start]);
        let after_open = &cursor[start + 2..];
        let Some(close_offset) = after_open.find("}}") else {
            rendered.push_str(&cursor[start..]);
            return rendered;
        };
        let placeholder = &cursor[start..start + 2 + close_offset + 2];
        let token = after_open[..close_offset].trim();
        match resolve_json_path(context, token) {
            Some(value) if !token.is_empty() => rendered.push_str(&value_to_rendered_text(value)),
            _ => rendered.push_str(placeholder),
        }
        cursor = &after_open[close_offset + 2..];
    }

    rendered.push_str(cursor);
    rendered
}
