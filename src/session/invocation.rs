use super::SessionRequest;
use crate::config::SessionMode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationSpec {
    pub binary: String,
    pub args: Vec<String>,
}

pub fn build_invocation(request: &SessionRequest, binary: &str) -> InvocationSpec {
    let mut args = vec![
        "--output-format".to_string(),
        "json".to_string(),
    ];
    if let Some(model) = request
        .model
        .as_deref()
        .map(str::trim)
        .filter(|model| !model.is_empty())
    {
        args.push("--model".to_string());
        args.push(model.to_string());
    }
    if let Some(allowed) = &request.tool_filter.allowed {
        args.push("--allowedTools".to_string());
        args.push(allowed.join(","));
    }
    if let Some(denied) = &request.tool_filter.denied {
        args.push("--disallowedTools".to_string());
        args.push(denied.join(","));
    }
    if request.mode == SessionMode::Reuse {
        args.push("-c".to_string());
    }
    args.push("-p".to_string());
    args.push(request.prompt.clone());
    InvocationSpec {
        binary: binary.to_string(),
        args,
    }
}
