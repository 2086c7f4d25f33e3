#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliVerb {
    Policy,
    Run,
    Help,
    Unknown,
}

pub fn parse_cli_verb(input: &str) -> CliVerb {
    match input {
        "policy" => CliVerb::Policy,
        "run" => CliVerb::Run,
        "help" | "--help" | "-h" => CliVerb::Help,
        _ => CliVerb::Unknown,
    }
}

pub fn cli_help_lines() -> Vec<String> {
    vec![
        "Commands:".to_string(),
        "  policy list                          List tool policies by role".to_string(),
        "  policy show <role>                   Print one tool policy as YAML".to_string(),
        "  policy check <role> <tool>           Check whether a role may use a tool".to_string(),
        "  policy delete <role>                 Delete a non-default tool policy".to_string(),
        "  run <workflow.yaml> <task_id>        Run a workflow against a task".to_string(),
    ]
}

pub(crate) fn help_text() -> String {
    cli_help_lines().join("\n")
}
