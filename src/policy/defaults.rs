use super::{normalize_role, ToolPolicy};

pub const DEFAULT_ROLES: [&str; 5] = ["planner", "developer", "reviewer", "tester", "deployer"];

const READ_TOOLS: [&str; 5] = ["Read", "Grep", "Glob", "WebSearch", "WebFetch"];
const WRITE_TOOLS: [&str; 4] = ["Write", "Edit", "MultiEdit", "NotebookEdit"];

pub fn is_default_role(role: &str) -> bool {
    let role = normalize_role(role);
    DEFAULT_ROLES.contains(&role.as_str())
}

pub fn default_policies() -> Vec<ToolPolicy> {
    let mut planner_denied = WRITE_TOOLS.to_vec();
    planner_denied.push("Bash");
    let mut verify_allowed = READ_TOOLS.to_vec();
    verify_allowed.push("Bash");

    vec![
        ToolPolicy::new(
            "planner",
            &READ_TOOLS,
            &planner_denied,
            Some("Read and search only; plans without touching the tree"),
        ),
        ToolPolicy::new("developer", &["*"], &[], Some("Unrestricted tool access")),
        ToolPolicy::new(
            "reviewer",
            &verify_allowed,
            &WRITE_TOOLS,
            Some("Reads and executes checks; never writes"),
        ),
        ToolPolicy::new(
            "tester",
            &verify_allowed,
            &WRITE_TOOLS,
            Some("Reads and runs tests; never writes"),
        ),
        ToolPolicy::new("deployer", &["*"], &[], Some("Unrestricted tool access")),
    ]
}
