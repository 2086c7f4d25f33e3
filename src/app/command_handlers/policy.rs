use crate::app::command_support::open_policy_store;
use crate::config::Settings;

pub fn cmd_policy(settings: &Settings, args: &[String]) -> Result<String, String> {
    if args.is_empty() {
        return Err("usage: policy <list|show|check|delete> ...".to_string());
    }
    let store = open_policy_store(settings)?;

    match args[0].as_str() {
        "list" => {
            if args.len() != 1 {
                return Err("usage: policy list".to_string());
            }
            let mut policies = store.list().map_err(|e| e.to_string())?;
            policies.sort_by(|a, b| a.role.cmp(&b.role));
            Ok(policies
                .iter()
                .map(|policy| {
                    format!(
                        "{} allowed={} denied={}",
                        policy.role,
                        policy.allowed.join(","),
                        policy.denied.join(",")
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"))
        }
        "show" => {
            if args.len() != 2 {
                return Err("usage: policy show <role>".to_string());
            }
            let policy = store
                .get(&args[1])
                .map_err(|e| e.to_string())?
                .ok_or_else(|| format!("unknown tool policy `{}`", args[1]))?;
            serde_yaml::to_string(&policy).map_err(|e| format!("failed to encode policy: {e}"))
        }
        "check" => {
            if args.len() != 3 {
                return Err("usage: policy check <role> <tool>".to_string());
            }
            let allowed = store
                .resolve_tool_access(&args[1], &args[2])
                .map_err(|e| e.to_string())?;
            Ok(format!(
                "role={} tool={} access={}",
                args[1],
                args[2],
                if allowed { "allowed" } else { "denied" }
            ))
        }
        "delete" => {
            if args.len() != 2 {
                return Err("usage: policy delete <role>".to_string());
            }
            if store.delete(&args[1]).map_err(|e| e.to_string())? {
                Ok(format!("deleted tool policy `{}`", args[1]))
            } else {
                Err(format!("unknown tool policy `{}`", args[1]))
            }
        }
        other => Err(format!("unknown policy subcommand `{other}`")),
    }
}
