use crate::app::cli::{help_text, parse_cli_verb, CliVerb};
use crate::app::command_support::load_settings;
use crate::config::Settings;

pub mod policy;
pub mod run;

pub fn run_cli(args: Vec<String>) -> Result<String, String> {
    if args.is_empty() || parse_cli_verb(args[0].as_str()) == CliVerb::Help {
        return Ok(help_text());
    }
    let settings = load_settings()?;
    run_cli_with_settings(args, &settings)
}

/// Dispatches against already-loaded settings; `run_cli` is the entry point
/// that reads them from the global config.
pub fn run_cli_with_settings(args: Vec<String>, settings: &Settings) -> Result<String, String> {
    if args.is_empty() {
        return Ok(help_text());
    }

    match parse_cli_verb(args[0].as_str()) {
        CliVerb::Policy => policy::cmd_policy(settings, &args[1..]),
        CliVerb::Run => run::cmd_run(settings, &args[1..]),
        CliVerb::Help => Ok(help_text()),
        CliVerb::Unknown => Err(format!("unknown command `{}`", args[0])),
    }
}
