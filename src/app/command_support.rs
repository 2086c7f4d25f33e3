use crate::config::{load_settings as config_load_settings, Settings};
use crate::policy::ToolPolicyStore;
use std::time::{SystemTime, UNIX_EPOCH};

pub fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

pub fn load_settings() -> Result<Settings, String> {
    config_load_settings().map_err(|err| err.to_string())
}

pub fn open_policy_store(settings: &Settings) -> Result<ToolPolicyStore, String> {
    ToolPolicyStore::open(settings.policies_dir(), settings.max_policies)
        .map_err(|err| err.to_string())
}
