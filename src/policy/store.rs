use super::{
    default_policies, io_error, is_default_role, normalize_role, validate_policy, PolicyError,
    ToolFilter, ToolPolicy,
};
use crate::shared::fs_atomic::{atomic_write_file, remove_file_if_exists};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

const RECORD_EXTENSION: &str = "yaml";

/// File-backed tool policy registry with a read-through cache keyed by the
/// normalized role name.
///
/// Every mutation holds the cache lock while it touches disk, so callers see
/// record and cache change together.
#[derive(Debug)]
pub struct ToolPolicyStore {
    root: PathBuf,
    max_policies: usize,
    cache: Mutex<BTreeMap<String, ToolPolicy>>,
}

impl ToolPolicyStore {
    /// Opens the store rooted at `root`, seeding the default role policies.
    /// Defaults are only written when no record exists for that role, so an
    /// on-disk override is never clobbered.
    pub fn open(root: impl Into<PathBuf>, max_policies: usize) -> Result<Self, PolicyError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|err| io_error(&root, err))?;
        let store = Self {
            root,
            max_policies,
            cache: Mutex::new(BTreeMap::new()),
        };

        {
            let mut cache = store.lock_cache();
            for policy in default_policies() {
                let key = normalize_role(&policy.role);
                let path = store.record_path(&key);
                if path.exists() {
                    debug!(role = %key, "keeping persisted override of default tool policy");
                    continue;
                }
                store.write_record(&path, &policy)?;
                cache.insert(key, policy);
            }
        }
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get(&self, role: &str) -> Result<Option<ToolPolicy>, PolicyError> {
        let key = normalize_role(role);
        if key.is_empty() {
            return Ok(None);
        }
        let mut cache = self.lock_cache();
        if let Some(policy) = cache.get(&key) {
            return Ok(Some(policy.clone()));
        }
        if !is_record_key(&key) {
            return Ok(None);
        }
        let Some(policy) = self.read_record(&key)? else {
            return Ok(None);
        };
        cache.insert(key, policy.clone());
        Ok(Some(policy))
    }

    /// Every persisted record, in directory enumeration order.
    pub fn list(&self) -> Result<Vec<ToolPolicy>, PolicyError> {
        let _cache = self.lock_cache();
        let mut policies = Vec::new();
        for key in self.record_keys()? {
            if let Some(policy) = self.read_record(&key)? {
                policies.push(policy);
            }
        }
        Ok(policies)
    }

    pub fn save(&self, policy: ToolPolicy) -> Result<ToolPolicy, PolicyError> {
        validate_policy(&policy)?;
        let key = normalize_role(&policy.role);
        let policy = ToolPolicy { role: key.clone(), ..policy };

        let mut cache = self.lock_cache();
        let path = self.record_path(&key);
        if !path.exists() {
            let existing = self.record_keys()?.len();
            if existing >= self.max_policies {
                return Err(PolicyError::LimitExceeded {
                    role: key,
                    max: self.max_policies,
                });
            }
        }
        self.write_record(&path, &policy)?;
        cache.insert(key, policy.clone());
        Ok(policy)
    }

    /// Removes a non-default role's record. Returns whether a record existed.
    pub fn delete(&self, role: &str) -> Result<bool, PolicyError> {
        let key = normalize_role(role);
        if is_default_role(&key) {
            return Err(PolicyError::Protected { role: key });
        }
        let mut cache = self.lock_cache();
        let existed = if is_record_key(&key) {
            let path = self.record_path(&key);
            remove_file_if_exists(&path).map_err(|err| io_error(&path, err))?
        } else {
            false
        };
        cache.remove(&key);
        Ok(existed)
    }

    /// Whether `role` may invoke `tool`. A role without any policy is allowed
    /// everything.
    pub fn resolve_tool_access(&self, role: &str, tool: &str) -> Result<bool, PolicyError> {
        match self.get(role)? {
            Some(policy) => Ok(policy.permits(tool)),
            None => {
                warn!(
                    role = %normalize_role(role),
                    tool,
                    "no tool policy for role; allowing tool by default"
                );
                Ok(true)
            }
        }
    }

    pub fn tool_filter_for_role(&self, role: &str) -> Result<ToolFilter, PolicyError> {
        match self.get(role)? {
            Some(policy) => Ok(policy.tool_filter()),
            None => {
                warn!(
                    role = %normalize_role(role),
                    "no tool policy for role; session runs without tool restrictions"
                );
                Ok(ToolFilter::default())
            }
        }
    }

    fn lock_cache(&self) -> MutexGuard<'_, BTreeMap<String, ToolPolicy>> {
        self.cache.lock().unwrap_or_else(|err| err.into_inner())
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.{RECORD_EXTENSION}"))
    }

    fn record_keys(&self) -> Result<Vec<String>, PolicyError> {
        let entries = fs::read_dir(&self.root).map_err(|err| io_error(&self.root, err))?;
        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| io_error(&self.root, err))?;
            let path = entry.path();
            if !path.is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXTENSION)
            {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if stem.starts_with('.') {
                continue;
            }
            keys.push(stem.to_string());
        }
        Ok(keys)
    }

    fn read_record(&self, key: &str) -> Result<Option<ToolPolicy>, PolicyError> {
        let path = self.record_path(key);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io_error(&path, err)),
        };
        let policy: ToolPolicy =
            serde_yaml::from_str(&raw).map_err(|err| PolicyError::Invalid {
                role: key.to_string(),
                reason: format!("malformed record {}: {err}", path.display()),
            })?;
        validate_policy(&policy)?;
        if normalize_role(&policy.role) != key {
            return Err(PolicyError::Invalid {
                role: key.to_string(),
                reason: format!(
                    "record {} declares role `{}`",
                    path.display(),
                    policy.role
                ),
            });
        }
        Ok(Some(policy))
    }

    fn write_record(&self, path: &Path, policy: &ToolPolicy) -> Result<(), PolicyError> {
        let body = serde_yaml::to_string(policy).map_err(|source| PolicyError::Encode {
            path: path.display().to_string(),
            source,
        })?;
        atomic_write_file(path, body.as_bytes()).map_err(|err| io_error(path, err))
    }
}

fn is_record_key(key: &str) -> bool {
    key.chars()
        .all(|ch| ch.is_alphanumeric() || ch == '-' || ch == '_')
}
