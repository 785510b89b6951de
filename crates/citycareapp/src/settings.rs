//! # Settings
//!
//! Small scalar values that are not records live in `settings.json` next to
//! the partitions, as one JSON object keyed by setting name. Writes replace
//! the file atomically and hold the data directory's writer lock, like
//! partition writes.
//!
//! Two keys are in use:
//!
//! - `subscribedUsers`: session tokens subscribed to push notifications,
//!   managed by [`NotificationSubscriptions`].
//! - `reports`: a list of reports written by older clients before the
//!   partitioned store existed. [`migrate_legacy_reports`] moves it into the
//!   `reports` partition and removes the key.

use crate::error::{CityCareError, Result};
use crate::model::{Partition, Record};
use crate::store::fs_backend::lock_dir;
use crate::store::RecordStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

pub const SETTINGS_FILE: &str = "settings.json";
pub const SUBSCRIBED_USERS_KEY: &str = "subscribedUsers";
pub const LEGACY_REPORTS_KEY: &str = "reports";

pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(root: &Path) -> Self {
        Self {
            path: root.join(SETTINGS_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.load()?.remove(key) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.modify(|settings| {
            settings.insert(key.to_string(), value);
            true
        })?;
        Ok(())
    }

    /// Returns whether the key was present.
    pub fn remove(&self, key: &str) -> Result<bool> {
        self.modify(|settings| settings.remove(key).is_some())
    }

    /// Load, apply `change` and save if it reported a change, all under the
    /// writer lock.
    fn modify<F>(&self, change: F) -> Result<bool>
    where
        F: FnOnce(&mut Map<String, Value>) -> bool,
    {
        let _guard = lock_dir(self.dir()?)?;
        let mut settings = self.load()?;
        if !change(&mut settings) {
            return Ok(false);
        }
        self.save(&settings)?;
        Ok(true)
    }

    fn dir(&self) -> Result<&Path> {
        self.path.parent().ok_or_else(|| {
            CityCareError::StoreUnavailable(format!("{} has no parent", self.path.display()))
        })
    }

    fn load(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, settings: &Map<String, Value>) -> Result<()> {
        let dir = self.dir()?;

        let content = serde_json::to_string_pretty(settings)?;
        let tmp_path = dir.join(format!(".settings-{}.tmp", Uuid::new_v4()));
        if let Err(e) = fs::write(&tmp_path, content) {
            let _ = fs::remove_file(&tmp_path);
            return Err(CityCareError::Io(e));
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

/// Session tokens subscribed to push notifications.
pub struct NotificationSubscriptions<'a> {
    settings: &'a SettingsStore,
}

impl<'a> NotificationSubscriptions<'a> {
    pub fn new(settings: &'a SettingsStore) -> Self {
        Self { settings }
    }

    fn tokens(&self) -> Result<BTreeSet<String>> {
        Ok(self
            .settings
            .get(SUBSCRIBED_USERS_KEY)?
            .unwrap_or_default())
    }

    pub fn is_subscribed(&self, token: &str) -> Result<bool> {
        Ok(self.tokens()?.contains(token))
    }

    pub fn subscribe(&self, token: &str) -> Result<()> {
        self.set(token, true)
    }

    pub fn unsubscribe(&self, token: &str) -> Result<()> {
        self.set(token, false)
    }

    /// Add or remove `token`. Writes only when membership changes.
    pub fn set(&self, token: &str, subscribed: bool) -> Result<()> {
        let mut decode_error = None;
        let changed = self.settings.modify(|settings| {
            let mut tokens: BTreeSet<String> = match settings.get(SUBSCRIBED_USERS_KEY) {
                Some(value) => match serde_json::from_value(value.clone()) {
                    Ok(tokens) => tokens,
                    Err(e) => {
                        decode_error = Some(e);
                        return false;
                    }
                },
                None => BTreeSet::new(),
            };
            let changed = if subscribed {
                tokens.insert(token.to_string())
            } else {
                tokens.remove(token)
            };
            if changed {
                let list: Vec<Value> = tokens.into_iter().map(Value::String).collect();
                settings.insert(SUBSCRIBED_USERS_KEY.to_string(), Value::Array(list));
            }
            changed
        })?;
        if let Some(e) = decode_error {
            return Err(CityCareError::Serialization(e));
        }
        if changed {
            info!(subscribed, "notification subscription updated");
        }
        Ok(())
    }
}

/// Move reports stored under the legacy settings key into the `reports`
/// partition. Returns how many were moved.
///
/// All records land in one partition write, and the key is removed only
/// after that write succeeded, so an interrupted migration is repeated on the
/// next start. Repeating it is harmless since `put_all` is an upsert.
pub fn migrate_legacy_reports<S: RecordStore + ?Sized>(
    settings: &SettingsStore,
    store: &S,
) -> Result<usize> {
    let legacy: Vec<Record> = match settings.get(LEGACY_REPORTS_KEY) {
        Ok(Some(records)) => records,
        Ok(None) => return Ok(0),
        Err(CityCareError::Serialization(e)) => {
            warn!(error = %e, "legacy reports are unreadable, leaving them in place");
            return Ok(0);
        }
        Err(e) => return Err(e),
    };

    store.put_all(Partition::Reports, &legacy)?;
    settings.remove(LEGACY_REPORTS_KEY)?;
    info!(count = legacy.len(), "migrated legacy reports");
    Ok(legacy.len())
}
