//! # Initialization
//!
//! [`initialize`] wires a ready-to-use [`CityCareApi`] from the environment.
//!
//! ## Data Directory
//!
//! Resolved in order:
//! 1. `data_override` (the CLI's `--data` flag)
//! 2. The `CITYCARE_DATA` environment variable (primarily for testing)
//! 3. The OS-appropriate data directory (via the `directories` crate)
//!
//! ## Startup Sequence
//!
//! 1. Load [`CityCareConfig`] from `citycare.toml` in the data directory.
//! 2. Open the store. Opening is idempotent: missing partitions are created,
//!    existing ones are left alone.
//! 3. Move legacy reports out of the settings file (best effort).
//! 4. Build the HTTP remote and load the favorites set.

use crate::api::CityCareApi;
use crate::config::CityCareConfig;
use crate::error::{CityCareError, Result};
use crate::remote::http::{HttpRemote, HttpRemoteConfig};
use crate::settings::{migrate_legacy_reports, SettingsStore};
use crate::store::fs::FileStore;
use clapfig::{Clapfig, SearchMode, SearchPath};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DATA_ENV_VAR: &str = "CITYCARE_DATA";

pub struct CityCareContext {
    pub api: CityCareApi<FileStore, HttpRemote>,
    pub config: CityCareConfig,
    pub data_dir: PathBuf,
}

pub fn resolve_data_dir(data_override: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = data_override {
        return Ok(path);
    }
    if let Some(path) = std::env::var_os(DATA_ENV_VAR) {
        return Ok(PathBuf::from(path));
    }
    ProjectDirs::from("com", "citycare", "citycare")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| {
            CityCareError::StoreUnavailable("could not determine a data directory".into())
        })
}

pub fn load_config(data_dir: &Path) -> CityCareConfig {
    Clapfig::builder()
        .app_name("citycare")
        .file_name("citycare.toml")
        .search_paths(vec![SearchPath::Path(data_dir.to_path_buf())])
        .search_mode(SearchMode::Merge)
        .load()
        .unwrap_or_default()
}

/// Initialize the citycare context.
///
/// # Arguments
///
/// * `data_override` - Explicit data directory, bypassing env and OS lookup.
/// * `token` - Session token for the remote and for notification settings.
pub fn initialize(data_override: Option<PathBuf>, token: Option<String>) -> Result<CityCareContext> {
    let data_dir = resolve_data_dir(data_override)?;
    let config = load_config(&data_dir);

    let store = FileStore::open_fs(data_dir.clone())?;
    let settings = SettingsStore::new(&data_dir);

    // Best effort: a failed migration is retried on the next start
    if let Err(e) = migrate_legacy_reports(&settings, &store) {
        warn!(error = %e, "legacy report migration failed");
    }

    let remote = HttpRemote::new(HttpRemoteConfig {
        base_url: config.api_base_url.clone(),
        token: token.clone(),
        timeout_secs: config.request_timeout_secs,
    })?;
    let api = CityCareApi::new(store, remote, settings, token)?;

    Ok(CityCareContext {
        api,
        config,
        data_dir,
    })
}
