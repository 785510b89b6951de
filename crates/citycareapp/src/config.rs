//! # Configuration
//!
//! CityCare configuration is managed by [`clapfig`], which handles layered
//! loading from a TOML file, environment variables, and compiled defaults.
//!
//! ## Resolution Order
//!
//! 1. **Environment variables**: `CITYCARE__API_BASE_URL`, `CITYCARE__REQUEST_TIMEOUT_SECS`, etc.
//! 2. **Config file**: `citycare.toml` in the data directory.
//! 3. **Compiled Defaults**: via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `api_base_url` | `https://story-api.dicoding.dev/v1` | Root of the story API |
//! | `request_timeout_secs` | `30` | Per-request timeout |
//! | `sync_interval_secs` | unset | Period for `citycare sync` when `--every` is absent |

use confique::Config;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://story-api.dicoding.dev/v1";

/// Configuration for citycare, stored in `citycare.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CityCareConfig {
    /// Root URL of the story API
    #[config(default = "https://story-api.dicoding.dev/v1")]
    pub api_base_url: String,

    /// Timeout for a single request, in seconds
    #[config(default = 30)]
    pub request_timeout_secs: u64,

    /// When set, `citycare sync` keeps running and syncs at this period.
    pub sync_interval_secs: Option<u64>,
}

impl Default for CityCareConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: 30,
            sync_interval_secs: None,
        }
    }
}

impl CityCareConfig {
    /// Sync period, ignoring a zero interval.
    pub fn sync_interval(&self) -> Option<Duration> {
        self.sync_interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}
