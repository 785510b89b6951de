//! # Domain Model
//!
//! This module defines the core data structures: [`Record`], [`Partition`] and
//! [`FavoriteState`].
//!
//! ## Records
//!
//! A [`Record`] is a field report (the remote API calls them "stories"). The
//! `id` is the only identity: every partition is keyed by it, and writing a
//! record whose id already exists replaces the stored value.
//!
//! Records come from two places:
//! - **The user**: [`Record::new`] generates a local id (a v4 UUID). That id
//!   travels with the record through the outbox and is sent to the remote as
//!   the idempotency key.
//! - **The remote listing**: ids and metadata (`name`, `createdAt`, ...) are
//!   assigned server side. Fields this client does not know about are kept in
//!   [`Record::extra`] so a cached record round-trips without loss.
//!
//! ## Wire Format
//!
//! Records serialize with the remote's camelCase names:
//!
//! ```text
//! { "id": "story-1", "name": "Dimas", "description": "pothole",
//!   "photoUrl": "https://...", "createdAt": "2024-01-08T06:34:18.598Z",
//!   "lat": -6.2, "lon": 106.8 }
//! ```
//!
//! `photo` is accepted as an alias of `photoUrl` for records written by older
//! clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CityCareError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "photo", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    /// Reporter name, assigned by the remote.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Remote metadata this client does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Record {
    /// A new locally authored report with a freshly generated id.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            description: description.into(),
            photo_url: None,
            lat: None,
            lon: None,
            name: None,
            created_at: Some(Utc::now()),
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_photo(mut self, photo_url: impl Into<String>) -> Self {
        self.photo_url = Some(photo_url.into());
        self
    }

    pub fn with_location(mut self, lat: f64, lon: f64) -> Self {
        self.lat = Some(lat);
        self.lon = Some(lon);
        self
    }

    /// Case-insensitive match against the reporter name and description.
    /// `term` must already be lowercased.
    pub fn matches(&self, term: &str) -> bool {
        let name = self.name.as_deref().unwrap_or("");
        name.to_lowercase().contains(term) || self.description.to_lowercase().contains(term)
    }
}

/// The independently keyed collections of the durable store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    /// Canonical cache of remote data.
    Reports,
    /// Records waiting for remote submission.
    Outbox,
    /// Records the user liked.
    Favorites,
}

impl Partition {
    pub const ALL: [Partition; 3] = [Partition::Reports, Partition::Outbox, Partition::Favorites];

    pub fn name(self) -> &'static str {
        match self {
            Partition::Reports => "reports",
            Partition::Outbox => "outbox",
            Partition::Favorites => "favorites",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Partition {
    type Err = CityCareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Partition::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| CityCareError::Api(format!("Unknown partition: {}", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FavoriteState {
    Favorited,
    NotFavorited,
}

impl FavoriteState {
    pub fn is_favorited(self) -> bool {
        self == FavoriteState::Favorited
    }
}

impl From<bool> for FavoriteState {
    fn from(favorited: bool) -> Self {
        if favorited {
            FavoriteState::Favorited
        } else {
            FavoriteState::NotFavorited
        }
    }
}

impl fmt::Display for FavoriteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FavoriteState::Favorited => f.write_str("favorited"),
            FavoriteState::NotFavorited => f.write_str("not favorited"),
        }
    }
}
