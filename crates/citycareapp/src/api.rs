//! # API Facade
//!
//! [`CityCareApi`] is the single entry point for clients. It owns the store,
//! the remote, the settings and the in-memory favorites set, and dispatches
//! to the modules that hold the logic:
//!
//! | Concern | Module |
//! |---------|--------|
//! | Durable records | [`crate::store`] |
//! | Offline queue | [`crate::outbox`] |
//! | Reconciliation | [`crate::sync`] |
//! | Likes | [`crate::favorites`] |
//! | Home feed, search | [`crate::feed`] |
//! | Notification subscriptions | [`crate::settings`] |
//!
//! The facade does no I/O formatting: it returns data, the CLI renders it.
//!
//! ## Generic Over Store and Remote
//!
//! - Production: `CityCareApi<FileStore, HttpRemote>`
//! - Testing: `CityCareApi<InMemoryStore, ScriptedRemote>`

use crate::error::{CityCareError, Result};
use crate::favorites::FavoriteCache;
use crate::feed::{self, Feed};
use crate::model::{FavoriteState, Partition, Record};
use crate::outbox::Outbox;
use crate::remote::{RemoteService, Submission};
use crate::settings::{NotificationSubscriptions, SettingsStore};
use crate::store::RecordStore;
use crate::sync::{self, SyncReport};
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// What happened to a report handed to [`CityCareApi::submit_report`].
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Accepted by the remote and cached locally.
    Sent,
    /// The remote was unreachable; the report waits in the outbox.
    Queued { reason: String },
}

pub struct CityCareApi<S: RecordStore, R: RemoteService> {
    store: S,
    remote: R,
    settings: SettingsStore,
    favorites: FavoriteCache,
    feed: Option<Feed>,
    token: Option<String>,
}

impl<S: RecordStore, R: RemoteService> CityCareApi<S, R> {
    pub fn new(store: S, remote: R, settings: SettingsStore, token: Option<String>) -> Result<Self> {
        let favorites = FavoriteCache::load(&store)?;
        Ok(Self {
            store,
            remote,
            settings,
            favorites,
            feed: None,
            token,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // --- Reports ---

    pub fn save_report(&self, record: &Record) -> Result<()> {
        self.store.put(Partition::Reports, record)
    }

    pub fn reports(&self) -> Result<Vec<Record>> {
        self.store.get_all(Partition::Reports)
    }

    pub fn delete_report(&self, id: &str) -> Result<bool> {
        self.store.delete(Partition::Reports, id)
    }

    /// Send a report now, queueing it if the remote cannot be reached.
    ///
    /// A rejection is returned as [`CityCareError::Rejected`] and nothing is
    /// queued: resubmitting the same content would be declined again.
    pub async fn submit_report(&self, record: &Record) -> Result<SubmitOutcome> {
        match self.remote.submit(&Submission::from(record)).await {
            Ok(reply) if reply.is_accepted() => {
                if let Err(e) = self.save_report(record) {
                    warn!(id = %record.id, error = %e, "report sent but not cached");
                }
                info!(id = %record.id, "report sent");
                Ok(SubmitOutcome::Sent)
            }
            Ok(reply) => Err(CityCareError::Rejected(reply.message)),
            Err(e) => {
                self.enqueue(record)?;
                Ok(SubmitOutcome::Queued {
                    reason: e.to_string(),
                })
            }
        }
    }

    // --- Outbox ---

    pub fn enqueue(&self, record: &Record) -> Result<()> {
        Outbox::new(&self.store).enqueue(record)
    }

    pub fn pending(&self) -> Result<Vec<Record>> {
        Outbox::new(&self.store).list_pending()
    }

    /// One reconciliation pass, then a favorites rebuild.
    pub async fn sync(&mut self) -> Result<SyncReport> {
        let report = sync::reconcile(&self.store, &self.remote).await?;
        if !report.is_noop() {
            self.favorites.list_ids(&self.store)?;
        }
        Ok(report)
    }

    pub async fn sync_every<F>(&self, period: Duration, stop: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        sync::run_periodic(&self.store, &self.remote, period, stop).await
    }

    // --- Feed ---

    pub async fn load_feed(&mut self) -> Result<&Feed> {
        let loaded = feed::load_feed(&self.store, &self.remote, &mut self.favorites).await?;
        Ok(self.feed.insert(loaded))
    }

    /// Search the loaded feed. Empty when no feed was loaded.
    pub fn search(&self, term: &str) -> Vec<Record> {
        match &self.feed {
            Some(feed) => feed.search(term).into_iter().cloned().collect(),
            None => Vec::new(),
        }
    }

    // --- Favorites ---

    /// Like or unlike a report by id.
    ///
    /// The record is looked up in the loaded feed, then the report cache,
    /// then the favorites partition.
    pub fn toggle_favorite(&mut self, id: &str) -> Result<FavoriteState> {
        let record = self.find_record(id)?.ok_or_else(|| {
            CityCareError::Api(format!("No report with id {}", id))
        })?;
        self.favorites.toggle(&self.store, &record)
    }

    fn find_record(&self, id: &str) -> Result<Option<Record>> {
        if let Some(record) = self
            .feed
            .as_ref()
            .and_then(|feed| feed.records.iter().find(|r| r.id == id))
        {
            return Ok(Some(record.clone()));
        }
        if let Some(record) = self.store.get(Partition::Reports, id)? {
            return Ok(Some(record));
        }
        self.store.get(Partition::Favorites, id)
    }

    pub fn favorite_state(&self, id: &str) -> FavoriteState {
        self.favorites.state(id)
    }

    /// Rebuild the favorites set from the store and return the ids, sorted.
    pub fn favorite_ids(&mut self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.favorites.list_ids(&self.store)?.iter().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    pub fn favorites(&self) -> Result<Vec<Record>> {
        self.store.get_all(Partition::Favorites)
    }

    // --- Notifications ---

    fn session_token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| CityCareError::Api("Notifications require a session token".into()))
    }

    pub fn notifications_enabled(&self) -> Result<bool> {
        let token = self.session_token()?;
        NotificationSubscriptions::new(&self.settings).is_subscribed(token)
    }

    pub fn set_notifications(&self, enabled: bool) -> Result<()> {
        let token = self.session_token()?;
        NotificationSubscriptions::new(&self.settings).set(token, enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FeedSource;
    use crate::store::memory::fixtures::StoreFixture;
    use crate::store::memory::InMemoryStore;
    use crate::test_utils::{RemoteOutcome, ScriptedRemote, TestEnv};
    use tempfile::TempDir;

    fn api_with(
        store: InMemoryStore,
        remote: ScriptedRemote,
        token: Option<&str>,
    ) -> (TempDir, CityCareApi<InMemoryStore, ScriptedRemote>) {
        let dir = tempfile::tempdir().unwrap();
        let settings = SettingsStore::new(dir.path());
        let api = CityCareApi::new(store, remote, settings, token.map(String::from)).unwrap();
        (dir, api)
    }

    #[tokio::test]
    async fn test_submit_online_caches_report() {
        let (_dir, api) = api_with(InMemoryStore::new(), ScriptedRemote::accepting(), None);
        let record = Record::new("fallen tree").with_id("r1");

        assert_eq!(api.submit_report(&record).await.unwrap(), SubmitOutcome::Sent);
        assert_eq!(api.reports().unwrap(), vec![record]);
        assert!(api.pending().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_offline_queues_report() {
        let (_dir, api) = api_with(InMemoryStore::new(), ScriptedRemote::unreachable(), None);
        let record = Record::new("fallen tree").with_id("r1");

        let outcome = api.submit_report(&record).await.unwrap();

        assert!(matches!(outcome, SubmitOutcome::Queued { .. }));
        assert_eq!(api.pending().unwrap(), vec![record]);
        assert!(api.reports().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_rejected_is_not_queued() {
        let remote = ScriptedRemote::accepting()
            .with_outcome("r1", RemoteOutcome::Reject("photo is required".into()));
        let (_dir, api) = api_with(InMemoryStore::new(), remote, None);

        let err = api
            .submit_report(&Record::new("x").with_id("r1"))
            .await
            .unwrap_err();

        assert!(matches!(err, CityCareError::Rejected(ref m) if m == "photo is required"));
        assert!(api.pending().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sync_drains_queued_reports() {
        let store = StoreFixture::new().with_pending("a", "queued").build();
        let (_dir, mut api) = api_with(store, ScriptedRemote::accepting(), None);

        let report = api.sync().await.unwrap();

        assert_eq!(report.submitted, vec!["a"]);
        assert!(api.pending().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_favorite_from_feed() {
        let remote =
            ScriptedRemote::accepting().with_listing(vec![Record::new("flood").with_id("story-1")]);
        let (_dir, mut api) = api_with(InMemoryStore::new(), remote, None);

        api.load_feed().await.unwrap();
        assert_eq!(
            api.toggle_favorite("story-1").unwrap(),
            FavoriteState::Favorited
        );
        assert_eq!(api.favorite_ids().unwrap(), vec!["story-1"]);
        assert_eq!(api.favorites().unwrap().len(), 1);
    }

    #[test]
    fn test_toggle_unknown_id_is_an_error() {
        let (_dir, mut api) = api_with(InMemoryStore::new(), ScriptedRemote::accepting(), None);
        assert!(matches!(
            api.toggle_favorite("missing"),
            Err(CityCareError::Api(_))
        ));
    }

    #[test]
    fn test_unlike_works_offline_from_favorites_partition() {
        let store = StoreFixture::new().with_favorite("s1", "liked").build();
        let (_dir, mut api) = api_with(store, ScriptedRemote::unreachable(), None);

        assert_eq!(api.favorite_state("s1"), FavoriteState::Favorited);
        assert_eq!(
            api.toggle_favorite("s1").unwrap(),
            FavoriteState::NotFavorited
        );
        assert!(api.favorites().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_feed_fallback_and_search() {
        let mut liked = Record::new("Flooded underpass").with_id("fav-1");
        liked.name = Some("Ayu".into());
        let store = InMemoryStore::new();
        store.put(Partition::Favorites, &liked).unwrap();
        let (_dir, mut api) = api_with(store, ScriptedRemote::unreachable(), None);

        assert!(api.search("flood").is_empty());
        let feed = api.load_feed().await.unwrap();
        assert_eq!(feed.source, FeedSource::FavoritesFallback);

        assert_eq!(api.search("FLOOD"), vec![liked.clone()]);
        assert_eq!(api.search("ayu"), vec![liked]);
        assert!(api.search("pothole").is_empty());
    }

    #[test]
    fn test_notifications_need_token() {
        let (_dir, api) = api_with(InMemoryStore::new(), ScriptedRemote::accepting(), None);
        assert!(matches!(
            api.notifications_enabled(),
            Err(CityCareError::Api(_))
        ));
    }

    #[test]
    fn test_notifications_toggle() {
        let (_dir, api) = api_with(
            InMemoryStore::new(),
            ScriptedRemote::accepting(),
            Some("session-1"),
        );

        assert!(!api.notifications_enabled().unwrap());
        api.set_notifications(true).unwrap();
        assert!(api.notifications_enabled().unwrap());
        api.set_notifications(false).unwrap();
        assert!(!api.notifications_enabled().unwrap());
    }

    #[test]
    fn test_delete_report_is_noop_when_absent() {
        let store = StoreFixture::new().with_report("r1", "kept").build();
        let (_dir, api) = api_with(store, ScriptedRemote::accepting(), None);

        assert!(!api.delete_report("missing").unwrap());
        assert!(api.delete_report("r1").unwrap());
        assert!(api.reports().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_backed_queue_and_notifications() {
        let TestEnv {
            _temp_dir,
            store,
            settings,
            root,
        } = TestEnv::new();
        let api = CityCareApi::new(
            store,
            ScriptedRemote::unreachable(),
            settings,
            Some("session-1".into()),
        )
        .unwrap();

        api.submit_report(&Record::new("offline").with_id("q1"))
            .await
            .unwrap();
        api.set_notifications(true).unwrap();

        assert!(std::fs::read_to_string(root.join("outbox.json"))
            .unwrap()
            .contains("q1"));
        assert!(std::fs::read_to_string(root.join("settings.json"))
            .unwrap()
            .contains("session-1"));
    }
}
