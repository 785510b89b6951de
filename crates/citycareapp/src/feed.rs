//! # Feed Loading and the Favorites Fallback
//!
//! The home screen shows the live listing from the remote. When that call
//! fails for any reason (unreachable, error envelope, unrecognized shape) the
//! screen shows the **favorites partition** instead: the reports the user
//! chose to keep are the offline data set. The `reports` cache is *not* used
//! as a fallback, even though it may hold more records.
//!
//! A successful listing is also written through to the `reports` partition,
//! keeping the canonical cache current. A failure to write that cache is
//! logged and does not fail the load.

use crate::error::Result;
use crate::favorites::FavoriteCache;
use crate::model::{Partition, Record};
use crate::remote::RemoteService;
use crate::store::RecordStore;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedSource {
    /// Fresh from the remote listing.
    Live,
    /// The remote failed; these are the stored favorites.
    FavoritesFallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feed {
    pub records: Vec<Record>,
    pub source: FeedSource,
    /// Why the live listing was not used.
    pub degraded_reason: Option<String>,
}

impl Feed {
    pub fn is_degraded(&self) -> bool {
        self.source == FeedSource::FavoritesFallback
    }

    /// Records matching `term` (see [`search`]).
    pub fn search(&self, term: &str) -> Vec<&Record> {
        search(&self.records, term)
    }
}

/// Fetch the listing, falling back to the favorites partition.
///
/// `favorites` is refreshed either way: on the live path from the partition,
/// on the fallback path from the very records being shown. Only a store
/// failure on the fallback path is returned as an error, since then there
/// is nothing to show.
pub async fn load_feed<S, R>(store: &S, remote: &R, favorites: &mut FavoriteCache) -> Result<Feed>
where
    S: RecordStore + ?Sized,
    R: RemoteService + ?Sized,
{
    match remote.list().await {
        Ok(records) => {
            cache_reports(store, &records);
            if let Err(e) = favorites.list_ids(store) {
                warn!(error = %e, "could not reload favorite ids");
            }
            info!(count = records.len(), "feed loaded from remote");
            Ok(Feed {
                records,
                source: FeedSource::Live,
                degraded_reason: None,
            })
        }
        Err(e) => {
            warn!(error = %e, "remote listing failed, showing favorites");
            let records = store.get_all(Partition::Favorites)?;
            favorites.replace_with(&records);
            Ok(Feed {
                records,
                source: FeedSource::FavoritesFallback,
                degraded_reason: Some(e.to_string()),
            })
        }
    }
}

fn cache_reports<S: RecordStore + ?Sized>(store: &S, records: &[Record]) {
    if let Err(e) = store.put_all(Partition::Reports, records) {
        warn!(count = records.len(), error = %e, "could not cache reports");
    }
}

/// Case-insensitive substring search over reporter name and description.
/// A blank term matches everything.
pub fn search<'a>(records: &'a [Record], term: &str) -> Vec<&'a Record> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return records.iter().collect();
    }
    records.iter().filter(|r| r.matches(&term)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CityCareError;
    use crate::store::memory::fixtures::StoreFixture;
    use crate::test_utils::{CountingStore, ScriptedRemote};

    fn story(id: &str, name: &str, description: &str) -> Record {
        let mut record = Record::new(description).with_id(id);
        record.name = Some(name.to_string());
        record
    }

    #[tokio::test]
    async fn test_live_feed_populates_report_cache() {
        let store = StoreFixture::new().build();
        let remote = ScriptedRemote::accepting().with_listing(vec![
            story("story-1", "Dimas", "flood"),
            story("story-2", "Ayu", "pothole"),
        ]);
        let mut favorites = FavoriteCache::default();

        let feed = load_feed(&store, &remote, &mut favorites).await.unwrap();

        assert_eq!(feed.source, FeedSource::Live);
        assert_eq!(feed.records.len(), 2);
        assert_eq!(store.get_all(Partition::Reports).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_fallback_serves_exactly_the_favorites() {
        let store = StoreFixture::new()
            .with_report("cached-1", "stale report")
            .with_report("cached-2", "another stale report")
            .with_favorite("fav-1", "liked report")
            .build();
        let remote = ScriptedRemote::accepting()
            .with_listing_error(CityCareError::Transport("offline".into()));
        let mut favorites = FavoriteCache::default();

        let feed = load_feed(&store, &remote, &mut favorites).await.unwrap();

        assert!(feed.is_degraded());
        assert_eq!(feed.records, store.get_all(Partition::Favorites).unwrap());
        assert!(feed.degraded_reason.unwrap().contains("offline"));
        assert!(favorites.contains("fav-1"));
    }

    #[tokio::test]
    async fn test_error_shaped_listing_falls_back() {
        let store = StoreFixture::new().with_favorite("fav-1", "liked").build();
        let remote = ScriptedRemote::accepting()
            .with_listing_error(CityCareError::ShapeMismatch("listing is a number".into()));
        let mut favorites = FavoriteCache::default();

        let feed = load_feed(&store, &remote, &mut favorites).await.unwrap();

        assert_eq!(feed.source, FeedSource::FavoritesFallback);
        assert_eq!(feed.records.len(), 1);
    }

    #[tokio::test]
    async fn test_fallback_with_no_favorites_is_empty_not_reports() {
        let store = StoreFixture::new().with_report("cached-1", "stale").build();
        let remote = ScriptedRemote::accepting()
            .with_listing_error(CityCareError::Transport("offline".into()));
        let mut favorites = FavoriteCache::default();

        let feed = load_feed(&store, &remote, &mut favorites).await.unwrap();

        assert!(feed.records.is_empty());
    }

    #[tokio::test]
    async fn test_cache_write_failure_does_not_fail_live_feed() {
        let store = StoreFixture::new().build();
        store.set_simulate_write_error(true);
        let remote =
            ScriptedRemote::accepting().with_listing(vec![story("story-1", "Dimas", "flood")]);
        let mut favorites = FavoriteCache::default();

        let feed = load_feed(&store, &remote, &mut favorites).await.unwrap();

        assert_eq!(feed.source, FeedSource::Live);
        assert_eq!(feed.records.len(), 1);
    }

    #[tokio::test]
    async fn test_live_feed_is_cached_in_one_write() {
        let store = CountingStore::new(StoreFixture::new().build());
        let listing: Vec<Record> = (0..20)
            .map(|i| story(&format!("story-{:02}", i), "Dimas", "flood"))
            .collect();
        let remote = ScriptedRemote::accepting().with_listing(listing);
        let mut favorites = FavoriteCache::default();

        load_feed(&store, &remote, &mut favorites).await.unwrap();

        assert_eq!(store.writes(), 1);
        assert_eq!(store.get_all(Partition::Reports).unwrap().len(), 20);
    }

    #[test]
    fn test_search_filters_case_insensitively() {
        let records = vec![
            story("1", "Dimas", "Flooded street near the market"),
            story("2", "Ayu", "Pothole on the main road"),
            story("3", "Rina", "Broken STREET light"),
        ];

        let hits: Vec<&str> = search(&records, "street")
            .into_iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(hits, vec!["1", "3"]);

        assert_eq!(search(&records, "AYU").len(), 1);
        assert_eq!(search(&records, "   ").len(), 3);
        assert!(search(&records, "earthquake").is_empty());
    }
}
