//! # Favorites
//!
//! Liked reports live in the `favorites` partition. [`FavoriteCache`] keeps the
//! set of their ids in memory so the UI can mark hearts without reading the
//! store for every card.
//!
//! The set is a cache, never a source of truth:
//! - [`FavoriteCache::load`] and [`FavoriteCache::list_ids`] rebuild it from the
//!   partition. Call them on cold start and after anything outside this cache
//!   (a sync pass, another process) may have changed the partition.
//! - [`FavoriteCache::toggle`] decides from current membership, never from a
//!   caller supplied flag, and updates the set only after the store write
//!   succeeded.
//!
//! The partition doubles as the offline data set: see [`crate::feed`].

use crate::error::{CityCareError, Result};
use crate::model::{FavoriteState, Partition, Record};
use crate::store::RecordStore;
use std::collections::HashSet;
use tracing::{debug, warn};

#[derive(Debug, Default, Clone)]
pub struct FavoriteCache {
    ids: HashSet<String>,
}

impl FavoriteCache {
    /// Build the cache from the favorites partition.
    pub fn load<S: RecordStore + ?Sized>(store: &S) -> Result<Self> {
        let mut cache = Self::default();
        cache.list_ids(store)?;
        Ok(cache)
    }

    /// Rebuild the id set from the partition and return it.
    pub fn list_ids<S: RecordStore + ?Sized>(&mut self, store: &S) -> Result<&HashSet<String>> {
        let records = store.get_all(Partition::Favorites)?;
        self.replace_with(&records);
        debug!(count = self.ids.len(), "favorite ids reloaded");
        Ok(&self.ids)
    }

    /// Reset the set to exactly the ids of `records`.
    pub fn replace_with(&mut self, records: &[Record]) {
        self.ids = records.iter().map(|r| r.id.clone()).collect();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn state(&self, id: &str) -> FavoriteState {
        FavoriteState::from(self.contains(id))
    }

    pub fn ids(&self) -> &HashSet<String> {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Like or unlike `record` depending on whether it is currently liked.
    ///
    /// On failure the set is unchanged and the error is
    /// [`CityCareError::FavoriteNotSaved`] carrying the pre-toggle state.
    pub fn toggle<S: RecordStore + ?Sized>(
        &mut self,
        store: &S,
        record: &Record,
    ) -> Result<FavoriteState> {
        let previous = self.state(&record.id);

        let written = match previous {
            FavoriteState::Favorited => store.delete(Partition::Favorites, &record.id).map(|_| ()),
            FavoriteState::NotFavorited => store.put(Partition::Favorites, record),
        };

        if let Err(source) = written {
            warn!(id = %record.id, error = %source, "could not save favorite");
            return Err(CityCareError::FavoriteNotSaved {
                previous,
                source: Box::new(source),
            });
        }

        let next = match previous {
            FavoriteState::Favorited => {
                self.ids.remove(&record.id);
                FavoriteState::NotFavorited
            }
            FavoriteState::NotFavorited => {
                self.ids.insert(record.id.clone());
                FavoriteState::Favorited
            }
        };
        debug!(id = %record.id, state = %next, "favorite toggled");
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::fixtures::StoreFixture;
    use crate::store::memory::InMemoryStore;

    #[test]
    fn test_s9_toggle_scenario() {
        let store = InMemoryStore::new();
        let mut favorites = FavoriteCache::load(&store).unwrap();
        let record = Record::new("flooded underpass").with_id("s9");

        assert_eq!(
            favorites.toggle(&store, &record).unwrap(),
            FavoriteState::Favorited
        );
        assert!(favorites.list_ids(&store).unwrap().contains("s9"));

        assert_eq!(
            favorites.toggle(&store, &record).unwrap(),
            FavoriteState::NotFavorited
        );
        assert!(!favorites.list_ids(&store).unwrap().contains("s9"));
    }

    #[test]
    fn test_toggle_twice_restores_original_content() {
        let store = StoreFixture::new()
            .with_favorite("s1", "original text")
            .build();
        let mut favorites = FavoriteCache::load(&store).unwrap();
        let before = store.get_all(Partition::Favorites).unwrap();
        let record = before[0].clone();

        favorites.toggle(&store, &record).unwrap();
        assert!(store.get(Partition::Favorites, "s1").unwrap().is_none());
        favorites.toggle(&store, &record).unwrap();

        assert_eq!(store.get_all(Partition::Favorites).unwrap(), before);
        assert!(favorites.contains("s1"));
    }

    #[test]
    fn test_toggle_follows_membership_not_caller() {
        let store = StoreFixture::new().with_favorite("s1", "liked").build();
        let mut favorites = FavoriteCache::default();

        // The stale cache thinks s1 is not liked; toggling adds it (upsert, no dup)
        favorites
            .toggle(&store, &Record::new("liked").with_id("s1"))
            .unwrap();
        assert_eq!(store.get_all(Partition::Favorites).unwrap().len(), 1);

        // After a rebuild, the cache agrees with the partition again
        favorites.list_ids(&store).unwrap();
        assert_eq!(favorites.state("s1"), FavoriteState::Favorited);
    }

    #[test]
    fn test_failed_like_reports_previous_state() {
        let store = InMemoryStore::new();
        let mut favorites = FavoriteCache::load(&store).unwrap();
        store.set_simulate_write_error(true);

        let err = favorites
            .toggle(&store, &Record::new("x").with_id("s2"))
            .unwrap_err();

        match err {
            CityCareError::FavoriteNotSaved { previous, source } => {
                assert_eq!(previous, FavoriteState::NotFavorited);
                assert!(source.is_storage_failure());
            }
            other => panic!("Expected FavoriteNotSaved, got {:?}", other),
        }
        assert!(!favorites.contains("s2"));
    }

    #[test]
    fn test_failed_unlike_keeps_membership() {
        let store = StoreFixture::new().with_favorite("s3", "liked").build();
        let mut favorites = FavoriteCache::load(&store).unwrap();
        store.set_simulate_write_error(true);

        let err = favorites
            .toggle(&store, &Record::new("liked").with_id("s3"))
            .unwrap_err();

        assert!(matches!(
            err,
            CityCareError::FavoriteNotSaved {
                previous: FavoriteState::Favorited,
                ..
            }
        ));
        assert!(favorites.contains("s3"));
    }

    #[test]
    fn test_list_ids_picks_up_external_changes() {
        let store = InMemoryStore::new();
        let mut favorites = FavoriteCache::load(&store).unwrap();
        assert!(favorites.is_empty());

        store
            .put(Partition::Favorites, &Record::new("elsewhere").with_id("s4"))
            .unwrap();
        assert!(!favorites.contains("s4"));

        assert_eq!(favorites.list_ids(&store).unwrap().len(), 1);
        assert!(favorites.contains("s4"));
    }
}
