//! # Outbox
//!
//! Reports written while the remote is unreachable wait in the `outbox`
//! partition. Membership *is* the pending state: there is no status field, no
//! retry counter. An entry leaves the outbox only through [`Outbox::acknowledge`],
//! which the reconciler calls after the remote accepted it.

use crate::error::Result;
use crate::model::{Partition, Record};
use crate::store::RecordStore;
use tracing::info;

/// The outbox view of a store.
pub struct Outbox<S: RecordStore> {
    store: S,
}

impl<S: RecordStore> Outbox<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Queue a record for submission. Re-queueing the same id replaces it.
    pub fn enqueue(&self, record: &Record) -> Result<()> {
        self.store.put(Partition::Outbox, record)?;
        info!(id = %record.id, "queued for sync");
        Ok(())
    }

    pub fn list_pending(&self) -> Result<Vec<Record>> {
        self.store.get_all(Partition::Outbox)
    }

    /// Drop an entry the remote accepted. Acknowledging an id that is no
    /// longer queued is a no-op.
    pub fn acknowledge(&self, id: &str) -> Result<bool> {
        let removed = self.store.delete(Partition::Outbox, id)?;
        if removed {
            info!(id, "outbox entry cleared");
        }
        Ok(removed)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.list_pending()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::fixtures::StoreFixture;
    use crate::store::memory::InMemoryStore;

    #[test]
    fn test_enqueue_then_list() {
        let store = InMemoryStore::new();
        let outbox = Outbox::new(&store);

        outbox
            .enqueue(&Record::new("pothole").with_id("r1"))
            .unwrap();

        let pending = outbox.list_pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].description, "pothole");
        // Only the outbox partition is touched
        assert!(store.get_all(Partition::Reports).unwrap().is_empty());
    }

    #[test]
    fn test_requeue_replaces() {
        let store = InMemoryStore::new();
        let outbox = Outbox::new(&store);
        let mut record = Record::new("draft").with_id("r1");

        outbox.enqueue(&record).unwrap();
        record.description = "final".into();
        outbox.enqueue(&record).unwrap();

        assert_eq!(outbox.len().unwrap(), 1);
        assert_eq!(outbox.list_pending().unwrap()[0].description, "final");
    }

    #[test]
    fn test_acknowledge_removes_only_that_entry() {
        let store = StoreFixture::new()
            .with_pending("a", "first")
            .with_pending("b", "second")
            .build();
        let outbox = Outbox::new(&store);

        assert!(outbox.acknowledge("a").unwrap());
        let ids: Vec<String> = outbox
            .list_pending()
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[test]
    fn test_acknowledge_twice_is_noop() {
        let store = StoreFixture::new().with_pending("a", "first").build();
        let outbox = Outbox::new(&store);

        assert!(outbox.acknowledge("a").unwrap());
        assert!(!outbox.acknowledge("a").unwrap());
        assert!(outbox.is_empty().unwrap());
    }

    #[test]
    fn test_enqueue_failure_surfaces_storage_error() {
        let store = InMemoryStore::new();
        store.set_simulate_write_error(true);

        let err = Outbox::new(&store)
            .enqueue(&Record::new("offline"))
            .unwrap_err();
        assert!(err.is_storage_failure());
    }
}
