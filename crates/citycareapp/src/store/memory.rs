use super::mem_backend::MemBackend;
use super::partitioned::PartitionedStore;

pub type InMemoryStore = PartitionedStore<MemBackend>;

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        let store = PartitionedStore {
            backend: MemBackend::new(),
        };
        store
            .ensure_schema()
            .expect("memory backend only fails writes after set_simulate_write_error");
        store
    }

    /// Make every subsequent write fail with a storage error.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.backend.set_simulate_write_error(simulate);
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use crate::model::{Partition, Record};
    use crate::store::RecordStore;

    pub struct StoreFixture {
        pub store: InMemoryStore,
    }

    impl Default for StoreFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl StoreFixture {
        pub fn new() -> Self {
            Self {
                store: InMemoryStore::new(),
            }
        }

        pub fn with_pending(self, id: &str, description: &str) -> Self {
            self.with_record(Partition::Outbox, id, description)
        }

        pub fn with_favorite(self, id: &str, description: &str) -> Self {
            self.with_record(Partition::Favorites, id, description)
        }

        pub fn with_report(self, id: &str, description: &str) -> Self {
            self.with_record(Partition::Reports, id, description)
        }

        pub fn with_record(self, partition: Partition, id: &str, description: &str) -> Self {
            let record = Record::new(description).with_id(id);
            self.store.put(partition, &record).unwrap();
            self
        }

        pub fn build(self) -> InMemoryStore {
            self.store
        }
    }
}
