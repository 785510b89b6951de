//! # Storage Layer
//!
//! This module defines the durable, partitioned record store. The [`RecordStore`]
//! trait is what the rest of the crate talks to; the [`backend::StorageBackend`]
//! trait is the raw I/O underneath it.
//!
//! ## Partitions
//!
//! The store is split into independent named partitions (see
//! [`crate::model::Partition`]):
//!
//! | Partition   | Holds                                     | Records leave when          |
//! |-------------|-------------------------------------------|-----------------------------|
//! | `reports`   | Canonical cache of remote data            | The user deletes them       |
//! | `outbox`    | Reports written while offline             | The remote accepted them    |
//! | `favorites` | Reports the user liked                    | The user unlikes them       |
//!
//! Each partition is keyed by [`crate::model::Record::id`]. Keyspaces are disjoint:
//! the same id may live in several partitions with different content.
//!
//! ## Contract
//!
//! - **Upsert**: `put` inserts or replaces. It never fails because the id exists.
//! - **Absence is not an error**: `get` returns `None`, `get_all` returns an empty
//!   `Vec`, and `delete` of a missing id is a no-op returning `false`.
//! - **Per-call atomicity**: every `put`/`put_all`/`delete` is a single
//!   read-modify-write of one partition, committed with an atomic replace. A
//!   *sequence* of calls is not atomic; callers rely on each call being
//!   idempotent instead.
//! - **Serialized writers**: the read-modify-write runs under the backend's
//!   write lock. For [`fs::FileStore`] that is an exclusive `flock` on
//!   `<data dir>/.lock`, so two processes on one directory never lose each
//!   other's writes. Reads take no lock; the atomic replace keeps them whole.
//! - **Failures**: anything that prevents reading or writing the store surfaces as
//!   an error for which [`crate::error::CityCareError::is_storage_failure`] is true.
//!   A failed write never touches other partitions.
//!
//! ## Opening
//!
//! [`partitioned::PartitionedStore::open`] is idempotent. It creates any missing
//! partition (empty) and records the schema manifest, leaving existing partitions
//! and their data alone. Opening the same directory on every process start is the
//! expected usage.
//!
//! ## Storage Layout
//!
//! ```text
//! <data dir>/
//! ├── schema.json       # Store name, schema version, partition list
//! ├── reports.json      # { "<id>": Record, ... }
//! ├── outbox.json
//! ├── favorites.json
//! ├── .lock             # Writer lock, empty
//! └── settings.json     # Scalar settings (see crate::settings), not a partition
//! ```
//!
//! ## Implementations
//!
//! - [`fs::FileStore`]: production store over [`fs_backend::FsBackend`].
//! - [`memory::InMemoryStore`]: for testing logic without filesystem I/O.

use crate::error::Result;
use crate::model::{Partition, Record};
use serde::{Deserialize, Serialize};

pub mod backend;
pub mod fs;
pub mod fs_backend;
pub mod mem_backend;
pub mod memory;
pub mod partitioned;

/// Name recorded in the schema manifest.
pub const STORE_NAME: &str = "citycare-db";

/// Bump when the partition set or the record layout changes.
pub const SCHEMA_VERSION: u32 = 1;

/// The schema manifest persisted next to the partitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSchema {
    pub name: String,
    pub version: u32,
    pub partitions: Vec<Partition>,
}

impl StoreSchema {
    pub fn current() -> Self {
        Self {
            name: STORE_NAME.to_string(),
            version: SCHEMA_VERSION,
            partitions: Partition::ALL.to_vec(),
        }
    }
}

/// What [`partitioned::PartitionedStore::open`] had to do.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OpenReport {
    pub created_partitions: Vec<Partition>,
    pub schema_written: bool,
}

/// Abstract interface for partitioned record storage.
///
/// All methods take `&self`: the store holds no in-memory state of its own, so a
/// single store can be shared by the reconciler and the UI. Writers are
/// serialized inside the store.
pub trait RecordStore {
    /// Insert or replace the record at `record.id`.
    fn put(&self, partition: Partition, record: &Record) -> Result<()>;

    /// Insert or replace every record in one write. Either all of them are
    /// stored or none is.
    fn put_all(&self, partition: Partition, records: &[Record]) -> Result<()>;

    /// Get a record by id.
    fn get(&self, partition: Partition, id: &str) -> Result<Option<Record>>;

    /// All records in the partition, ordered by id.
    fn get_all(&self, partition: Partition) -> Result<Vec<Record>>;

    /// Remove a record. Returns whether it was present.
    fn delete(&self, partition: Partition, id: &str) -> Result<bool>;
}

impl<T: RecordStore + ?Sized> RecordStore for &T {
    fn put(&self, partition: Partition, record: &Record) -> Result<()> {
        (**self).put(partition, record)
    }

    fn put_all(&self, partition: Partition, records: &[Record]) -> Result<()> {
        (**self).put_all(partition, records)
    }

    fn get(&self, partition: Partition, id: &str) -> Result<Option<Record>> {
        (**self).get(partition, id)
    }

    fn get_all(&self, partition: Partition) -> Result<Vec<Record>> {
        (**self).get_all(partition)
    }

    fn delete(&self, partition: Partition, id: &str) -> Result<bool> {
        (**self).delete(partition, id)
    }
}
