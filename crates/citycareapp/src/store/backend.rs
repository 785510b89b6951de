use super::StoreSchema;
use crate::error::Result;
use crate::model::{Partition, Record};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Records of one partition, keyed by id.
pub type PartitionMap = BTreeMap<String, Record>;

/// Abstract interface for raw storage I/O.
/// This trait handles the "how" of storage (filesystem vs memory),
/// while PartitionedStore handles the "what" (upsert, delete, schema setup).
pub trait StorageBackend {
    // --- Schema ---

    /// Load the schema manifest. Ok(None) if the store was never opened.
    fn load_schema(&self) -> Result<Option<StoreSchema>>;

    /// Persist the schema manifest.
    fn save_schema(&self, schema: &StoreSchema) -> Result<()>;

    // --- Partitions ---

    /// Whether the partition has been created.
    fn partition_exists(&self, partition: Partition) -> Result<bool>;

    /// Load every record of a partition.
    /// A partition that does not exist loads as empty.
    fn load_partition(&self, partition: Partition) -> Result<PartitionMap>;

    /// Replace the stored content of a partition.
    /// MUST be atomic (e.g. write to tmp then rename) to avoid partial writes.
    fn save_partition(&self, partition: Partition, records: &PartitionMap) -> Result<()>;

    // --- Locking ---

    /// Guard that keeps other writers out until it is dropped.
    type WriteLock<'a>
    where
        Self: 'a;

    /// Block until this caller is the only writer, across threads and
    /// processes sharing the same data. Every load-modify-save runs under it.
    fn lock_writes(&self) -> Result<Self::WriteLock<'_>>;

    // --- Paths ---

    /// Where the data lives. For FsBackend the real directory, for MemBackend
    /// a virtual path.
    fn location(&self) -> PathBuf;
}
