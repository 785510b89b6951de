use super::backend::{PartitionMap, StorageBackend};
use super::StoreSchema;
use crate::error::{CityCareError, Result};
use crate::model::Partition;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// In-memory storage backend for testing.
///
/// Uses `Mutex` for interior mutability so a store built on it can be shared
/// with async tasks. Locks are only held for the duration of a single call.
#[derive(Default)]
pub struct MemBackend {
    write_lock: Mutex<()>,
    schema: Mutex<Option<StoreSchema>>,
    partitions: Mutex<HashMap<Partition, PartitionMap>>,
    simulate_write_error: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.simulate_write_error.load(Ordering::SeqCst) {
            return Err(CityCareError::StoreUnavailable(
                "Simulated write error".to_string(),
            ));
        }
        Ok(())
    }
}

impl StorageBackend for MemBackend {
    fn load_schema(&self) -> Result<Option<StoreSchema>> {
        Ok(lock(&self.schema).clone())
    }

    fn save_schema(&self, schema: &StoreSchema) -> Result<()> {
        self.check_writable()?;
        *lock(&self.schema) = Some(schema.clone());
        Ok(())
    }

    fn partition_exists(&self, partition: Partition) -> Result<bool> {
        Ok(lock(&self.partitions).contains_key(&partition))
    }

    fn load_partition(&self, partition: Partition) -> Result<PartitionMap> {
        Ok(lock(&self.partitions)
            .get(&partition)
            .cloned()
            .unwrap_or_default())
    }

    fn save_partition(&self, partition: Partition, records: &PartitionMap) -> Result<()> {
        self.check_writable()?;
        lock(&self.partitions).insert(partition, records.clone());
        Ok(())
    }

    type WriteLock<'a> = MutexGuard<'a, ()> where Self: 'a;

    fn lock_writes(&self) -> Result<MutexGuard<'_, ()>> {
        Ok(lock(&self.write_lock))
    }

    fn location(&self) -> PathBuf {
        PathBuf::from("memory://citycare-db")
    }
}
