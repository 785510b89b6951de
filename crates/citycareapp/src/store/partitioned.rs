//! # Partitioned Store
//!
//! Implements [`RecordStore`] over any [`StorageBackend`]. Each partition is an
//! independent map persisted by the backend; every mutating call is one
//! load-modify-save of exactly one partition, run under the backend's write
//! lock so concurrent writers never drop each other's records.

use super::backend::StorageBackend;
use super::{OpenReport, RecordStore, StoreSchema, SCHEMA_VERSION};
use crate::error::{CityCareError, Result};
use crate::model::{Partition, Record};
use std::path::PathBuf;
use tracing::{debug, info};

pub struct PartitionedStore<B: StorageBackend> {
    /// The underlying storage backend.
    /// Exposed as pub(crate) for testing and internal access only.
    pub(crate) backend: B,
}

impl<B: StorageBackend> PartitionedStore<B> {
    /// Open the store, creating whatever part of the schema is missing.
    pub fn open(backend: B) -> Result<Self> {
        let store = Self { backend };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Idempotent schema setup.
    ///
    /// 1. Refuse manifests written by a newer schema version.
    /// 2. Create each missing partition empty; never rewrite an existing one.
    /// 3. Write the manifest only if it differs from the current one.
    pub fn ensure_schema(&self) -> Result<OpenReport> {
        let _guard = self.backend.lock_writes()?;
        let mut report = OpenReport::default();
        let existing = self.backend.load_schema()?;

        if let Some(schema) = &existing {
            if schema.version > SCHEMA_VERSION {
                return Err(CityCareError::StoreUnavailable(format!(
                    "store at {} has schema version {}, this build supports {}",
                    self.backend.location().display(),
                    schema.version,
                    SCHEMA_VERSION
                )));
            }
        }

        for partition in Partition::ALL {
            if !self.backend.partition_exists(partition)? {
                self.backend
                    .save_partition(partition, &Default::default())?;
                report.created_partitions.push(partition);
            }
        }

        let current = StoreSchema::current();
        if existing.as_ref() != Some(&current) {
            self.backend.save_schema(&current)?;
            report.schema_written = true;
        }

        if report.created_partitions.is_empty() && !report.schema_written {
            debug!(location = %self.backend.location().display(), "store opened, schema up to date");
        } else {
            info!(
                location = %self.backend.location().display(),
                created = ?report.created_partitions,
                "store schema initialized"
            );
        }

        Ok(report)
    }

    pub fn location(&self) -> PathBuf {
        self.backend.location()
    }

    /// Number of records in a partition.
    pub fn count(&self, partition: Partition) -> Result<usize> {
        Ok(self.backend.load_partition(partition)?.len())
    }
}

impl<B: StorageBackend> RecordStore for PartitionedStore<B> {
    fn put(&self, partition: Partition, record: &Record) -> Result<()> {
        let _guard = self.backend.lock_writes()?;
        let mut records = self.backend.load_partition(partition)?;
        let replaced = records
            .insert(record.id.clone(), record.clone())
            .is_some();
        self.backend.save_partition(partition, &records)?;

        debug!(%partition, id = %record.id, replaced, "record stored");
        Ok(())
    }

    fn put_all(&self, partition: Partition, records: &[Record]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let _guard = self.backend.lock_writes()?;
        let mut stored = self.backend.load_partition(partition)?;
        for record in records {
            stored.insert(record.id.clone(), record.clone());
        }
        self.backend.save_partition(partition, &stored)?;

        debug!(%partition, count = records.len(), "records stored");
        Ok(())
    }

    fn get(&self, partition: Partition, id: &str) -> Result<Option<Record>> {
        Ok(self.backend.load_partition(partition)?.remove(id))
    }

    fn get_all(&self, partition: Partition) -> Result<Vec<Record>> {
        Ok(self
            .backend
            .load_partition(partition)?
            .into_values()
            .collect())
    }

    fn delete(&self, partition: Partition, id: &str) -> Result<bool> {
        let _guard = self.backend.lock_writes()?;
        let mut records = self.backend.load_partition(partition)?;
        if records.remove(id).is_none() {
            debug!(%partition, id, "delete of absent record ignored");
            return Ok(false);
        }
        self.backend.save_partition(partition, &records)?;

        debug!(%partition, id, "record deleted");
        Ok(true)
    }
}
