use super::backend::{PartitionMap, StorageBackend};
use super::StoreSchema;
use crate::error::{CityCareError, Result};
use crate::model::Partition;
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use uuid::Uuid;

const SCHEMA_FILE: &str = "schema.json";
pub(crate) const LOCK_FILE: &str = ".lock";

/// Take the exclusive advisory lock on `<root>/.lock`, creating the directory
/// and the lock file if needed. The lock is released when the file is dropped.
pub(crate) fn lock_dir(root: &Path) -> Result<File> {
    ensure_dir(root)?;
    let lock_path = root.join(LOCK_FILE);
    let lock_file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .map_err(|e| {
            CityCareError::StoreUnavailable(format!(
                "cannot open lock {}: {}",
                lock_path.display(),
                e
            ))
        })?;
    FileExt::lock_exclusive(&lock_file).map_err(|e| {
        CityCareError::StoreUnavailable(format!("cannot lock {}: {}", lock_path.display(), e))
    })?;
    Ok(lock_file)
}

pub(crate) fn ensure_dir(root: &Path) -> Result<()> {
    if !root.exists() {
        fs::create_dir_all(root).map_err(|e| {
            CityCareError::StoreUnavailable(format!("cannot create {}: {}", root.display(), e))
        })?;
    }
    Ok(())
}

pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn partition_path(&self, partition: Partition) -> PathBuf {
        self.root.join(format!("{}.json", partition.name()))
    }

    fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(CityCareError::Io)?;
        let value = serde_json::from_str(&content).map_err(CityCareError::Serialization)?;
        Ok(Some(value))
    }

    /// Atomic write: the target is either the old or the new content, never a mix.
    fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T, stem: &str) -> Result<()> {
        ensure_dir(&self.root)?;

        let content = serde_json::to_string_pretty(value).map_err(CityCareError::Serialization)?;
        let tmp_path = self.root.join(format!(".{}-{}.tmp", stem, Uuid::new_v4()));
        if let Err(e) = fs::write(&tmp_path, content) {
            let _ = fs::remove_file(&tmp_path);
            return Err(CityCareError::Io(e));
        }
        fs::rename(&tmp_path, path).map_err(CityCareError::Io)?;

        Ok(())
    }
}

impl StorageBackend for FsBackend {
    fn load_schema(&self) -> Result<Option<StoreSchema>> {
        self.read_json(&self.root.join(SCHEMA_FILE))
    }

    fn save_schema(&self, schema: &StoreSchema) -> Result<()> {
        self.write_json(&self.root.join(SCHEMA_FILE), schema, "schema")
    }

    fn partition_exists(&self, partition: Partition) -> Result<bool> {
        Ok(self.partition_path(partition).is_file())
    }

    fn load_partition(&self, partition: Partition) -> Result<PartitionMap> {
        Ok(self
            .read_json(&self.partition_path(partition))?
            .unwrap_or_default())
    }

    fn save_partition(&self, partition: Partition, records: &PartitionMap) -> Result<()> {
        self.write_json(&self.partition_path(partition), records, partition.name())
    }

    type WriteLock<'a> = File where Self: 'a;

    fn lock_writes(&self) -> Result<File> {
        lock_dir(&self.root)
    }

    fn location(&self) -> PathBuf {
        self.root.clone()
    }
}
