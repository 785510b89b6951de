use super::fs_backend::FsBackend;
use super::partitioned::PartitionedStore;
use crate::error::Result;
use std::path::PathBuf;

/// Production store: one JSON file per partition under `root`.
pub type FileStore = PartitionedStore<FsBackend>;

impl FileStore {
    /// Open (and if needed initialize) the store rooted at `root`.
    pub fn open_fs(root: PathBuf) -> Result<Self> {
        PartitionedStore::open(FsBackend::new(root))
    }
}
