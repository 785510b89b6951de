use crate::error::{CityCareError, Result};
use crate::model::{Partition, Record};
use crate::remote::{RemoteService, Submission, SubmitResponse};
use crate::settings::SettingsStore;
use crate::store::fs::FileStore;
use crate::store::RecordStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

pub struct TestEnv {
    // We keep _temp_dir to ensure the directory is not dropped until the test is done
    pub _temp_dir: TempDir,
    pub store: FileStore,
    pub settings: SettingsStore,
    pub root: PathBuf,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        let store = FileStore::open_fs(root.clone()).expect("failed to open store");
        let settings = SettingsStore::new(&root);
        Self {
            _temp_dir: temp_dir,
            store,
            settings,
            root,
        }
    }
}

/// Store wrapper counting the mutating calls that reach the inner store.
pub struct CountingStore<S> {
    inner: S,
    writes: AtomicUsize,
}

impl<S: RecordStore> CountingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of `put`, `put_all` and `delete` calls so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn count(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

impl<S: RecordStore> RecordStore for CountingStore<S> {
    fn put(&self, partition: Partition, record: &Record) -> Result<()> {
        self.count();
        self.inner.put(partition, record)
    }

    fn put_all(&self, partition: Partition, records: &[Record]) -> Result<()> {
        self.count();
        self.inner.put_all(partition, records)
    }

    fn get(&self, partition: Partition, id: &str) -> Result<Option<Record>> {
        self.inner.get(partition, id)
    }

    fn get_all(&self, partition: Partition) -> Result<Vec<Record>> {
        self.inner.get_all(partition)
    }

    fn delete(&self, partition: Partition, id: &str) -> Result<bool> {
        self.count();
        self.inner.delete(partition, id)
    }
}

/// What a [`ScriptedRemote`] answers for one submission.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteOutcome {
    Accept,
    /// Reached and declined, with the server's message.
    Reject(String),
    /// Not reached.
    Fail(String),
}

/// Remote double answering from a script keyed by record id.
///
/// Ids without a scripted outcome get the default (accept for
/// [`ScriptedRemote::accepting`]). Every submission is recorded, including
/// failed ones.
pub struct ScriptedRemote {
    default: RemoteOutcome,
    outcomes: Mutex<HashMap<String, RemoteOutcome>>,
    submissions: Mutex<Vec<Submission>>,
    listing: Mutex<Result<Vec<Record>>>,
    delay: Option<Duration>,
}

impl ScriptedRemote {
    pub fn accepting() -> Self {
        Self::with_default(RemoteOutcome::Accept)
    }

    pub fn unreachable() -> Self {
        Self::with_default(RemoteOutcome::Fail("connection refused".into()))
            .with_listing_error(CityCareError::Transport("connection refused".into()))
    }

    pub fn with_default(default: RemoteOutcome) -> Self {
        Self {
            default,
            outcomes: Mutex::new(HashMap::new()),
            submissions: Mutex::new(Vec::new()),
            listing: Mutex::new(Ok(Vec::new())),
            delay: None,
        }
    }

    pub fn with_outcome(self, id: &str, outcome: RemoteOutcome) -> Self {
        self.set_outcome(id, outcome);
        self
    }

    pub fn set_outcome(&self, id: &str, outcome: RemoteOutcome) {
        self.outcomes
            .lock()
            .unwrap()
            .insert(id.to_string(), outcome);
    }

    /// Sleep before answering each submission, yielding to other tasks.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_listing(self, records: Vec<Record>) -> Self {
        *self.listing.lock().unwrap() = Ok(records);
        self
    }

    pub fn with_listing_error(self, error: CityCareError) -> Self {
        *self.listing.lock().unwrap() = Err(error);
        self
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn submitted_ids(&self) -> Vec<String> {
        self.submissions()
            .into_iter()
            .map(|s| s.client_id)
            .collect()
    }

    fn outcome_for(&self, id: &str) -> RemoteOutcome {
        self.outcomes
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }
}

#[async_trait]
impl RemoteService for ScriptedRemote {
    async fn submit(&self, submission: &Submission) -> Result<SubmitResponse> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.submissions.lock().unwrap().push(submission.clone());

        match self.outcome_for(&submission.client_id) {
            RemoteOutcome::Accept => Ok(SubmitResponse::accepted("Story created successfully")),
            RemoteOutcome::Reject(message) => Ok(SubmitResponse::rejected(message)),
            RemoteOutcome::Fail(message) => Err(CityCareError::Transport(message)),
        }
    }

    async fn list(&self) -> Result<Vec<Record>> {
        match &*self.listing.lock().unwrap() {
            Ok(records) => Ok(records.clone()),
            Err(e) => Err(replay(e)),
        }
    }
}

fn replay(error: &CityCareError) -> CityCareError {
    match error {
        CityCareError::Rejected(m) => CityCareError::Rejected(m.clone()),
        CityCareError::ShapeMismatch(m) => CityCareError::ShapeMismatch(m.clone()),
        CityCareError::StoreUnavailable(m) => CityCareError::StoreUnavailable(m.clone()),
        CityCareError::Api(m) => CityCareError::Api(m.clone()),
        other => CityCareError::Transport(other.to_string()),
    }
}
