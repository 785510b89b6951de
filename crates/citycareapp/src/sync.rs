//! # Outbox Reconciliation
//!
//! [`reconcile`] drains the outbox against the remote submission endpoint.
//!
//! ## Algorithm
//!
//! 1. Read the pending list. Nothing queued: return at once, touching neither
//!    the store nor the network. This keeps opportunistic calls (on reconnect,
//!    on a timer) free when idle.
//! 2. Submit entries **one at a time**, in id order.
//! 3. Rejected by the remote: log, leave queued, continue.
//! 4. Transport failure: log, leave queued, continue.
//! 5. Accepted: acknowledge (delete from the outbox), continue.
//!
//! A failed entry is never modified, so the next pass resubmits exactly what
//! the user wrote. Entries do not influence each other: one bad record cannot
//! block the rest of the batch.
//!
//! ## Delivery Guarantees
//!
//! At-least-once. If the process dies between remote acceptance and the local
//! acknowledge, the entry is submitted again on the next pass. The remote sees
//! the same [`crate::remote::Submission::client_id`] both times.
//!
//! ## Overlapping Calls
//!
//! Two passes may run interleaved (a reconnect event and a timer firing
//! together). Both may submit the same entry; whichever acknowledges second
//! finds it already gone and the delete is a no-op.
//!
//! ## Errors
//!
//! Only a failure to read the pending list is returned as `Err`. Every
//! per-entry failure, including a failed acknowledge, is logged and recorded
//! in the [`SyncReport`].

use crate::error::Result;
use crate::outbox::Outbox;
use crate::remote::{RemoteService, Submission};
use crate::store::RecordStore;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Outcome of one reconciliation pass.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SyncReport {
    /// Accepted and removed from the outbox.
    pub submitted: Vec<String>,
    /// Declined by the remote: (id, message). Still queued.
    pub rejected: Vec<(String, String)>,
    /// Remote unreachable or call failed: (id, error). Still queued.
    pub failed: Vec<(String, String)>,
    /// Accepted, but the local delete failed: (id, error). Still queued and
    /// will be submitted again.
    pub unacknowledged: Vec<(String, String)>,
}

impl SyncReport {
    /// Entries processed in this pass.
    pub fn attempted(&self) -> usize {
        self.submitted.len() + self.rejected.len() + self.failed.len() + self.unacknowledged.len()
    }

    /// Entries left in the outbox by this pass.
    pub fn remaining(&self) -> usize {
        self.rejected.len() + self.failed.len() + self.unacknowledged.len()
    }

    pub fn is_noop(&self) -> bool {
        self.attempted() == 0
    }
}

pub async fn reconcile<S, R>(store: &S, remote: &R) -> Result<SyncReport>
where
    S: RecordStore + ?Sized,
    R: RemoteService + ?Sized,
{
    let outbox = Outbox::new(store);
    let pending = outbox.list_pending()?;
    let mut report = SyncReport::default();

    if pending.is_empty() {
        debug!("outbox empty, nothing to sync");
        return Ok(report);
    }

    info!(count = pending.len(), "syncing offline reports");

    for record in &pending {
        let submission = Submission::from(record);

        match remote.submit(&submission).await {
            Ok(reply) if reply.is_accepted() => match outbox.acknowledge(&record.id) {
                Ok(_) => {
                    info!(id = %record.id, "report synced");
                    report.submitted.push(record.id.clone());
                }
                Err(e) => {
                    error!(id = %record.id, error = %e, "report accepted but still queued");
                    report.unacknowledged.push((record.id.clone(), e.to_string()));
                }
            },
            Ok(reply) => {
                warn!(id = %record.id, reason = %reply.message, "report rejected by remote");
                report.rejected.push((record.id.clone(), reply.message));
            }
            Err(e) => {
                error!(id = %record.id, error = %e, "error syncing report");
                report.failed.push((record.id.clone(), e.to_string()));
            }
        }
    }

    info!(
        submitted = report.submitted.len(),
        remaining = report.remaining(),
        "sync pass finished"
    );
    Ok(report)
}

/// Run [`reconcile`] every `period` until `stop` resolves.
///
/// A pass that fails to read the outbox is logged and retried on the next
/// tick. A pass in flight when `stop` resolves is dropped at its next
/// suspension point, before any further submission starts.
pub async fn run_periodic<S, R, F>(store: &S, remote: &R, period: Duration, stop: F) -> Result<()>
where
    S: RecordStore + ?Sized,
    R: RemoteService + ?Sized,
    F: std::future::Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    tokio::pin!(stop);

    loop {
        tokio::select! {
            _ = &mut stop => return Ok(()),
            _ = ticker.tick() => {
                if let Err(e) = reconcile(store, remote).await {
                    error!(error = %e, "sync pass could not read the outbox");
                }
            }
        }
    }
}
