//! # CityCare Architecture
//!
//! CityCare is an **offline-first field reporting core**. Citizens write reports
//! about problems in their city (a pothole, a flooded underpass) whether or not
//! the network is there; the library keeps them durably and delivers them to
//! the remote story API once it is reachable.
//!
//! Like any UI-agnostic library, it has no opinion on the terminal: the
//! `citycare` binary is one client among possible others.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (citycare crate)                                 │
//! │  - Parses arguments, renders output, installs logging       │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Facade owning store, remote, settings, favorites         │
//! │  - Returns structured Result types                          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Logic (outbox.rs, sync.rs, favorites.rs, feed.rs)          │
//! │  - Generic over RecordStore and RemoteService               │
//! └─────────────────────────────────────────────────────────────┘
//!                     │                         │
//!                     ▼                         ▼
//! ┌───────────────────────────────┐ ┌───────────────────────────┐
//! │  Storage (store/)             │ │  Remote (remote/)         │
//! │  - Partitioned, synchronous   │ │  - Async, HTTP + JSON     │
//! │  - FileStore, InMemoryStore   │ │  - HttpRemote             │
//! └───────────────────────────────┘ └───────────────────────────┘
//! ```
//!
//! ## Concurrency Model
//!
//! Every store call is short, synchronous and atomic on its own. Only remote
//! calls suspend. No lock is held across an `.await`, so several async tasks
//! may share one store; what they cannot rely on is atomicity across *several*
//! store calls. The outbox and favorites logic is written so that every step
//! is idempotent instead (upsert, no-op delete).
//!
//! ## Module Overview
//!
//! - [`api`]: The facade, entry point for all operations
//! - [`store`]: Partitioned record store and its backends
//! - [`outbox`]: Queue of reports waiting for the remote
//! - [`sync`]: Outbox reconciliation, one pass or periodic
//! - [`remote`]: Remote contract and the HTTP client
//! - [`favorites`]: Liked reports and the in-memory id set
//! - [`feed`]: Live listing with the favorites fallback, search
//! - [`settings`]: Scalar settings, notification subscriptions, legacy migration
//! - [`config`]: Configuration management
//! - [`init`]: Wiring from the environment
//! - [`model`]: Core data types
//! - [`error`]: Error types

pub mod api;
pub mod config;
pub mod error;
pub mod favorites;
pub mod feed;
pub mod init;
pub mod model;
pub mod outbox;
pub mod remote;
pub mod settings;
pub mod store;
pub mod sync;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
