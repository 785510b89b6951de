//! # CLI Layer
//!
//! This module is **one possible UI client** for citycare. It is the only
//! place that knows about the terminal: it parses arguments, installs the log
//! subscriber, calls [`citycareapp::api::CityCareApi`] and renders the result.
//!
//! ## Structure
//!
//! - `setup`: clap definitions
//! - `commands`: `run()` and the per-command handlers
//! - `render`: turning records and reports into terminal text

mod commands;
mod render;
mod setup;

pub use commands::run;
