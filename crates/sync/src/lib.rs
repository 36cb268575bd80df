//! Block synchronizer.
//!
//! Consumes consensus gate outcomes and drives the ledger forward:
//!
//! - A commit of our own candidate is applied through a fresh mutable
//!   storage (the runner executes the `CommitBlock` action).
//! - A commit of a hash we do not hold locally enters catch-up: the voters
//!   behind the winning bundle are asked, one after another, for the chain
//!   from our tip to the agreed block; the first valid chain is applied
//!   atomically.
//! - Rejects leave the ledger untouched; the next round's outcome drives the
//!   retry. There is no busy loop - progress is strictly event-driven.
//!
//! The state machine performs no I/O. Fetch timeouts, peer connections, and
//! storage sessions belong to the runner.

mod config;
mod state;
mod validator;

pub use config::SyncConfig;
pub use state::{SyncPhase, SyncStatus, SynchronizerState};
pub use validator::{ChainValidator, ValidationError};
