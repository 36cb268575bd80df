//! # Ledger Storage
//!
//! RocksDB-backed durable storage for the chain: the append-only block
//! store, the World State View (WSV) projections, auxiliary lookup indices,
//! consensus safety records, and the ordering service's resume state.
//!
//! All operations are synchronous blocking I/O. Callers in async contexts
//! should use `spawn_blocking` if needed to avoid blocking the runtime.
//!
//! # Commit pipeline
//!
//! A block reaches disk through a [`MutableStorage`]: a scoped, single-use
//! transactional handle. `apply` executes the block's commands against a
//! staged overlay; nothing is durable until [`LedgerStore::commit`] writes
//! the staged blocks, WSV changes, and chain metadata in one atomic batch.
//! An optional [`LedgerStore::prepare_block`] durably stages the pending
//! writes beforehand, so a crash between prepare and commit is detected on
//! the next startup and rolled back before any new mutable storage is
//! issued.
//!
//! Indices are built strictly after the block write and are best-effort: an
//! index failure is logged but never rolls back a committed block.

mod error;
mod index;
mod mutable;
mod ordering;
mod query;
mod store;
mod wsv;

pub use error::{CommandError, CommitError, StorageError};
pub use index::BlockIndexer;
pub use mutable::MutableStorage;
pub use ordering::OrderingState;
pub use query::BlockQuery;
pub use store::{CompressionType, LedgerStore, StoreConfig};
pub use wsv::{execute_command, Account, Asset, Wsv};
