//! Node composition: the consensus gate, the synchronizer, and the runner
//! that wires them to storage and the network.
//!
//! The deterministic half lives in [`NodeState`]: it routes events to the
//! YAC gate and the synchronizer and merges their actions. The I/O half is
//! [`NodeRunner`]: a tokio event loop that executes actions against the
//! [`concordia_storage::LedgerStore`], an abstract [`PeerMessenger`], and an
//! abstract [`BlockLoader`]. Tests drive `NodeState` directly with an
//! in-memory harness; production hands the runner real transport
//! implementations.

mod commit;
mod config;
mod loader;
mod messenger;
mod runner;
mod state;

pub use commit::{attach_quorum_signatures, commit_blocks, recovered_votes};
pub use config::NodeConfig;
pub use loader::{handle_get_block, handle_get_blocks};
pub use messenger::{BlockLoader, LoaderError, MessengerError, PeerMessenger};
pub use runner::{NodeHandle, NodeRunner};
pub use state::NodeState;
