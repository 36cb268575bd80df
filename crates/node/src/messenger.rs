//! Abstract transport boundaries.
//!
//! The node never owns sockets. Vote gossip goes through a [`PeerMessenger`]
//! and catch-up downloads through a [`BlockLoader`]; production backs these
//! with its RPC stack, tests with in-memory channels.

use concordia_messages::VoteBundleGossip;
use concordia_types::{Block, BlockHeight, Hash, PeerId};

/// Failure to hand a message to the transport.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MessengerError {
    #[error("peer {0} unreachable")]
    PeerUnreachable(PeerId),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Failure to retrieve blocks from a peer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoaderError {
    #[error("peer {0} unreachable")]
    PeerUnreachable(PeerId),

    #[error("request timed out")]
    Timeout,

    #[error("peer does not have the requested block")]
    NotFound,

    #[error("transport error: {0}")]
    Transport(String),
}

/// Fire-and-forget vote transport to named peers.
pub trait PeerMessenger: Send + Sync {
    /// Deliver a bundle to every other peer.
    fn broadcast(&self, message: &VoteBundleGossip) -> Result<(), MessengerError>;

    /// Deliver a bundle to one peer.
    fn send_to(&self, peer: PeerId, message: &VoteBundleGossip) -> Result<(), MessengerError>;
}

/// Block retrieval from a peer's store.
///
/// Implementations block the calling thread; the runner wraps calls in
/// `spawn_blocking` under its fetch timeout, and a timeout counts as peer
/// failure.
pub trait BlockLoader: Send + Sync {
    /// The peer's chain from `from` (inclusive) to its tip, ascending.
    fn retrieve_blocks(&self, peer: PeerId, from: BlockHeight) -> Result<Vec<Block>, LoaderError>;

    /// One block by content hash.
    fn retrieve_block(&self, peer: PeerId, hash: Hash) -> Result<Block, LoaderError>;
}
