//! Action types for the deterministic state machine.

use crate::{message::OutboundMessage, Event, TimerId};
use concordia_types::{Block, BlockHeight, Hash, LedgerState, PeerId, Round, VoteMessage};
use std::time::Duration;

/// Actions the state machine wants to perform.
///
/// Actions are **commands** - they describe something to do.
/// The runner executes actions and may convert results back into events.
#[derive(Debug, Clone)]
pub enum Action {
    // ═══════════════════════════════════════════════════════════════════════
    // Network
    // ═══════════════════════════════════════════════════════════════════════
    /// Broadcast a message to every peer in the network.
    Broadcast { message: OutboundMessage },

    /// Send a message to one named peer.
    SendTo {
        peer: PeerId,
        message: OutboundMessage,
    },

    /// Request a peer's chain from `from_height` to its tip.
    ///
    /// The runner performs the blocking fetch under its timeout and answers
    /// with `Event::ChainResponse` or `Event::ChainFetchFailed`.
    FetchChain {
        peer: PeerId,
        from_height: BlockHeight,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Timers
    // ═══════════════════════════════════════════════════════════════════════
    /// Set a timer to fire after a duration.
    SetTimer { id: TimerId, duration: Duration },

    /// Cancel a previously set timer.
    CancelTimer { id: TimerId },

    // ═══════════════════════════════════════════════════════════════════════
    // Internal (fed back as events before any external event)
    // ═══════════════════════════════════════════════════════════════════════
    /// Enqueue an internal event for immediate processing.
    EnqueueInternal { event: Event },

    // ═══════════════════════════════════════════════════════════════════════
    // Storage
    // ═══════════════════════════════════════════════════════════════════════
    /// Persist our own vote before it is broadcast.
    ///
    /// Safety critical: after a crash we must remember which hash we voted
    /// for at this round, or a restart could equivocate.
    PersistOwnVote { round: Round, block_hash: Hash },

    /// Apply and commit one agreed block through a fresh mutable storage.
    ///
    /// `votes` is the quorum that finalized the block; the committed block
    /// carries these as its signature set. The runner answers with
    /// `Event::CommitCompleted` or `Event::CommitFailed`.
    CommitBlock {
        block: Block,
        votes: Vec<VoteMessage>,
    },

    /// Validate and commit a downloaded chain atomically, lowest height
    /// first, through a single mutable storage.
    CommitChain { blocks: Vec<Block> },

    // ═══════════════════════════════════════════════════════════════════════
    // External notifications
    // ═══════════════════════════════════════════════════════════════════════
    /// Publish the post-commit ledger snapshot to subscribers.
    EmitLedgerState { state: LedgerState },
}

impl Action {
    /// Check if this action reaches the network.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Action::Broadcast { .. } | Action::SendTo { .. } | Action::FetchChain { .. }
        )
    }

    /// Check if this action touches durable storage.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Action::PersistOwnVote { .. } | Action::CommitBlock { .. } | Action::CommitChain { .. }
        )
    }

    /// Get the action type name for logging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Action::Broadcast { .. } => "Broadcast",
            Action::SendTo { .. } => "SendTo",
            Action::FetchChain { .. } => "FetchChain",
            Action::SetTimer { .. } => "SetTimer",
            Action::CancelTimer { .. } => "CancelTimer",
            Action::EnqueueInternal { .. } => "EnqueueInternal",
            Action::PersistOwnVote { .. } => "PersistOwnVote",
            Action::CommitBlock { .. } => "CommitBlock",
            Action::CommitChain { .. } => "CommitChain",
            Action::EmitLedgerState { .. } => "EmitLedgerState",
        }
    }
}
