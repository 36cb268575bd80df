//! Event types for the deterministic state machine.

use crate::{GateObject, TimerId};
use concordia_types::{Block, BlockHeight, LedgerState, PeerId, Round, VoteMessage};

/// Events the state machine reacts to.
///
/// Events are **facts** - something that happened. The runner converts
/// network receipts, storage results, and timer expiry into events; the
/// `EnqueueInternal` action lets one sub-machine hand a fact to another at
/// the same instant.
#[derive(Debug, Clone)]
pub enum Event {
    // ═══════════════════════════════════════════════════════════════════════
    // Block pipeline
    // ═══════════════════════════════════════════════════════════════════════
    /// A locally validated candidate block is ready for consensus at `round`.
    CandidateBlockReady { round: Round, block: Block },

    // ═══════════════════════════════════════════════════════════════════════
    // Network
    // ═══════════════════════════════════════════════════════════════════════
    /// A transport-validated vote bundle arrived from a peer.
    VoteBundleReceived {
        from: PeerId,
        votes: Vec<VoteMessage>,
    },

    /// A catch-up fetch returned this peer's chain (possibly partial).
    ChainResponse { peer: PeerId, blocks: Vec<Block> },

    /// A catch-up fetch failed (timeout, refused connection, decode error).
    ChainFetchFailed { peer: PeerId },

    // ═══════════════════════════════════════════════════════════════════════
    // Internal (enqueued by sub-machines via Action::EnqueueInternal)
    // ═══════════════════════════════════════════════════════════════════════
    /// The vote tally decided a round.
    ConsensusOutcome { outcome: GateObject },

    // ═══════════════════════════════════════════════════════════════════════
    // Storage results
    // ═══════════════════════════════════════════════════════════════════════
    /// A commit request completed; the ledger tip moved.
    CommitCompleted { state: LedgerState },

    /// A commit request failed validation or application.
    CommitFailed { height: BlockHeight },

    // ═══════════════════════════════════════════════════════════════════════
    // Timers
    // ═══════════════════════════════════════════════════════════════════════
    /// A previously set timer fired.
    TimerFired { id: TimerId },
}

impl Event {
    /// Get the event type name for logging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Event::CandidateBlockReady { .. } => "CandidateBlockReady",
            Event::VoteBundleReceived { .. } => "VoteBundleReceived",
            Event::ChainResponse { .. } => "ChainResponse",
            Event::ChainFetchFailed { .. } => "ChainFetchFailed",
            Event::ConsensusOutcome { .. } => "ConsensusOutcome",
            Event::CommitCompleted { .. } => "CommitCompleted",
            Event::CommitFailed { .. } => "CommitFailed",
            Event::TimerFired { .. } => "TimerFired",
        }
    }
}
