//! Consensus gate outcomes.

use concordia_types::{Block, Round, VoteMessage, YacHash};

/// The decided outcome of one consensus round.
///
/// Created at most once per round by the vote tally, consumed exactly once by
/// the synchronizer. The gate emits outcomes in non-decreasing round order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateObject {
    /// The network committed the block we voted for. Carries the candidate
    /// block itself so the synchronizer can apply it without a round trip.
    PairValid {
        round: Round,
        hash: YacHash,
        block: Block,
        votes: Vec<VoteMessage>,
    },

    /// The network committed a hash that differs from our local candidate (or
    /// we had none). The block must be downloaded from the voters.
    VoteOther {
        round: Round,
        hash: YacHash,
        votes: Vec<VoteMessage>,
    },

    /// Supermajority agreed that no proposal was acceptable this round.
    ProposalReject { round: Round, votes: Vec<VoteMessage> },

    /// Votes split such that no block can reach supermajority this round.
    BlockReject { round: Round, votes: Vec<VoteMessage> },

    /// The round expired without any quorum being reachable.
    AgreementOnNone { round: Round },
}

impl GateObject {
    /// The round this outcome answers.
    pub fn round(&self) -> Round {
        match self {
            GateObject::PairValid { round, .. }
            | GateObject::VoteOther { round, .. }
            | GateObject::ProposalReject { round, .. }
            | GateObject::BlockReject { round, .. }
            | GateObject::AgreementOnNone { round } => *round,
        }
    }

    /// True for the outcomes that finalize a block this round.
    pub fn is_commit(&self) -> bool {
        matches!(
            self,
            GateObject::PairValid { .. } | GateObject::VoteOther { .. }
        )
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            GateObject::PairValid { .. } => "PairValid",
            GateObject::VoteOther { .. } => "VoteOther",
            GateObject::ProposalReject { .. } => "ProposalReject",
            GateObject::BlockReject { .. } => "BlockReject",
            GateObject::AgreementOnNone { .. } => "AgreementOnNone",
        }
    }
}
