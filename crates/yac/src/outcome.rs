//! Decided round outcomes.

use concordia_types::{Round, VoteMessage, YacHash};

/// Proof that a hash reached supermajority: the agreed hash plus the full
/// quorum of votes for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitCertificate {
    pub hash: YacHash,
    pub votes: Vec<VoteMessage>,
}

impl CommitCertificate {
    pub fn round(&self) -> Round {
        self.hash.vote_round
    }
}

/// Proof that no hash can reach supermajority this round: the votes on hand
/// demonstrating the split. Consensus retries at `round.next_reject()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectProof {
    pub round: Round,
    pub votes: Vec<VoteMessage>,
}

/// What the tally decided for a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Commit(CommitCertificate),
    Reject(RejectProof),
}

impl Outcome {
    pub fn round(&self) -> Round {
        match self {
            Outcome::Commit(cert) => cert.round(),
            Outcome::Reject(proof) => proof.round,
        }
    }

    pub fn is_commit(&self) -> bool {
        matches!(self, Outcome::Commit(_))
    }

    /// The votes backing this outcome.
    pub fn votes(&self) -> &[VoteMessage] {
        match self {
            Outcome::Commit(cert) => &cert.votes,
            Outcome::Reject(proof) => &proof.votes,
        }
    }
}
