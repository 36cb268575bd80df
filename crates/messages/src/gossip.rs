//! Gossip messages broadcast between peers.

use crate::TransportError;
use concordia_types::{NetworkMessage, Round, VoteMessage};
use sbor::prelude::BasicSbor;

/// A bundle of votes exchanged by the `SendState` protocol.
///
/// One vote is an ordinary voting step; a full quorum of votes is a commit
/// (or reject) certificate being propagated. Either way the bundle must be
/// internally consistent: non-empty and single-round. Cryptographic
/// verification is the consensus layer's job, not the transport's.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct VoteBundleGossip {
    pub votes: Vec<VoteMessage>,
}

impl VoteBundleGossip {
    pub fn new(votes: Vec<VoteMessage>) -> Self {
        Self { votes }
    }

    /// The round all votes in a valid bundle share.
    pub fn round(&self) -> Option<Round> {
        self.votes.first().map(|v| v.round())
    }

    /// Stateless transport validation: non-empty, one round, not oversized.
    pub fn validate(&self, peers_in_network: usize) -> Result<(), TransportError> {
        let Some(first) = self.votes.first() else {
            return Err(TransportError::EmptyBundle);
        };
        let round = first.round();
        for vote in &self.votes[1..] {
            if vote.round() != round {
                return Err(TransportError::InconsistentRounds(round, vote.round()));
            }
        }
        if self.votes.len() > peers_in_network {
            return Err(TransportError::OversizedBundle {
                votes: self.votes.len(),
                peers: peers_in_network,
            });
        }
        Ok(())
    }
}

impl NetworkMessage for VoteBundleGossip {
    fn message_type_id() -> &'static str {
        "yac.state"
    }
}
