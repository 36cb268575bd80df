//! Per-round vote storage and outcome calculation.

use crate::{reject_proved, Outcome, RejectProof, VoteSet};
use concordia_types::{PeerId, Round, VoteMessage};
use std::collections::HashSet;
use tracing::{debug, trace};

/// All votes received for one round, across every hash, plus the round's
/// decided outcome once one exists.
///
/// The outcome is computed inside `insert`, synchronously with the vote that
/// caused it, and cached: a round never changes its mind.
#[derive(Debug, Clone)]
pub struct RoundStorage {
    round: Round,
    peers_in_round: usize,
    sets: Vec<VoteSet>,
    state: Option<Outcome>,
}

impl RoundStorage {
    pub fn new(round: Round, peers_in_round: usize) -> Self {
        Self {
            round,
            peers_in_round,
            sets: Vec::new(),
            state: None,
        }
    }

    pub fn round(&self) -> Round {
        self.round
    }

    /// The cached outcome, if the round is decided.
    pub fn state(&self) -> Option<&Outcome> {
        self.state.as_ref()
    }

    /// Insert a vote; returns the outcome if this vote decided the round.
    ///
    /// Once decided, further inserts are ignored and return `None` - the
    /// at-most-one-outcome invariant lives here.
    pub fn insert(&mut self, vote: VoteMessage) -> Option<Outcome> {
        if vote.round() != self.round {
            return None;
        }
        if self.state.is_some() {
            trace!(round = %self.round, voter = %vote.voter, "vote after round decided, ignored");
            return None;
        }

        let inserted = self.find_or_create(&vote).insert(vote);
        if !inserted {
            return None;
        }

        if let Some(cert) = self
            .sets
            .iter()
            .find_map(|s| s.committed(self.peers_in_round))
        {
            debug!(round = %self.round, votes = cert.votes.len(), "round committed");
            self.state = Some(Outcome::Commit(cert));
        } else if let Some(proof) = self.find_reject_proof() {
            debug!(round = %self.round, votes = proof.votes.len(), "round rejected");
            self.state = Some(Outcome::Reject(proof));
        }

        self.state.clone()
    }

    fn find_or_create(&mut self, vote: &VoteMessage) -> &mut VoteSet {
        if let Some(idx) = self.sets.iter().position(|s| *s.hash() == vote.hash) {
            &mut self.sets[idx]
        } else {
            self.sets.push(VoteSet::new(vote.hash.clone()));
            self.sets.last_mut().expect("just pushed")
        }
    }

    /// Reject is proven when even the most popular hash, joined by every peer
    /// that has not voted yet, would still miss supermajority.
    fn find_reject_proof(&self) -> Option<RejectProof> {
        let max_count = self.sets.iter().map(VoteSet::len).max().unwrap_or(0);
        let voted = self.distinct_voters();

        if reject_proved(max_count, voted, self.peers_in_round) {
            Some(RejectProof {
                round: self.round,
                votes: self.all_votes(),
            })
        } else {
            None
        }
    }

    fn distinct_voters(&self) -> usize {
        let mut voters: HashSet<PeerId> = HashSet::new();
        for set in &self.sets {
            voters.extend(set.votes().iter().map(|v| v.voter));
        }
        voters.len()
    }

    /// Every vote held for this round, across all hashes.
    pub fn all_votes(&self) -> Vec<VoteMessage> {
        self.sets.iter().flat_map(|s| s.votes().to_vec()).collect()
    }
}
