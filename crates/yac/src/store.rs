//! Cross-round vote store.

use crate::{Outcome, RoundStorage};
use concordia_types::{Round, VoteMessage};
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

/// Holds the per-round storages plus the set of rounds already answered.
///
/// A processed round never yields another outcome, no matter what arrives
/// for it - this is what makes outcome emission at-most-once per round even
/// when commit certificates are re-gossiped.
#[derive(Debug, Default)]
pub struct VoteStore {
    rounds: BTreeMap<Round, RoundStorage>,
    processed: BTreeSet<Round>,
}

impl VoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a vote into its round's storage.
    ///
    /// Returns the outcome if this vote decided a not-yet-processed round.
    pub fn store(&mut self, vote: VoteMessage, peers_in_round: usize) -> Option<Outcome> {
        let round = vote.round();
        if self.processed.contains(&round) {
            trace!(round = %round, "vote for processed round dropped");
            return None;
        }
        self.rounds
            .entry(round)
            .or_insert_with(|| RoundStorage::new(round, peers_in_round))
            .insert(vote)
    }

    /// The decided outcome of a round, if any (kept after processing so late
    /// voters can be answered with the certificate).
    pub fn state_of(&self, round: Round) -> Option<&Outcome> {
        self.rounds.get(&round).and_then(RoundStorage::state)
    }

    /// True once an outcome for the round has been emitted downstream.
    pub fn is_processed(&self, round: Round) -> bool {
        self.processed.contains(&round)
    }

    /// Mark a round answered; no further outcome will ever be emitted for it.
    pub fn mark_processed(&mut self, round: Round) {
        self.processed.insert(round);
    }

    /// Drop all state strictly below `round`. Called once a commit makes
    /// older rounds unreachable.
    pub fn prune_below(&mut self, round: Round) {
        self.rounds = self.rounds.split_off(&round);
        self.processed = self.processed.split_off(&round);
    }

    /// Number of rounds currently held (for tests and introspection).
    pub fn round_count(&self) -> usize {
        self.rounds.len()
    }
}
