//! Composed node state machine.

use concordia_core::{Action, Event, StateMachine};
use concordia_storage::LedgerStore;
use concordia_sync::{ChainValidator, SyncPhase, SynchronizerState};
use concordia_types::{KeyPair, Round};
use concordia_yac::{RecoveredVotes, YacState};

use crate::NodeConfig;

/// Routes events to the gate and the synchronizer and merges their actions.
///
/// There is exactly one consumer for the gate's outcome stream - the
/// synchronizer - and the routing here is what enforces it: a
/// `ConsensusOutcome` event goes nowhere else.
pub struct NodeState {
    yac: YacState,
    sync: SynchronizerState,
}

impl NodeState {
    /// Build the node state over an opened store, recovering the chain tip
    /// and our own votes from it.
    pub fn new(config: NodeConfig, signing_key: KeyPair, store: &LedgerStore) -> Self {
        let (top_height, top_hash) = store.top();
        let recovered = RecoveredVotes {
            voted: store.all_own_votes(),
        };
        Self {
            yac: YacState::new(
                config.local_peer,
                signing_key,
                config.peers.clone(),
                config.yac,
                recovered,
            ),
            sync: SynchronizerState::new(
                config.sync,
                ChainValidator::new(config.peers),
                config.local_peer,
                top_height,
                top_hash,
            ),
        }
    }

    pub fn sync_phase(&self) -> SyncPhase {
        self.sync.phase()
    }

    pub fn top_height(&self) -> concordia_types::BlockHeight {
        self.sync.top_height()
    }

    /// Round of the most recently emitted outcome; own votes below it can be
    /// pruned from durable storage.
    pub fn settled_round(&self) -> Option<Round> {
        self.yac.last_emitted_round()
    }
}

impl StateMachine for NodeState {
    fn handle(&mut self, event: Event) -> Vec<Action> {
        match event {
            Event::CandidateBlockReady { round, block } => self.yac.on_candidate(round, block),
            Event::VoteBundleReceived { from, votes } => self.yac.on_bundle(from, votes),
            Event::TimerFired { .. } => self.yac.on_timer(),

            Event::ConsensusOutcome { outcome } => self.sync.on_outcome(outcome),
            Event::ChainResponse { peer, blocks } => self.sync.on_chain_response(peer, blocks),
            Event::ChainFetchFailed { peer } => self.sync.on_fetch_failed(peer),
            Event::CommitFailed { height } => self.sync.on_commit_failed(height),

            Event::CommitCompleted { state } => {
                let mut actions = self.sync.on_commit_completed(state);
                actions.extend(self.yac.on_commit_completed());
                actions
            }
        }
    }
}
