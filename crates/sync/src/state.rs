//! Synchronizer state machine.

use crate::{ChainValidator, SyncConfig};
use concordia_core::{Action, GateObject};
use concordia_types::{Block, BlockHeight, Hash, LedgerState, PeerId, VoteMessage};
use serde::Serialize;
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Where the synchronizer is in its cycle.
///
/// ```text
/// Idle → Applying → Idle
///      ↘ Downloading → Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    /// Waiting for the next consensus outcome.
    Idle,
    /// A commit request is in flight to storage.
    Applying,
    /// Downloading missing blocks from the outcome's voters.
    Downloading,
}

impl SyncPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncPhase::Idle => "idle",
            SyncPhase::Applying => "applying",
            SyncPhase::Downloading => "downloading",
        }
    }
}

/// Snapshot of the synchronizer for external APIs.
#[derive(Debug, Clone, Serialize)]
pub struct SyncStatus {
    pub phase: SyncPhase,
    pub top_height: u64,
    pub target_hash: Option<String>,
    pub peers_remaining: usize,
}

/// An in-progress catch-up: whom to ask, and for what.
#[derive(Debug, Clone)]
struct Download {
    target_hash: Hash,
    /// Voters of the winning bundle, in bundle order, not yet asked.
    candidates: VecDeque<PeerId>,
    /// The peer currently being fetched from.
    current: Option<PeerId>,
}

/// Consumes gate outcomes and produces commit/fetch actions.
///
/// Invariants:
/// - at most one block (or chain) application is in flight at a time;
/// - blocks are applied strictly in increasing height order, never skipping
///   a height (the chain validator enforces contiguity from the local tip);
/// - exhausting every candidate peer returns to `Idle` - the retry is the
///   next round's outcome, not a busy loop.
pub struct SynchronizerState {
    #[allow(dead_code)]
    config: SyncConfig,
    validator: ChainValidator,
    /// Our own id; never a download candidate.
    local_peer: PeerId,
    phase: SyncPhase,
    /// Local committed tip, updated on every `CommitCompleted`.
    top_height: BlockHeight,
    top_hash: Hash,
    /// Voters of the outcome currently being applied; the download falls
    /// back to them if the direct apply fails.
    pending_voters: Vec<VoteMessage>,
    pending_target: Option<Hash>,
    download: Option<Download>,
}

impl SynchronizerState {
    pub fn new(
        config: SyncConfig,
        validator: ChainValidator,
        local_peer: PeerId,
        top_height: BlockHeight,
        top_hash: Hash,
    ) -> Self {
        Self {
            config,
            validator,
            local_peer,
            phase: SyncPhase::Idle,
            top_height,
            top_hash,
            pending_voters: Vec::new(),
            pending_target: None,
            download: None,
        }
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn top_height(&self) -> BlockHeight {
        self.top_height
    }

    /// Snapshot for status APIs.
    pub fn status(&self) -> SyncStatus {
        SyncStatus {
            phase: self.phase,
            top_height: self.top_height.0,
            target_hash: self
                .download
                .as_ref()
                .map(|d| d.target_hash.to_string())
                .or_else(|| self.pending_target.map(|h| h.to_string())),
            peers_remaining: self
                .download
                .as_ref()
                .map(|d| d.candidates.len())
                .unwrap_or(0),
        }
    }

    /// A consensus outcome arrived from the gate.
    pub fn on_outcome(&mut self, outcome: GateObject) -> Vec<Action> {
        if self.phase != SyncPhase::Idle {
            // One round-trip at a time: an in-flight application is never
            // preempted. A dropped commit resurfaces as catch-up on a later
            // outcome.
            warn!(
                outcome = outcome.kind(),
                phase = self.phase.as_str(),
                "outcome while busy, dropped"
            );
            return vec![];
        }

        match outcome {
            GateObject::PairValid {
                round,
                hash,
                block,
                votes,
            } => {
                info!(round = %round, height = %block.height(), "applying agreed candidate block");
                self.phase = SyncPhase::Applying;
                self.pending_target = Some(hash.block_hash);
                self.pending_voters = votes.clone();
                vec![Action::CommitBlock { block, votes }]
            }

            GateObject::VoteOther { round, hash, votes } => {
                info!(
                    round = %round,
                    target = %hash.block_hash,
                    "network committed a block we do not hold, downloading"
                );
                self.pending_target = Some(hash.block_hash);
                self.pending_voters = votes;
                self.start_download()
            }

            GateObject::ProposalReject { round, .. } => {
                info!(round = %round, "proposal rejected, awaiting next round");
                vec![]
            }

            GateObject::BlockReject { round, .. } => {
                info!(round = %round, "no block reached supermajority, awaiting retry round");
                vec![]
            }

            GateObject::AgreementOnNone { round } => {
                warn!(round = %round, "round abandoned without agreement");
                vec![]
            }
        }
    }

    /// Storage finished a commit (single block or downloaded chain).
    pub fn on_commit_completed(&mut self, state: LedgerState) -> Vec<Action> {
        self.top_height = state.top_block_height;
        self.top_hash = state.top_block_hash;
        self.phase = SyncPhase::Idle;
        self.download = None;
        self.pending_voters.clear();
        self.pending_target = None;

        info!(height = %state.top_block_height, "ledger advanced");
        vec![Action::EmitLedgerState { state }]
    }

    /// Storage refused the commit.
    pub fn on_commit_failed(&mut self, height: BlockHeight) -> Vec<Action> {
        match self.phase {
            SyncPhase::Applying => {
                // Our candidate did not fit the chain; the agreed block must
                // be fetched from the peers that voted for it.
                warn!(height = %height, "direct apply failed, falling back to download");
                self.start_download()
            }
            SyncPhase::Downloading => {
                warn!(height = %height, "downloaded chain failed to apply, trying next peer");
                self.try_next_peer()
            }
            SyncPhase::Idle => {
                debug!(height = %height, "commit failure while idle, ignored");
                vec![]
            }
        }
    }

    /// A peer answered a chain fetch.
    pub fn on_chain_response(&mut self, peer: PeerId, blocks: Vec<Block>) -> Vec<Action> {
        let Some(download) = &self.download else {
            debug!(peer = %peer, "chain response while not downloading, ignored");
            return vec![];
        };
        if download.current != Some(peer) {
            debug!(peer = %peer, "chain response from a peer we are not waiting on, ignored");
            return vec![];
        }

        let target = download.target_hash;
        match self
            .validator
            .validate_chain(&blocks, self.top_height, self.top_hash, &target)
        {
            Ok(()) => {
                info!(
                    peer = %peer,
                    blocks = blocks.len(),
                    "downloaded chain is valid, committing"
                );
                vec![Action::CommitChain { blocks }]
            }
            Err(e) => {
                warn!(peer = %peer, error = %e, "downloaded chain rejected");
                self.try_next_peer()
            }
        }
    }

    /// A chain fetch timed out or errored.
    pub fn on_fetch_failed(&mut self, peer: PeerId) -> Vec<Action> {
        let Some(download) = &self.download else {
            return vec![];
        };
        if download.current != Some(peer) {
            return vec![];
        }
        warn!(peer = %peer, "chain fetch failed");
        self.try_next_peer()
    }

    fn start_download(&mut self) -> Vec<Action> {
        let Some(target_hash) = self.pending_target else {
            warn!("download requested without a target, returning to idle");
            self.phase = SyncPhase::Idle;
            return vec![];
        };

        // Ask the voters behind the winning bundle, in bundle order,
        // deduplicated. They claimed to have the block; nobody else is
        // guaranteed to.
        let mut candidates = VecDeque::new();
        for vote in &self.pending_voters {
            if vote.voter != self.local_peer && !candidates.contains(&vote.voter) {
                candidates.push_back(vote.voter);
            }
        }

        self.phase = SyncPhase::Downloading;
        self.download = Some(Download {
            target_hash,
            candidates,
            current: None,
        });
        self.try_next_peer()
    }

    fn try_next_peer(&mut self) -> Vec<Action> {
        let Some(download) = &mut self.download else {
            self.phase = SyncPhase::Idle;
            return vec![];
        };

        match download.candidates.pop_front() {
            Some(peer) => {
                download.current = Some(peer);
                debug!(peer = %peer, from = %self.top_height.next(), "requesting chain");
                vec![Action::FetchChain {
                    peer,
                    from_height: self.top_height.next(),
                }]
            }
            None => {
                // Every voter failed us. Go idle; the next outcome retries.
                warn!("all candidate peers exhausted, returning to idle");
                self.phase = SyncPhase::Idle;
                self.download = None;
                self.pending_voters.clear();
                self.pending_target = None;
                vec![]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concordia_types::test_utils::{test_peer_set, test_vote};
    use concordia_types::{BlockHeader, KeyPair, PeerSet, Round, YacHash};

    fn signed_block(height: u64, prev_hash: Hash, keys: &[KeyPair]) -> Block {
        let mut block = Block {
            header: BlockHeader {
                height: BlockHeight(height),
                prev_hash,
                proposal_hash: Hash::ZERO,
                created_at: height * 1000,
            },
            transactions: vec![],
            signatures: vec![],
        };
        for i in 0..3u64 {
            block.sign_as(PeerId(i), &keys[i as usize]);
        }
        block
    }

    fn chain(from_height: u64, from_hash: Hash, len: u64, keys: &[KeyPair]) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut prev = from_hash;
        for i in 0..len {
            let b = signed_block(from_height + 1 + i, prev, keys);
            prev = b.hash();
            blocks.push(b);
        }
        blocks
    }

    fn sync_at(peers: &PeerSet, height: u64, hash: Hash) -> SynchronizerState {
        SynchronizerState::new(
            SyncConfig::default(),
            ChainValidator::new(peers.clone()),
            PeerId(0),
            BlockHeight(height),
            hash,
        )
    }

    fn vote_other(round: Round, target: Hash, voters: &[u64], keys: &[KeyPair]) -> GateObject {
        let hash = YacHash::new(round, Hash::from_bytes(b"p"), target);
        let votes = voters
            .iter()
            .map(|&i| test_vote(hash.clone(), PeerId(i), &keys[i as usize]))
            .collect();
        GateObject::VoteOther {
            round,
            hash,
            votes,
        }
    }

    fn ledger_state(height: u64, hash: Hash) -> LedgerState {
        LedgerState {
            top_block_height: BlockHeight(height),
            top_block_hash: hash,
            peers: vec![],
        }
    }

    #[test]
    fn test_pair_valid_commits_block() {
        let (peers, keys) = test_peer_set(4);
        let top_hash = Hash::from_bytes(b"tip");
        let mut sync = sync_at(&peers, 5, top_hash);

        let block = signed_block(6, top_hash, &keys);
        let round = Round::new(5, 0);
        let hash = YacHash::new(round, Hash::ZERO, block.hash());
        let votes: Vec<_> = (0..3u64)
            .map(|i| test_vote(hash.clone(), PeerId(i), &keys[i as usize]))
            .collect();

        let actions = sync.on_outcome(GateObject::PairValid {
            round,
            hash,
            block: block.clone(),
            votes,
        });
        assert!(matches!(
            &actions[..],
            [Action::CommitBlock { block: b, .. }] if b.hash() == block.hash()
        ));
        assert_eq!(sync.phase(), SyncPhase::Applying);

        // Completion returns to idle and publishes the new state.
        let actions = sync.on_commit_completed(ledger_state(6, block.hash()));
        assert!(matches!(&actions[..], [Action::EmitLedgerState { .. }]));
        assert_eq!(sync.phase(), SyncPhase::Idle);
        assert_eq!(sync.top_height(), BlockHeight(6));
    }

    #[test]
    fn test_outcome_while_busy_is_dropped() {
        let (peers, keys) = test_peer_set(4);
        let top_hash = Hash::from_bytes(b"tip");
        let mut sync = sync_at(&peers, 5, top_hash);

        let block = signed_block(6, top_hash, &keys);
        let round = Round::new(5, 0);
        let hash = YacHash::new(round, Hash::ZERO, block.hash());
        sync.on_outcome(GateObject::PairValid {
            round,
            hash,
            block,
            votes: vec![],
        });

        let second = vote_other(Round::new(5, 1), Hash::from_bytes(b"x"), &[1, 2, 3], &keys);
        assert!(sync.on_outcome(second).is_empty());
    }

    #[test]
    fn test_catch_up_falls_through_to_second_peer() {
        let (peers, keys) = test_peer_set(4);
        let top_hash = Hash::from_bytes(b"tip-at-5");
        let mut sync = sync_at(&peers, 5, top_hash);

        // Target is three blocks ahead, vouched for by peers 1, 2, 3.
        let full_chain = chain(5, top_hash, 3, &keys);
        let target = full_chain.last().unwrap().hash();
        let actions = sync.on_outcome(vote_other(Round::new(8, 0), target, &[1, 2, 3], &keys));

        // First fetch goes to peer 1, from our height + 1.
        assert!(matches!(
            &actions[..],
            [Action::FetchChain { peer: PeerId(1), from_height: BlockHeight(6) }]
        ));

        // Peer 1 returns an incomplete chain: fall through to peer 2.
        let partial = full_chain[..2].to_vec();
        let actions = sync.on_chain_response(PeerId(1), partial);
        assert!(matches!(
            &actions[..],
            [Action::FetchChain { peer: PeerId(2), from_height: BlockHeight(6) }]
        ));

        // Peer 2 returns the full valid chain: commit it atomically.
        let actions = sync.on_chain_response(PeerId(2), full_chain.clone());
        assert!(matches!(
            &actions[..],
            [Action::CommitChain { blocks }] if blocks.len() == 3
        ));

        // Exactly one application: height becomes 8 once.
        let actions = sync.on_commit_completed(ledger_state(8, target));
        assert!(matches!(&actions[..], [Action::EmitLedgerState { .. }]));
        assert_eq!(sync.top_height(), BlockHeight(8));
        assert_eq!(sync.phase(), SyncPhase::Idle);
    }

    #[test]
    fn test_fetch_timeout_tries_next_peer() {
        let (peers, keys) = test_peer_set(4);
        let top_hash = Hash::from_bytes(b"tip");
        let mut sync = sync_at(&peers, 5, top_hash);

        sync.on_outcome(vote_other(
            Round::new(8, 0),
            Hash::from_bytes(b"target"),
            &[1, 2],
            &keys,
        ));

        let actions = sync.on_fetch_failed(PeerId(1));
        assert!(matches!(
            &actions[..],
            [Action::FetchChain { peer: PeerId(2), .. }]
        ));
    }

    #[test]
    fn test_exhausting_all_peers_returns_to_idle() {
        let (peers, keys) = test_peer_set(4);
        let mut sync = sync_at(&peers, 5, Hash::from_bytes(b"tip"));

        sync.on_outcome(vote_other(
            Round::new(8, 0),
            Hash::from_bytes(b"target"),
            &[1, 2],
            &keys,
        ));
        assert!(matches!(
            &sync.on_fetch_failed(PeerId(1))[..],
            [Action::FetchChain { peer: PeerId(2), .. }]
        ));
        assert!(sync.on_fetch_failed(PeerId(2)).is_empty());
        assert_eq!(sync.phase(), SyncPhase::Idle);

        // No busy loop: nothing further happens until the next outcome.
        assert!(sync.on_fetch_failed(PeerId(2)).is_empty());
    }

    #[test]
    fn test_failed_direct_apply_falls_back_to_download() {
        let (peers, keys) = test_peer_set(4);
        let top_hash = Hash::from_bytes(b"tip");
        let mut sync = sync_at(&peers, 5, top_hash);

        let block = signed_block(6, Hash::from_bytes(b"different-tip"), &keys);
        let round = Round::new(5, 0);
        let hash = YacHash::new(round, Hash::ZERO, block.hash());
        let votes: Vec<_> = (1..4u64)
            .map(|i| test_vote(hash.clone(), PeerId(i), &keys[i as usize]))
            .collect();
        sync.on_outcome(GateObject::PairValid {
            round,
            hash,
            block,
            votes,
        });

        let actions = sync.on_commit_failed(BlockHeight(6));
        assert!(matches!(
            &actions[..],
            [Action::FetchChain { peer: PeerId(1), .. }]
        ));
        assert_eq!(sync.phase(), SyncPhase::Downloading);
    }

    #[test]
    fn test_response_from_unexpected_peer_ignored() {
        let (peers, keys) = test_peer_set(4);
        let mut sync = sync_at(&peers, 5, Hash::from_bytes(b"tip"));

        sync.on_outcome(vote_other(
            Round::new(8, 0),
            Hash::from_bytes(b"target"),
            &[1, 2],
            &keys,
        ));

        // We are waiting on peer 1; peer 3's response is not folded in.
        assert!(sync.on_chain_response(PeerId(3), vec![]).is_empty());
        assert_eq!(sync.phase(), SyncPhase::Downloading);
    }

    #[test]
    fn test_rejects_leave_synchronizer_idle() {
        let (peers, _) = test_peer_set(4);
        let mut sync = sync_at(&peers, 5, Hash::from_bytes(b"tip"));

        assert!(sync
            .on_outcome(GateObject::BlockReject {
                round: Round::new(5, 0),
                votes: vec![],
            })
            .is_empty());
        assert!(sync
            .on_outcome(GateObject::AgreementOnNone {
                round: Round::new(5, 1),
            })
            .is_empty());
        assert_eq!(sync.phase(), SyncPhase::Idle);
    }

    #[test]
    fn test_status_snapshot() {
        let (peers, keys) = test_peer_set(4);
        let mut sync = sync_at(&peers, 5, Hash::from_bytes(b"tip"));
        sync.on_outcome(vote_other(
            Round::new(8, 0),
            Hash::from_bytes(b"target"),
            &[1, 2, 3],
            &keys,
        ));

        let status = sync.status();
        assert_eq!(status.phase, SyncPhase::Downloading);
        assert_eq!(status.top_height, 5);
        assert_eq!(status.peers_remaining, 2);

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["phase"], "downloading");
        assert_eq!(json["top_height"], 5);
    }
}
