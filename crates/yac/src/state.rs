//! YAC consensus gate state machine.
//!
//! Bridges the vote tally to the rest of the system: votes in, at most one
//! `GateObject` per round out.

use crate::{verify_votes, Outcome, VoteStore, YacConfig};
use concordia_core::{Action, Event, GateObject, OutboundMessage, TimerId};
use concordia_messages::VoteBundleGossip;
use concordia_types::{
    block_signature_message, Block, Hash, KeyPair, PeerId, PeerSet, Round, VoteMessage, YacHash,
};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Own votes recovered from storage on startup.
///
/// Safety critical: a restarted peer must not vote for a different hash at a
/// round it already voted in. For a fresh start, use
/// `RecoveredVotes::default()`.
#[derive(Debug, Clone, Default)]
pub struct RecoveredVotes {
    /// Round → block hash we voted for.
    pub voted: BTreeMap<Round, Hash>,
}

/// The local candidate being voted on this round.
#[derive(Debug, Clone)]
struct Candidate {
    round: Round,
    block: Block,
    vote: VoteMessage,
}

/// YAC consensus gate.
///
/// # State Machine Flow
///
/// 1. **Candidate ready** → persist own vote, broadcast it, start retry timer
/// 2. **Vote bundle received** → verify signatures, fold into tally
/// 3. **Quorum or reject proof reached** → emit `GateObject`, exactly once
/// 4. **Retry timer** → re-broadcast own vote while the round is open
///
/// Outcomes are emitted in non-decreasing round order; bundles for processed
/// rounds are answered with the stored commit certificate (late-arrival
/// tolerance) or silently dropped.
pub struct YacState {
    /// This peer's identity.
    local_peer: PeerId,

    /// Signing key for votes and block signatures.
    signing_key: KeyPair,

    /// The fixed peer membership for the current chain.
    peers: PeerSet,

    config: YacConfig,

    /// Votes by round, with processed-round marks.
    store: VoteStore,

    /// The block we are currently voting for, if any.
    candidate: Option<Candidate>,

    /// Our own votes by round. Seeded from storage on restart.
    voted_rounds: BTreeMap<Round, Hash>,

    /// Round of the last emitted outcome; emission never goes backwards.
    last_emitted: Option<Round>,

    /// Retries spent on the currently open round.
    retries: u32,
}

impl YacState {
    pub fn new(
        local_peer: PeerId,
        signing_key: KeyPair,
        peers: PeerSet,
        config: YacConfig,
        recovered: RecoveredVotes,
    ) -> Self {
        Self {
            local_peer,
            signing_key,
            peers,
            config,
            store: VoteStore::new(),
            candidate: None,
            voted_rounds: recovered.voted,
            last_emitted: None,
            retries: 0,
        }
    }

    pub fn peers(&self) -> &PeerSet {
        &self.peers
    }

    /// True once the round has been answered.
    pub fn is_processed(&self, round: Round) -> bool {
        self.store.is_processed(round)
    }

    /// The round we are currently voting in, if any.
    pub fn candidate_round(&self) -> Option<Round> {
        self.candidate.as_ref().map(|c| c.round)
    }

    /// Round of the most recently emitted outcome.
    pub fn last_emitted_round(&self) -> Option<Round> {
        self.last_emitted
    }

    /// A locally validated candidate block is ready: vote for it.
    pub fn on_candidate(&mut self, round: Round, block: Block) -> Vec<Action> {
        let block_hash = block.hash();

        if let Some(previous) = self.voted_rounds.get(&round) {
            if *previous != block_hash {
                warn!(
                    round = %round,
                    voted = %previous,
                    candidate = %block_hash,
                    "refusing to vote for a second hash at an already-voted round"
                );
                return vec![];
            }
        }

        let height = block.header.height.0;
        let block_signature = self
            .signing_key
            .sign(&block_signature_message(height, &block_hash));
        let yac_hash = YacHash::new(round, block.header.proposal_hash, block_hash)
            .with_block_signature(block_signature);
        let vote = VoteMessage::sign(yac_hash, self.local_peer, &self.signing_key);

        info!(round = %round, hash = %block_hash, "voting for candidate block");

        self.voted_rounds.insert(round, block_hash);
        self.candidate = Some(Candidate {
            round,
            block,
            vote: vote.clone(),
        });
        self.retries = 0;

        // Persist before broadcast: a crash in between must find the vote.
        let mut actions = vec![Action::PersistOwnVote { round, block_hash }];

        // Our own vote joins the tally like any other (it decides the round
        // by itself in a single-peer network).
        let outcome = self.store.store(vote.clone(), self.peers.len());

        actions.push(Action::Broadcast {
            message: OutboundMessage::VoteBundle(VoteBundleGossip::new(vec![vote])),
        });
        actions.push(Action::SetTimer {
            id: TimerId::VoteRetry,
            duration: self.config.vote_retry_interval,
        });

        if let Some(outcome) = outcome {
            actions.extend(self.emit(outcome));
        }
        actions
    }

    /// No valid candidate exists for `round`: vote for the empty hash, so
    /// the round can close with `ProposalReject` once a supermajority agrees
    /// there is nothing to commit.
    pub fn on_no_candidate(&mut self, round: Round) -> Vec<Action> {
        if let Some(previous) = self.voted_rounds.get(&round) {
            if !previous.is_zero() {
                warn!(round = %round, "already voted for a block this round, not voting empty");
                return vec![];
            }
        }

        let vote = VoteMessage::sign(YacHash::empty(round), self.local_peer, &self.signing_key);
        info!(round = %round, "voting empty, no candidate this round");

        self.voted_rounds.insert(round, Hash::ZERO);
        self.candidate = None;
        self.retries = 0;

        let mut actions = vec![Action::PersistOwnVote {
            round,
            block_hash: Hash::ZERO,
        }];
        let outcome = self.store.store(vote.clone(), self.peers.len());
        actions.push(Action::Broadcast {
            message: OutboundMessage::VoteBundle(VoteBundleGossip::new(vec![vote])),
        });
        if let Some(outcome) = outcome {
            actions.extend(self.emit(outcome));
        }
        actions
    }

    /// A transport-validated vote bundle arrived.
    pub fn on_bundle(&mut self, from: PeerId, votes: Vec<VoteMessage>) -> Vec<Action> {
        let Some(first) = votes.first() else {
            return vec![];
        };
        let round = first.round();
        if votes.iter().any(|v| v.round() != round) {
            warn!(from = %from, "bundle mixes rounds past transport validation, dropped");
            return vec![];
        }

        if self.store.is_processed(round) {
            // Late arrival. If we hold the commit certificate, answer the
            // sender directly so it can close the round too.
            if let Some(Outcome::Commit(cert)) = self.store.state_of(round) {
                debug!(round = %round, to = %from, "answering late vote with commit certificate");
                return vec![Action::SendTo {
                    peer: from,
                    message: OutboundMessage::VoteBundle(VoteBundleGossip::new(
                        cert.votes.clone(),
                    )),
                }];
            }
            debug!(round = %round, from = %from, "bundle for processed round dropped");
            return vec![];
        }

        if !verify_votes(&votes, &self.peers) {
            warn!(from = %from, round = %round, "vote bundle failed verification, dropped");
            return vec![];
        }

        let peers_in_round = self.peers.len();
        let mut decided = None;
        for vote in votes {
            if let Some(outcome) = self.store.store(vote, peers_in_round) {
                decided = Some(outcome);
                break;
            }
        }

        match decided {
            Some(outcome) => self.emit(outcome),
            None => vec![],
        }
    }

    /// The vote-retry timer fired.
    pub fn on_timer(&mut self) -> Vec<Action> {
        let Some(candidate) = &self.candidate else {
            return vec![];
        };
        let round = candidate.round;
        if self.store.is_processed(round) {
            return vec![];
        }

        self.retries += 1;
        if let Some(limit) = self.config.abandon_after_retries {
            if self.retries > limit {
                warn!(round = %round, retries = self.retries, "abandoning round, no quorum reachable");
                self.store.mark_processed(round);
                self.last_emitted = Some(self.last_emitted.map_or(round, |r| r.max(round)));
                return vec![Action::EnqueueInternal {
                    event: Event::ConsensusOutcome {
                        outcome: GateObject::AgreementOnNone { round },
                    },
                }];
            }
        }

        // Liveness failure is logged on every attempt, never fatal.
        warn!(round = %round, retries = self.retries, "consensus round stalled, re-broadcasting vote");
        vec![
            Action::Broadcast {
                message: OutboundMessage::VoteBundle(VoteBundleGossip::new(vec![candidate
                    .vote
                    .clone()])),
            },
            Action::SetTimer {
                id: TimerId::VoteRetry,
                duration: self.config.vote_retry_interval,
            },
        ]
    }

    /// The synchronizer finished committing; drop state for settled rounds.
    pub fn on_commit_completed(&mut self) -> Vec<Action> {
        if let Some(last) = self.last_emitted {
            self.store.prune_below(last);
            self.voted_rounds = self.voted_rounds.split_off(&last);
            if self.candidate.as_ref().is_some_and(|c| c.round <= last) {
                self.candidate = None;
            }
        }
        vec![]
    }

    /// Turn a decided outcome into a `GateObject` and emit it, at most once,
    /// in non-decreasing round order.
    fn emit(&mut self, outcome: Outcome) -> Vec<Action> {
        let round = outcome.round();
        self.store.mark_processed(round);

        if self.last_emitted.is_some_and(|last| round < last) {
            debug!(round = %round, "outcome below last emitted round suppressed");
            return vec![];
        }
        self.last_emitted = Some(round);

        let gate = match outcome {
            // Supermajority on the empty hash is an agreement that nothing is
            // worth committing this round.
            Outcome::Commit(cert) if cert.hash.is_empty() => GateObject::ProposalReject {
                round,
                votes: cert.votes,
            },
            Outcome::Commit(cert) => {
                let ours = self
                    .candidate
                    .as_ref()
                    .is_some_and(|c| c.round == round && c.vote.hash == cert.hash);
                if ours {
                    let block = self
                        .candidate
                        .as_ref()
                        .map(|c| c.block.clone())
                        .expect("candidate checked above");
                    GateObject::PairValid {
                        round,
                        hash: cert.hash,
                        block,
                        votes: cert.votes,
                    }
                } else {
                    GateObject::VoteOther {
                        round,
                        hash: cert.hash,
                        votes: cert.votes,
                    }
                }
            }
            Outcome::Reject(proof) => GateObject::BlockReject {
                round,
                votes: proof.votes,
            },
        };

        info!(round = %round, outcome = gate.kind(), "consensus outcome");

        let mut actions = Vec::new();
        if self.candidate.as_ref().is_some_and(|c| c.round == round) {
            actions.push(Action::CancelTimer {
                id: TimerId::VoteRetry,
            });
        }
        actions.push(Action::EnqueueInternal {
            event: Event::ConsensusOutcome { outcome: gate },
        });
        actions
    }
}
