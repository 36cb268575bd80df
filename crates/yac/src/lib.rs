//! YAC consensus state machine.
//!
//! This crate provides a synchronous implementation of YAC (Yet Another
//! Consensus), the BFT voting protocol that agrees on one block per round
//! among a fixed peer set.
//!
//! # Architecture
//!
//! The state machine processes events synchronously:
//!
//! - `CandidateBlockReady` → sign and broadcast our vote for the block's hash
//! - `VoteBundleReceived` → verify, fold into the tally, emit outcome on quorum
//! - `TimerFired(VoteRetry)` → re-broadcast our vote while the round is open
//!
//! All I/O is performed by the runner via returned `Action`s.
//!
//! # Terminology
//!
//! - **Round**: One consensus attempt, identified by
//!   `(block_round, reject_round)`. `block_round` advances on commit,
//!   `reject_round` on failed agreement at the same chain position.
//!
//! - **YacHash**: The opinion being voted on. Two votes tally together when
//!   they share `(round, block_hash)`; the proposal hash may differ between
//!   honest voters.
//!
//! - **Supermajority**: Strictly more than 2/3 of the peer set. With
//!   `n = 3f + 1` peers this tolerates `f` Byzantine peers.
//!
//! # Safety
//!
//! - **At most one outcome per round**: once a round is answered, further
//!   votes for it never re-emit or change the outcome. Late voters are
//!   answered directly with the stored commit certificate.
//!
//! - **Idempotent ingestion**: a duplicate `(voter, hash)` delivery never
//!   double-counts.
//!
//! - **No equivocation**: our own vote for a round is persisted before it is
//!   broadcast, and a recovered process refuses to vote differently at a
//!   round it already voted in.
//!
//! # Liveness
//!
//! - **Reject detection**: when the votes on hand prove that no hash can
//!   reach supermajority (most frequent tally + peers yet to vote still short
//!   of quorum), the round is rejected and consensus retries at
//!   `reject_round + 1`.
//!
//! - **Vote retry**: while a round is open, our vote is re-broadcast on a
//!   timer; a round with no progress is logged each time, and the process
//!   never aborts on a stalled round.

mod config;
mod outcome;
mod round_storage;
mod state;
mod store;
mod supermajority;
mod verify;
mod vote_set;

pub use config::YacConfig;
pub use outcome::{CommitCertificate, Outcome, RejectProof};
pub use round_storage::RoundStorage;
pub use state::{RecoveredVotes, YacState};
pub use store::VoteStore;
pub use supermajority::{has_supermajority, reject_proved};
pub use verify::verify_votes;
pub use vote_set::VoteSet;
