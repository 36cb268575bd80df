//! Cryptographic verification of vote bundles.

use concordia_types::{yac_vote_message, PeerSet, VoteMessage};
use tracing::warn;

/// Verify every signature in a bundle against the voters' known public keys.
///
/// Bundles are all-or-nothing: one bad signature (or a voter outside the
/// peer set) rejects the whole bundle, and nothing from it is tallied.
pub fn verify_votes(votes: &[VoteMessage], peers: &PeerSet) -> bool {
    if votes.is_empty() {
        return false;
    }
    votes.iter().all(|vote| {
        let Some(key) = peers.public_key(vote.voter) else {
            warn!(voter = %vote.voter, "vote from unknown peer");
            return false;
        };
        let ok = key.verify(&yac_vote_message(&vote.hash), &vote.signature);
        if !ok {
            warn!(voter = %vote.voter, round = %vote.round(), "invalid vote signature");
        }
        ok
    })
}
