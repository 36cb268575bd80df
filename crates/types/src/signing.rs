//! Domain-separated signing payloads.
//!
//! Every signature in the system covers a domain tag followed by the
//! canonical field encoding, so a signature produced for one purpose can
//! never be replayed for another.

use crate::{Hash, YacHash};

/// Domain tag for YAC vote signatures.
pub const DOMAIN_YAC_VOTE: &[u8] = b"concordia.yac.vote";

/// Domain tag for block signatures.
pub const DOMAIN_BLOCK_SIG: &[u8] = b"concordia.block";

/// The byte payload a vote signature covers:
/// `domain || block_round || reject_round || proposal_hash || block_hash`.
pub fn yac_vote_message(hash: &YacHash) -> Vec<u8> {
    let mut msg = Vec::with_capacity(DOMAIN_YAC_VOTE.len() + 16 + 64);
    msg.extend_from_slice(DOMAIN_YAC_VOTE);
    msg.extend_from_slice(&hash.vote_round.block_round.to_be_bytes());
    msg.extend_from_slice(&hash.vote_round.reject_round.to_be_bytes());
    msg.extend_from_slice(hash.proposal_hash.as_bytes());
    msg.extend_from_slice(hash.block_hash.as_bytes());
    msg
}

/// The byte payload a block signature covers:
/// `domain || height || block_hash`.
pub fn block_signature_message(height: u64, block_hash: &Hash) -> Vec<u8> {
    let mut msg = Vec::with_capacity(DOMAIN_BLOCK_SIG.len() + 8 + 32);
    msg.extend_from_slice(DOMAIN_BLOCK_SIG);
    msg.extend_from_slice(&height.to_be_bytes());
    msg.extend_from_slice(block_hash.as_bytes());
    msg
}
