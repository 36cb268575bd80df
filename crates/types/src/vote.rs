//! Vote value objects for YAC consensus.

use crate::{yac_vote_message, Hash, KeyPair, PeerId, Round, Signature};
use sbor::prelude::BasicSbor;

/// "The block I propose to commit at this round."
///
/// Equality (and hashing) is keyed on `(vote_round, block_hash)` only: honest
/// voters may have inspected different proposals and still agree on the same
/// block, so `proposal_hash` must not split the tally. `block_signature` is
/// the proposer's signature over the block, carried so a committed hash can
/// be attributed; it never participates in equality either.
#[derive(Debug, Clone, BasicSbor)]
pub struct YacHash {
    pub vote_round: Round,
    pub proposal_hash: Hash,
    pub block_hash: Hash,
    pub block_signature: Option<Signature>,
}

impl YacHash {
    pub fn new(vote_round: Round, proposal_hash: Hash, block_hash: Hash) -> Self {
        Self {
            vote_round,
            proposal_hash,
            block_hash,
            block_signature: None,
        }
    }

    pub fn with_block_signature(mut self, signature: Signature) -> Self {
        self.block_signature = Some(signature);
        self
    }

    /// An "agree on nothing" hash: no proposal, no block. Voted when a round
    /// must be rejected outright.
    pub fn empty(vote_round: Round) -> Self {
        Self::new(vote_round, Hash::ZERO, Hash::ZERO)
    }

    /// True if this hash proposes no block at all.
    pub fn is_empty(&self) -> bool {
        self.proposal_hash.is_zero() && self.block_hash.is_zero()
    }
}

impl PartialEq for YacHash {
    fn eq(&self, other: &Self) -> bool {
        self.vote_round == other.vote_round && self.block_hash == other.block_hash
    }
}

impl Eq for YacHash {}

impl std::hash::Hash for YacHash {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.vote_round.hash(state);
        self.block_hash.hash(state);
    }
}

/// One peer's signed opinion for a round. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct VoteMessage {
    pub hash: YacHash,
    pub voter: PeerId,
    pub signature: Signature,
}

impl VoteMessage {
    /// Sign `hash` as `voter`.
    pub fn sign(hash: YacHash, voter: PeerId, key: &KeyPair) -> Self {
        let signature = key.sign(&yac_vote_message(&hash));
        Self {
            hash,
            voter,
            signature,
        }
    }

    /// The round this vote belongs to.
    pub fn round(&self) -> Round {
        self.hash.vote_round
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_proposal_hash() {
        let round = Round::new(3, 0);
        let block = Hash::from_bytes(b"block");
        let a = YacHash::new(round, Hash::from_bytes(b"proposal-a"), block);
        let b = YacHash::new(round, Hash::from_bytes(b"proposal-b"), block);
        assert_eq!(a, b);

        use std::collections::HashMap;
        let mut map: HashMap<YacHash, u32> = HashMap::new();
        map.insert(a, 1);
        *map.entry(b).or_insert(0) += 1;
        assert_eq!(map.len(), 1, "equal hashes must collapse to one tally key");
    }

    #[test]
    fn test_equality_respects_round_and_block() {
        let proposal = Hash::from_bytes(b"proposal");
        let block = Hash::from_bytes(b"block");
        let a = YacHash::new(Round::new(3, 0), proposal, block);
        let b = YacHash::new(Round::new(3, 1), proposal, block);
        let c = YacHash::new(Round::new(3, 0), proposal, Hash::from_bytes(b"other"));
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_empty_hash() {
        let h = YacHash::empty(Round::new(1, 0));
        assert!(h.is_empty());
        assert!(!YacHash::new(Round::new(1, 0), Hash::ZERO, Hash::from_bytes(b"b")).is_empty());
    }

    #[test]
    fn test_vote_signature_covers_payload() {
        let key = KeyPair::from_seed(&[5; 32]);
        let hash = YacHash::new(
            Round::new(2, 0),
            Hash::from_bytes(b"p"),
            Hash::from_bytes(b"b"),
        );
        let vote = VoteMessage::sign(hash.clone(), PeerId(0), &key);
        assert!(key
            .public_key()
            .verify(&yac_vote_message(&hash), &vote.signature));
    }
}
