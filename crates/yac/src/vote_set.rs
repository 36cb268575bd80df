//! Per-hash vote collection.

use crate::{has_supermajority, CommitCertificate};
use concordia_types::{PeerId, VoteMessage, YacHash};
use std::collections::HashSet;

/// Collects the votes received for one `YacHash` within a round.
///
/// At most one vote per peer is counted; duplicate deliveries are ignored.
#[derive(Debug, Clone)]
pub struct VoteSet {
    hash: YacHash,
    votes: Vec<VoteMessage>,
    voters: HashSet<PeerId>,
}

impl VoteSet {
    pub fn new(hash: YacHash) -> Self {
        Self {
            hash,
            votes: Vec::new(),
            voters: HashSet::new(),
        }
    }

    /// The hash this set tallies.
    pub fn hash(&self) -> &YacHash {
        &self.hash
    }

    /// Add a vote. Returns true if the vote was counted, false if it was a
    /// duplicate or for a different hash.
    pub fn insert(&mut self, vote: VoteMessage) -> bool {
        if vote.hash != self.hash {
            return false;
        }
        if !self.voters.insert(vote.voter) {
            return false;
        }
        self.votes.push(vote);
        true
    }

    /// Number of distinct peers counted.
    pub fn len(&self) -> usize {
        self.votes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    pub fn votes(&self) -> &[VoteMessage] {
        &self.votes
    }

    /// True if `peer`'s vote is already counted here.
    pub fn has_voter(&self, peer: PeerId) -> bool {
        self.voters.contains(&peer)
    }

    /// If this hash reached supermajority of `peers_in_round`, the commit
    /// certificate carrying the full quorum.
    pub fn committed(&self, peers_in_round: usize) -> Option<CommitCertificate> {
        if has_supermajority(self.votes.len(), peers_in_round) {
            Some(CommitCertificate {
                hash: self.hash.clone(),
                votes: self.votes.clone(),
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concordia_types::test_utils::{test_peer_set, test_vote};
    use concordia_types::{Hash, Round};

    fn sample_hash() -> YacHash {
        YacHash::new(
            Round::new(1, 0),
            Hash::from_bytes(b"proposal"),
            Hash::from_bytes(b"block"),
        )
    }

    #[test]
    fn test_duplicate_vote_not_counted() {
        let (_, keys) = test_peer_set(4);
        let mut set = VoteSet::new(sample_hash());

        let vote = test_vote(sample_hash(), PeerId(0), &keys[0]);
        assert!(set.insert(vote.clone()));
        assert!(!set.insert(vote));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_wrong_hash_rejected() {
        let (_, keys) = test_peer_set(4);
        let mut set = VoteSet::new(sample_hash());

        let other = YacHash::new(
            Round::new(1, 0),
            Hash::from_bytes(b"proposal"),
            Hash::from_bytes(b"other-block"),
        );
        assert!(!set.insert(test_vote(other, PeerId(0), &keys[0])));
        assert!(set.is_empty());
    }

    #[test]
    fn test_commit_at_supermajority() {
        let (_, keys) = test_peer_set(4);
        let mut set = VoteSet::new(sample_hash());

        for i in 0..2u64 {
            set.insert(test_vote(sample_hash(), PeerId(i), &keys[i as usize]));
            assert!(set.committed(4).is_none());
        }
        set.insert(test_vote(sample_hash(), PeerId(2), &keys[2]));

        let cert = set.committed(4).expect("2f+1 votes must commit");
        assert_eq!(cert.votes.len(), 3);
        assert_eq!(cert.hash, sample_hash());
    }

    #[test]
    fn test_differing_proposal_hash_still_tallies() {
        // Honest voters looking at different proposals but the same block
        // must land in the same set.
        let (_, keys) = test_peer_set(4);
        let mut set = VoteSet::new(sample_hash());

        let variant = YacHash::new(
            Round::new(1, 0),
            Hash::from_bytes(b"another-proposal"),
            Hash::from_bytes(b"block"),
        );
        assert!(set.insert(test_vote(variant, PeerId(1), &keys[1])));
        assert_eq!(set.len(), 1);
    }
}
