//! Peer membership and post-commit ledger snapshots.

use crate::{BlockHeight, Hash, PeerId, PublicKey};
use sbor::prelude::BasicSbor;

/// One peer in the fixed network membership.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct PeerInfo {
    pub peer_id: PeerId,
    pub public_key: PublicKey,
    /// Transport address, opaque to this crate.
    pub address: String,
}

/// The known, ordered set of peers participating in consensus.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PeerSet {
    peers: Vec<PeerInfo>,
}

impl PeerSet {
    pub fn new(peers: Vec<PeerInfo>) -> Self {
        Self { peers }
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn contains(&self, peer: PeerId) -> bool {
        self.peers.iter().any(|p| p.peer_id == peer)
    }

    /// Resolve a peer to its public key.
    pub fn public_key(&self, peer: PeerId) -> Option<PublicKey> {
        self.peers
            .iter()
            .find(|p| p.peer_id == peer)
            .map(|p| p.public_key)
    }

    pub fn get(&self, peer: PeerId) -> Option<&PeerInfo> {
        self.peers.iter().find(|p| p.peer_id == peer)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeerInfo> {
        self.peers.iter()
    }

    /// All peer ids, in membership order.
    pub fn ids(&self) -> Vec<PeerId> {
        self.peers.iter().map(|p| p.peer_id).collect()
    }
}

/// Immutable snapshot of the ledger tip, published after every successful
/// commit. Downstream consumers (the ordering round, status APIs) read this
/// instead of poking at storage.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct LedgerState {
    pub top_block_height: BlockHeight,
    pub top_block_hash: Hash,
    pub peers: Vec<PeerInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_peer_set;

    #[test]
    fn test_peer_set_lookup() {
        let (peers, keys) = test_peer_set(4);
        assert_eq!(peers.len(), 4);
        assert!(peers.contains(PeerId(2)));
        assert!(!peers.contains(PeerId(9)));
        assert_eq!(peers.public_key(PeerId(1)), Some(keys[1].public_key()));
        assert_eq!(peers.public_key(PeerId(9)), None);
    }

    #[test]
    fn test_ids_preserve_order() {
        let (peers, _) = test_peer_set(3);
        assert_eq!(peers.ids(), vec![PeerId(0), PeerId(1), PeerId(2)]);
    }
}
