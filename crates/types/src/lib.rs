//! Core types for Concordia consensus.
//!
//! This crate provides the foundational types used throughout the consensus
//! implementation:
//!
//! - **Primitives**: Hash, cryptographic keys and signatures
//! - **Identifiers**: PeerId, BlockHeight
//! - **Consensus types**: Round, YacHash, VoteMessage, Block
//! - **Ledger types**: Transaction, Command, LedgerState
//! - **Network traits**: Message markers for serialization
//!
//! # Design Philosophy
//!
//! This crate is self-contained with minimal dependencies. It does not depend
//! on any other workspace crates, making it the foundation layer.

mod block;
mod crypto;
mod hash;
mod identifiers;
mod ledger;
mod network;
mod round;
mod signing;
mod transaction;
mod vote;

pub use block::{Block, BlockHeader, BlockSignature};
pub use crypto::{KeyPair, PublicKey, Signature};
pub use hash::{Hash, HexError};
pub use identifiers::{BlockHeight, PeerId};
pub use ledger::{LedgerState, PeerInfo, PeerSet};
pub use network::NetworkMessage;
pub use round::Round;
pub use signing::{block_signature_message, yac_vote_message, DOMAIN_BLOCK_SIG, DOMAIN_YAC_VOTE};
pub use transaction::{Command, Transaction};
pub use vote::{VoteMessage, YacHash};

/// Test utilities.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils {
    use super::*;

    /// Create a deterministic keypair from a seed byte.
    pub fn test_keypair(seed: u8) -> KeyPair {
        KeyPair::from_seed(&[seed; 32])
    }

    /// Create a peer set of `n` peers with deterministic keys.
    ///
    /// Returns the peer set together with the matching keypairs, indexed by
    /// `PeerId`.
    pub fn test_peer_set(n: u64) -> (PeerSet, Vec<KeyPair>) {
        let keys: Vec<KeyPair> = (0..n).map(|i| test_keypair(i as u8 + 1)).collect();
        let peers = PeerSet::new(
            keys.iter()
                .enumerate()
                .map(|(i, k)| PeerInfo {
                    peer_id: PeerId(i as u64),
                    public_key: k.public_key(),
                    address: format!("peer-{i}.test:50541"),
                })
                .collect(),
        );
        (peers, keys)
    }

    /// Create a signed vote from `peer` for the given hash.
    pub fn test_vote(hash: YacHash, peer: PeerId, key: &KeyPair) -> VoteMessage {
        VoteMessage::sign(hash, peer, key)
    }

    /// Create a minimal transaction with a single transfer command.
    pub fn test_transfer(creator: &str, src: &str, dest: &str, amount: u64) -> Transaction {
        Transaction::new(
            creator.to_string(),
            vec![Command::TransferAsset {
                src_account_id: src.to_string(),
                dest_account_id: dest.to_string(),
                asset_id: "coin#test".to_string(),
                amount,
            }],
            0,
        )
    }
}
