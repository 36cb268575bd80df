//! Blocks.

use crate::{block_signature_message, BlockHeight, Hash, KeyPair, PeerId, Signature, Transaction};
use sbor::prelude::BasicSbor;

/// Consensus metadata for a block.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct BlockHeader {
    pub height: BlockHeight,
    /// Hash of the block below; `Hash::ZERO` for the genesis block.
    pub prev_hash: Hash,
    /// Hash of the proposal this block was built from.
    pub proposal_hash: Hash,
    /// Milliseconds since epoch, assigned by the proposer.
    pub created_at: u64,
}

/// A peer's signature over a block hash.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct BlockSignature {
    pub signer: PeerId,
    pub signature: Signature,
}

/// A block: header, payload, and the signatures collected for it.
///
/// Signatures accumulate as consensus completes; the block hash covers only
/// the header and transactions, so adding signatures never changes identity.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
    pub signatures: Vec<BlockSignature>,
}

impl Block {
    /// Content hash of the block (header + transactions, not signatures).
    pub fn hash(&self) -> Hash {
        let payload = (&self.header, &self.transactions);
        let bytes = sbor::basic_encode(&payload).expect("block encoding cannot fail");
        Hash::from_bytes(&bytes)
    }

    pub fn height(&self) -> BlockHeight {
        self.header.height
    }

    /// Append `signer`'s signature over this block's hash.
    pub fn sign_as(&mut self, signer: PeerId, key: &KeyPair) {
        let msg = block_signature_message(self.header.height.0, &self.hash());
        self.signatures.push(BlockSignature {
            signer,
            signature: key.sign(&msg),
        });
    }
}
