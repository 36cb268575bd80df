//! Chain validation rules.

use concordia_types::{block_signature_message, Block, BlockHeight, Hash, PeerId, PeerSet};
use std::collections::HashSet;
use tracing::warn;

/// Why a block or chain was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("empty chain")]
    EmptyChain,

    #[error("height gap: expected {expected}, got {got}")]
    HeightGap { expected: u64, got: u64 },

    #[error("previous-hash mismatch at height {height}")]
    PrevHashMismatch { height: u64 },

    #[error("block at height {height} has {valid} valid signatures, needs {required}")]
    InsufficientSignatures {
        height: u64,
        valid: usize,
        required: usize,
    },

    #[error("chain does not reach the agreed hash")]
    TargetNotReached,
}

/// Stateful chain rules: hash linkage plus peer-signature supermajority.
#[derive(Debug, Clone)]
pub struct ChainValidator {
    peers: PeerSet,
}

impl ChainValidator {
    pub fn new(peers: PeerSet) -> Self {
        Self { peers }
    }

    /// The signature count a block needs: strictly more than 2/3 of peers.
    fn required_signatures(&self) -> usize {
        self.peers.len() * 2 / 3 + 1
    }

    /// Validate one block on top of `(top_height, top_hash)`.
    pub fn validate_block(
        &self,
        block: &Block,
        top_height: BlockHeight,
        top_hash: &Hash,
    ) -> Result<(), ValidationError> {
        let height = block.height().0;
        if height != top_height.0 + 1 {
            return Err(ValidationError::HeightGap {
                expected: top_height.0 + 1,
                got: height,
            });
        }
        if block.header.prev_hash != *top_hash {
            return Err(ValidationError::PrevHashMismatch { height });
        }

        let block_hash = block.hash();
        let message = block_signature_message(height, &block_hash);
        let mut valid: HashSet<PeerId> = HashSet::new();
        for sig in &block.signatures {
            let Some(key) = self.peers.public_key(sig.signer) else {
                warn!(signer = %sig.signer, height, "block signature from unknown peer");
                continue;
            };
            if key.verify(&message, &sig.signature) {
                valid.insert(sig.signer);
            } else {
                warn!(signer = %sig.signer, height, "invalid block signature");
            }
        }

        let required = self.required_signatures();
        if valid.len() < required {
            return Err(ValidationError::InsufficientSignatures {
                height,
                valid: valid.len(),
                required,
            });
        }
        Ok(())
    }

    /// Validate a downloaded chain: contiguous from the local tip, every
    /// block carrying a signature supermajority, ending at the agreed hash.
    pub fn validate_chain(
        &self,
        blocks: &[Block],
        top_height: BlockHeight,
        top_hash: Hash,
        target: &Hash,
    ) -> Result<(), ValidationError> {
        if blocks.is_empty() {
            return Err(ValidationError::EmptyChain);
        }

        let mut height = top_height;
        let mut hash = top_hash;
        for block in blocks {
            self.validate_block(block, height, &hash)?;
            height = block.height();
            hash = block.hash();
        }

        if hash != *target {
            return Err(ValidationError::TargetNotReached);
        }
        Ok(())
    }
}
