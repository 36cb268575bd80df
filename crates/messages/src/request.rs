//! Block-loader requests.

use concordia_types::{BlockHeight, Hash, NetworkMessage};
use sbor::prelude::BasicSbor;

/// Ask a peer for its chain from `from_height` (inclusive) up to its tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BasicSbor)]
pub struct GetBlocksRequest {
    pub from_height: BlockHeight,
}

impl NetworkMessage for GetBlocksRequest {
    fn message_type_id() -> &'static str {
        "loader.get_blocks"
    }
}

/// Ask a peer for a single block by content hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BasicSbor)]
pub struct GetBlockRequest {
    pub hash: Hash,
}

impl NetworkMessage for GetBlockRequest {
    fn message_type_id() -> &'static str {
        "loader.get_block"
    }
}
