//! Block-loader responses.

use concordia_types::{Block, NetworkMessage};
use sbor::prelude::BasicSbor;

/// Blocks in ascending height order, starting at the requested height.
/// Empty if the serving peer has nothing at or above it.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct GetBlocksResponse {
    pub blocks: Vec<Block>,
}

impl NetworkMessage for GetBlocksResponse {
    fn message_type_id() -> &'static str {
        "loader.blocks"
    }
}

/// A single block, if the serving peer knows the requested hash.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct GetBlockResponse {
    pub block: Option<Block>,
}

impl NetworkMessage for GetBlockResponse {
    fn message_type_id() -> &'static str {
        "loader.block"
    }
}
