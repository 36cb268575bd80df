//! Block-loader server handlers.
//!
//! The transport calls these when a peer asks for blocks; they are pure
//! reads over the store. The most recent commit is served from the query's
//! in-memory cache before any column-family scan.

use concordia_messages::{GetBlockRequest, GetBlockResponse, GetBlocksRequest, GetBlocksResponse};
use concordia_storage::BlockQuery;

/// Serve a peer's catch-up request: our chain from the requested height to
/// the tip, ascending. An empty response means we have nothing there.
pub fn handle_get_blocks(query: &BlockQuery, request: &GetBlocksRequest) -> GetBlocksResponse {
    // The common case is a peer one block behind; the cached last commit
    // answers it without touching the database.
    if let Some(top) = query.top_block() {
        if top.height() == request.from_height {
            return GetBlocksResponse { blocks: vec![top] };
        }
    }
    GetBlocksResponse {
        blocks: query.blocks_from(request.from_height),
    }
}

/// Serve a single block by content hash.
pub fn handle_get_block(query: &BlockQuery, request: &GetBlockRequest) -> GetBlockResponse {
    GetBlockResponse {
        block: query.block_by_hash(&request.hash),
    }
}
