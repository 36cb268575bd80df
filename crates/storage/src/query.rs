//! Read-only block queries.

use concordia_types::{Block, BlockHeight, Hash};
use rocksdb::DB;
use std::sync::{Arc, RwLock};
use tracing::error;

/// Read view over committed blocks.
///
/// The most recently committed block is served from an in-memory cache
/// before any column-family read - block-loader requests overwhelmingly ask
/// for the tip.
pub struct BlockQuery {
    db: Arc<DB>,
    last_commit: Arc<RwLock<Option<Block>>>,
}

impl BlockQuery {
    pub(crate) fn new(db: Arc<DB>, last_commit: Arc<RwLock<Option<Block>>>) -> Self {
        Self { db, last_commit }
    }

    /// The block at `height`, if committed.
    pub fn block(&self, height: BlockHeight) -> Option<Block> {
        if let Some(cached) = self.cached_if(|b| b.height() == height) {
            return Some(cached);
        }

        let cf = self.db.cf_handle("blocks")?;
        match self.db.get_cf(cf, height.0.to_be_bytes()) {
            Ok(Some(value)) => match sbor::basic_decode::<Block>(&value) {
                Ok(block) => Some(block),
                Err(e) => {
                    error!(height = %height, error = ?e, "failed to decode stored block");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                error!(height = %height, error = %e, "failed to read block");
                None
            }
        }
    }

    /// The block with the given content hash, if committed.
    pub fn block_by_hash(&self, hash: &Hash) -> Option<Block> {
        if let Some(cached) = self.cached_if(|b| b.hash() == *hash) {
            return Some(cached);
        }

        let meta = self.db.cf_handle("meta")?;
        let key = [b"bh:", hash.as_bytes().as_slice()].concat();
        let value = self.db.get_cf(meta, key).ok().flatten()?;
        let bytes: [u8; 8] = value.as_slice().try_into().ok()?;
        self.block(BlockHeight(u64::from_be_bytes(bytes)))
    }

    /// The block containing the transaction `tx_hash`, through the index.
    pub fn block_by_tx_hash(&self, tx_hash: &Hash) -> Option<Block> {
        let index = crate::BlockIndexer::new(self.db.clone());
        let height = index.tx_height(tx_hash)?;
        self.block(height)
    }

    /// All blocks from `from` (inclusive) to the tip, ascending.
    pub fn blocks_from(&self, from: BlockHeight) -> Vec<Block> {
        let Some(cf) = self.db.cf_handle("blocks") else {
            return vec![];
        };
        self.db
            .iterator_cf(
                cf,
                rocksdb::IteratorMode::From(&from.0.to_be_bytes(), rocksdb::Direction::Forward),
            )
            .filter_map(|item| item.ok())
            .filter_map(|(_, value)| sbor::basic_decode::<Block>(&value).ok())
            .collect()
    }

    /// The most recently committed block, cache first.
    pub fn top_block(&self) -> Option<Block> {
        if let Some(cached) = self.cached_if(|_| true) {
            return Some(cached);
        }
        let cf = self.db.cf_handle("blocks")?;
        let (_, value) = self
            .db
            .iterator_cf(cf, rocksdb::IteratorMode::End)
            .next()?
            .ok()?;
        sbor::basic_decode(&value).ok()
    }

    fn cached_if(&self, pred: impl FnOnce(&Block) -> bool) -> Option<Block> {
        let guard = self.last_commit.read().ok()?;
        guard.as_ref().filter(|b| pred(b)).cloned()
    }
}
