//! Scoped, single-use transactional storage handle.

use crate::wsv::{execute_command, Wsv};
use concordia_types::{Block, BlockHeight, Hash};
use rocksdb::DB;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// A transactional view onto the ledger, created by
/// [`crate::LedgerStore::create_mutable_storage`].
///
/// Owns its staged state for its whole lifetime. Blocks are `apply`-ed one
/// after another (each seeing the previous one's writes), then the handle is
/// consumed by `LedgerStore::commit` - or simply dropped, which discards
/// everything.
///
/// Two-phase state: `uncommitted → prepared (optional) → committed`.
pub struct MutableStorage {
    pub(crate) db: Arc<DB>,
    /// Chain tip as seen by this storage; advances with each applied block.
    pub(crate) top_height: BlockHeight,
    pub(crate) top_hash: Hash,
    /// Staged WSV writes, applied on commit.
    pub(crate) overlay: BTreeMap<Vec<u8>, Vec<u8>>,
    /// Blocks applied through this storage, in height order.
    pub(crate) blocks: Vec<Block>,
    /// True once `prepare_block` durably staged the pending writes.
    pub(crate) prepared: bool,
}

impl MutableStorage {
    pub(crate) fn new(db: Arc<DB>, top_height: BlockHeight, top_hash: Hash) -> Self {
        Self {
            db,
            top_height,
            top_hash,
            overlay: BTreeMap::new(),
            blocks: Vec::new(),
            prepared: false,
        }
    }

    /// The chain tip this storage currently sees (staged blocks included).
    pub fn top_height(&self) -> BlockHeight {
        self.top_height
    }

    pub fn top_hash(&self) -> Hash {
        self.top_hash
    }

    /// Number of blocks staged so far.
    pub fn staged_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Tentatively apply a block.
    ///
    /// `validator` re-checks the block against the storage's current tip
    /// (chain rules, signatures); it runs before any command executes. Every
    /// command of every transaction must succeed, or the block leaves no
    /// trace and `false` is returned.
    pub fn apply<F>(&mut self, block: Block, validator: F) -> bool
    where
        F: FnOnce(&Block, &Wsv<'_>, &Hash) -> bool,
    {
        let Some(cf) = self.db.cf_handle("wsv") else {
            warn!("wsv column family missing");
            return false;
        };

        {
            let wsv = Wsv::new(&self.db, cf, &self.overlay);
            if !validator(&block, &wsv, &self.top_hash) {
                debug!(height = %block.height(), "block failed validation, not applied");
                return false;
            }
        }

        // Execute against a scratch copy so a failing command discards
        // everything this block wrote.
        let mut scratch = self.overlay.clone();
        let wsv = Wsv::new(&self.db, cf, &self.overlay);
        for tx in &block.transactions {
            for command in &tx.commands {
                if let Err(e) = execute_command(&wsv, &mut scratch, command) {
                    warn!(
                        height = %block.height(),
                        tx = %tx.hash(),
                        command = command.kind(),
                        error = %e,
                        "command failed, block not applied"
                    );
                    return false;
                }
            }
        }

        self.top_height = block.height();
        self.top_hash = block.hash();
        self.overlay = scratch;
        self.blocks.push(block);
        true
    }
}

impl std::fmt::Debug for MutableStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutableStorage")
            .field("top_height", &self.top_height)
            .field("top_hash", &self.top_hash)
            .field("staged_blocks", &self.blocks.len())
            .field("staged_writes", &self.overlay.len())
            .field("prepared", &self.prepared)
            .finish()
    }
}
