//! Auxiliary block indices.
//!
//! Built strictly after a block is durably stored. Keys are fully
//! deterministic functions of the block contents, so re-indexing the same
//! block (recovery, replay) writes the same rows and is idempotent.

use crate::StorageError;
use concordia_types::{Block, BlockHeight, Command, Hash};
use rocksdb::{WriteBatch, DB};
use std::sync::Arc;

// Key spaces inside the `index` column family.
const TX_HEIGHT: &[u8] = b"hh:"; // tx hash → height
const ACCOUNT_HEIGHT: &[u8] = b"ha:"; // account, height → ()
const CREATOR_HEIGHT: &[u8] = b"ch:"; // creator, height, tx index → ()
const ACCOUNT_ASSET: &[u8] = b"aa:"; // account, asset, height → tx index

/// Builds and reads the lookup indices for committed blocks.
pub struct BlockIndexer {
    db: Arc<DB>,
}

impl BlockIndexer {
    pub(crate) fn new(db: Arc<DB>) -> Self {
        Self { db }
    }

    fn cf(&self) -> Result<&rocksdb::ColumnFamily, StorageError> {
        self.db
            .cf_handle("index")
            .ok_or_else(|| StorageError::Database("index column family not found".into()))
    }

    /// Index every transaction of `block`:
    ///
    /// - `tx_hash → height`
    /// - `(creator_account, height)` membership
    /// - `(creator_account, height, tx_index)` position
    /// - for every transfer, `(account, asset, height) → tx_index` for
    ///   creator, source, and destination
    pub fn index(&self, block: &Block) -> Result<(), StorageError> {
        let cf = self.cf()?;
        let height = block.height();
        let mut batch = WriteBatch::default();

        for (tx_index, tx) in block.transactions.iter().enumerate() {
            let tx_index = tx_index as u64;
            let creator = &tx.creator_account_id;

            batch.put_cf(
                cf,
                tx_height_key(&tx.hash()),
                height.0.to_be_bytes(),
            );
            batch.put_cf(cf, account_height_key(creator, height), b"");
            batch.put_cf(cf, creator_height_key(creator, height, tx_index), b"");

            for command in &tx.commands {
                if let Command::TransferAsset {
                    src_account_id,
                    dest_account_id,
                    asset_id,
                    ..
                } = command
                {
                    for account in [src_account_id, dest_account_id] {
                        batch.put_cf(cf, account_height_key(account, height), b"");
                    }
                    for account in [creator, src_account_id, dest_account_id] {
                        batch.put_cf(
                            cf,
                            account_asset_key(account, asset_id, height),
                            tx_index.to_be_bytes(),
                        );
                    }
                }
            }
        }

        self.db
            .write(batch)
            .map_err(|e| StorageError::Database(e.to_string()))
    }

    /// Height of the block containing `tx_hash`, if indexed.
    pub fn tx_height(&self, tx_hash: &Hash) -> Option<BlockHeight> {
        let cf = self.cf().ok()?;
        let value = self.db.get_cf(cf, tx_height_key(tx_hash)).ok().flatten()?;
        let bytes: [u8; 8] = value.as_slice().try_into().ok()?;
        Some(BlockHeight(u64::from_be_bytes(bytes)))
    }

    /// Heights of blocks touching `account`, ascending.
    pub fn account_heights(&self, account: &str) -> Vec<BlockHeight> {
        let prefix = [ACCOUNT_HEIGHT, account.as_bytes(), b"\x00"].concat();
        self.scan_prefix(&prefix)
            .into_iter()
            .filter_map(|(key, _)| {
                let rest = &key[prefix.len()..];
                let bytes: [u8; 8] = rest.try_into().ok()?;
                Some(BlockHeight(u64::from_be_bytes(bytes)))
            })
            .collect()
    }

    /// Transaction positions for `creator` at `height`, ascending.
    pub fn creator_positions(&self, creator: &str, height: BlockHeight) -> Vec<u64> {
        let prefix = [
            CREATOR_HEIGHT,
            creator.as_bytes(),
            b"\x00",
            &height.0.to_be_bytes()[..],
        ]
        .concat();
        self.scan_prefix(&prefix)
            .into_iter()
            .filter_map(|(key, _)| {
                let rest = &key[prefix.len()..];
                let bytes: [u8; 8] = rest.try_into().ok()?;
                Some(u64::from_be_bytes(bytes))
            })
            .collect()
    }

    /// `(height, tx_index)` pairs where `account` moved `asset`, ascending.
    pub fn account_asset_positions(&self, account: &str, asset: &str) -> Vec<(BlockHeight, u64)> {
        let prefix = [
            ACCOUNT_ASSET,
            account.as_bytes(),
            b"\x00",
            asset.as_bytes(),
            b"\x00",
        ]
        .concat();
        self.scan_prefix(&prefix)
            .into_iter()
            .filter_map(|(key, value)| {
                let rest = &key[prefix.len()..];
                let height: [u8; 8] = rest.try_into().ok()?;
                let index: [u8; 8] = value.as_slice().try_into().ok()?;
                Some((
                    BlockHeight(u64::from_be_bytes(height)),
                    u64::from_be_bytes(index),
                ))
            })
            .collect()
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        let Ok(cf) = self.cf() else {
            return vec![];
        };
        self.db
            .iterator_cf(
                cf,
                rocksdb::IteratorMode::From(prefix, rocksdb::Direction::Forward),
            )
            .take_while(|item| {
                item.as_ref()
                    .map(|(k, _)| k.starts_with(prefix))
                    .unwrap_or(false)
            })
            .filter_map(|item| item.ok().map(|(k, v)| (k.to_vec(), v.to_vec())))
            .collect()
    }
}

fn tx_height_key(tx_hash: &Hash) -> Vec<u8> {
    [TX_HEIGHT, tx_hash.as_bytes().as_slice()].concat()
}

fn account_height_key(account: &str, height: BlockHeight) -> Vec<u8> {
    [
        ACCOUNT_HEIGHT,
        account.as_bytes(),
        b"\x00",
        &height.0.to_be_bytes()[..],
    ]
    .concat()
}

fn creator_height_key(creator: &str, height: BlockHeight, tx_index: u64) -> Vec<u8> {
    [
        CREATOR_HEIGHT,
        creator.as_bytes(),
        b"\x00",
        &height.0.to_be_bytes()[..],
        &tx_index.to_be_bytes()[..],
    ]
    .concat()
}

fn account_asset_key(account: &str, asset: &str, height: BlockHeight) -> Vec<u8> {
    [
        ACCOUNT_ASSET,
        account.as_bytes(),
        b"\x00",
        asset.as_bytes(),
        b"\x00",
        &height.0.to_be_bytes()[..],
    ]
    .concat()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LedgerStore;
    use concordia_types::test_utils::test_transfer;
    use concordia_types::{BlockHeader, Transaction};
    use tempfile::TempDir;

    fn transfer_block(height: u64) -> Block {
        Block {
            header: BlockHeader {
                height: BlockHeight(height),
                prev_hash: Hash::from_bytes(&(height - 1).to_be_bytes()),
                proposal_hash: Hash::ZERO,
                created_at: height * 1000,
            },
            transactions: vec![
                Transaction::new("admin@test".into(), vec![], height),
                test_transfer("alice@test", "alice@test", "bob@test", 10),
            ],
            signatures: vec![],
        }
    }

    #[test]
    fn test_index_and_lookup() {
        let temp_dir = TempDir::new().unwrap();
        let store = LedgerStore::open(temp_dir.path()).unwrap();
        let indexer = store.indexer();

        let block = transfer_block(4);
        indexer.index(&block).unwrap();

        // tx hash → height, for both transactions
        for tx in &block.transactions {
            assert_eq!(indexer.tx_height(&tx.hash()), Some(BlockHeight(4)));
        }

        // creator and transfer parties appear under the height
        assert_eq!(indexer.account_heights("admin@test"), vec![BlockHeight(4)]);
        assert_eq!(indexer.account_heights("alice@test"), vec![BlockHeight(4)]);
        assert_eq!(indexer.account_heights("bob@test"), vec![BlockHeight(4)]);

        // creator positions at the height
        assert_eq!(
            indexer.creator_positions("admin@test", BlockHeight(4)),
            vec![0]
        );
        assert_eq!(
            indexer.creator_positions("alice@test", BlockHeight(4)),
            vec![1]
        );

        // transfer index: the transfer is tx 1
        assert_eq!(
            indexer.account_asset_positions("bob@test", "coin#test"),
            vec![(BlockHeight(4), 1)]
        );
    }

    #[test]
    fn test_reindexing_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let store = LedgerStore::open(temp_dir.path()).unwrap();
        let indexer = store.indexer();

        let block = transfer_block(7);
        indexer.index(&block).unwrap();
        indexer.index(&block).unwrap();

        assert_eq!(indexer.account_heights("alice@test"), vec![BlockHeight(7)]);
        assert_eq!(
            indexer.account_asset_positions("alice@test", "coin#test"),
            vec![(BlockHeight(7), 1)]
        );
        assert_eq!(
            indexer.creator_positions("alice@test", BlockHeight(7)),
            vec![1]
        );
    }

    #[test]
    fn test_unknown_lookups_are_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = LedgerStore::open(temp_dir.path()).unwrap();
        let indexer = store.indexer();

        assert_eq!(indexer.tx_height(&Hash::from_bytes(b"nope")), None);
        assert!(indexer.account_heights("ghost@test").is_empty());
        assert!(indexer
            .account_asset_positions("ghost@test", "coin#test")
            .is_empty());
    }

    #[test]
    fn test_blocks_at_multiple_heights() {
        let temp_dir = TempDir::new().unwrap();
        let store = LedgerStore::open(temp_dir.path()).unwrap();
        let indexer = store.indexer();

        indexer.index(&transfer_block(2)).unwrap();
        indexer.index(&transfer_block(5)).unwrap();

        assert_eq!(
            indexer.account_heights("alice@test"),
            vec![BlockHeight(2), BlockHeight(5)]
        );
        assert_eq!(
            indexer.account_asset_positions("alice@test", "coin#test"),
            vec![(BlockHeight(2), 1), (BlockHeight(5), 1)]
        );
    }
}
