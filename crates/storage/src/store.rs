//! RocksDB-backed ledger store.

use crate::wsv::Wsv;
use crate::{BlockIndexer, BlockQuery, CommitError, MutableStorage, OrderingState, StorageError};
use concordia_types::{Block, BlockHeight, Hash, LedgerState, Round};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, Options, WriteBatch, DB};
use sbor::prelude::BasicSbor;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

const KEY_TOP_HEIGHT: &[u8] = b"chain:top_height";
const KEY_TOP_HASH: &[u8] = b"chain:top_hash";
const KEY_STAGED: &[u8] = b"staged";
const BLOCK_HASH_PREFIX: &[u8] = b"bh:";
const OWN_VOTE_PREFIX: &[u8] = b"vote:";

/// Pending writes staged by `prepare_block`: durably logged, not visible.
#[derive(Debug, Clone, BasicSbor)]
struct PreparedCommit {
    blocks: Vec<Block>,
    writes: Vec<(Vec<u8>, Vec<u8>)>,
}

/// Compression type for RocksDB.
#[derive(Debug, Clone, Copy, Default)]
pub enum CompressionType {
    None,
    Snappy,
    #[default]
    Lz4,
    Zstd,
}

impl CompressionType {
    fn to_rocksdb(self) -> rocksdb::DBCompressionType {
        match self {
            CompressionType::None => rocksdb::DBCompressionType::None,
            CompressionType::Snappy => rocksdb::DBCompressionType::Snappy,
            CompressionType::Lz4 => rocksdb::DBCompressionType::Lz4,
            CompressionType::Zstd => rocksdb::DBCompressionType::Zstd,
        }
    }
}

/// Configuration for the ledger store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Maximum number of background jobs
    pub max_background_jobs: i32,
    /// Write buffer size in bytes
    pub write_buffer_size: usize,
    /// Block cache size in bytes (None to disable)
    pub block_cache_size: Option<usize>,
    /// Compression type
    pub compression: CompressionType,
    /// Column families to create
    pub column_families: Vec<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_background_jobs: 4,
            write_buffer_size: 64 * 1024 * 1024, // 64MB
            block_cache_size: Some(256 * 1024 * 1024), // 256MB
            compression: CompressionType::Lz4,
            column_families: vec![
                "default".to_string(),
                "blocks".to_string(),   // append-only block store
                "wsv".to_string(),      // world state view projections
                "index".to_string(),    // auxiliary lookup indices
                "meta".to_string(),     // chain tip + own votes (safety critical)
                "prepared".to_string(), // staged two-phase commits
                "ordering".to_string(), // ordering service resume state
            ],
        }
    }
}

/// RocksDB-based ledger storage.
///
/// One instance per process; sessions ([`MutableStorage`], [`BlockQuery`],
/// [`OrderingState`]) share the underlying database. A store-wide latch
/// separates normal operation (shared) from destructive reset (exclusive):
/// no commit can race a `drop_ledger`.
pub struct LedgerStore {
    db: Arc<DB>,
    reset_latch: RwLock<()>,
    /// Most recently committed block, served to block-loader requests before
    /// any column-family scan.
    last_commit: Arc<RwLock<Option<Block>>>,
}

impl LedgerStore {
    /// Open or create the database at `path` with default configuration.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        Self::open_with_config(path, StoreConfig::default())
    }

    /// Open with custom configuration.
    ///
    /// Startup is also crash recovery: a stale prepared commit left by a
    /// crashed prior commit attempt is rolled back before the store is
    /// handed out.
    pub fn open_with_config<P: AsRef<Path>>(
        path: P,
        config: StoreConfig,
    ) -> Result<Self, StorageError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_max_background_jobs(config.max_background_jobs);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_compression_type(config.compression.to_rocksdb());

        let mut block_opts = rocksdb::BlockBasedOptions::default();
        if let Some(cache_size) = config.block_cache_size {
            let cache = rocksdb::Cache::new_lru_cache(cache_size);
            block_opts.set_block_cache(&cache);
        }
        opts.set_block_based_table_factory(&block_opts);

        let cf_descriptors: Vec<_> = config
            .column_families
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DB::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let store = Self {
            db: Arc::new(db),
            reset_latch: RwLock::new(()),
            last_commit: Arc::new(RwLock::new(None)),
        };
        store.rollback_stale_prepared()?;
        Ok(store)
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily, StorageError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::Database(format!("column family {name} not found")))
    }

    /// The committed chain tip: `(height 0, Hash::ZERO)` for an empty chain.
    pub fn top(&self) -> (BlockHeight, Hash) {
        let height = self
            .db
            .cf_handle("meta")
            .and_then(|cf| self.db.get_cf(cf, KEY_TOP_HEIGHT).ok().flatten())
            .map(|v| {
                let bytes: [u8; 8] = v.as_slice().try_into().unwrap_or([0; 8]);
                BlockHeight(u64::from_be_bytes(bytes))
            })
            .unwrap_or(BlockHeight(0));
        let hash = self
            .db
            .cf_handle("meta")
            .and_then(|cf| self.db.get_cf(cf, KEY_TOP_HASH).ok().flatten())
            .map(|v| Hash::from_hash_bytes(&v))
            .unwrap_or(Hash::ZERO);
        (height, hash)
    }

    /// Acquire a fresh transactional session over the ledger.
    ///
    /// Fails with [`StorageError::Unavailable`] while a destructive reset
    /// holds the store exclusively. Always rolls back a stale prepared
    /// commit first - a crashed prior commit attempt must never leak into a
    /// new session.
    pub fn create_mutable_storage(&self) -> Result<MutableStorage, StorageError> {
        if self.reset_latch.try_read().is_err() {
            return Err(StorageError::Unavailable);
        }
        self.rollback_stale_prepared()?;
        let (height, hash) = self.top();
        Ok(MutableStorage::new(self.db.clone(), height, hash))
    }

    /// Durably stage the storage's pending writes without making them
    /// visible. A crash after this call is recovered by rollback on the next
    /// startup (or session creation), never by completion.
    pub fn prepare_block(&self, storage: &mut MutableStorage) -> Result<(), StorageError> {
        let staged = PreparedCommit {
            blocks: storage.blocks.clone(),
            writes: storage
                .overlay
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        };
        let bytes =
            sbor::basic_encode(&staged).map_err(|e| StorageError::Codec(format!("{e:?}")))?;

        let cf = self.cf("prepared")?;
        let mut write_opts = rocksdb::WriteOptions::default();
        write_opts.set_sync(true);
        self.db
            .put_cf_opt(cf, KEY_STAGED, bytes, &write_opts)
            .map_err(|e| StorageError::Database(e.to_string()))?;

        storage.prepared = true;
        debug!(blocks = storage.blocks.len(), "prepared pending commit");
        Ok(())
    }

    /// Make the storage's staged state visible: block bytes into the
    /// append-only block store, WSV writes, chain metadata, and the prepared
    /// marker cleared - one atomic, synced batch. Indices are built after
    /// the batch lands and never roll it back.
    pub fn commit(&self, storage: MutableStorage) -> Result<LedgerState, CommitError> {
        if storage.blocks.is_empty() {
            return Err(CommitError::Empty);
        }
        let _shared = self
            .reset_latch
            .read()
            .map_err(|_| CommitError::Database("reset latch poisoned".into()))?;

        let blocks_cf = self.cf("blocks")?;
        let wsv_cf = self.cf("wsv")?;
        let meta_cf = self.cf("meta")?;
        let prepared_cf = self.cf("prepared")?;

        let mut batch = WriteBatch::default();
        for block in &storage.blocks {
            let encoded = sbor::basic_encode(block)
                .map_err(|e| CommitError::Database(format!("block encoding: {e:?}")))?;
            batch.put_cf(blocks_cf, block.height().0.to_be_bytes(), encoded);
            batch.put_cf(
                meta_cf,
                [BLOCK_HASH_PREFIX, block.hash().as_bytes().as_slice()].concat(),
                block.height().0.to_be_bytes(),
            );
        }
        for (key, value) in &storage.overlay {
            batch.put_cf(wsv_cf, key, value);
        }
        batch.put_cf(
            meta_cf,
            KEY_TOP_HEIGHT,
            storage.top_height.0.to_be_bytes(),
        );
        batch.put_cf(meta_cf, KEY_TOP_HASH, storage.top_hash.as_bytes());
        batch.delete_cf(prepared_cf, KEY_STAGED);

        let mut write_opts = rocksdb::WriteOptions::default();
        write_opts.set_sync(true);
        if let Err(e) = self.db.write_opt(batch, &write_opts) {
            // Restore the invariant before any other write proceeds: a
            // failed commit must not leave its prepared staging behind.
            if storage.prepared {
                if let Err(rollback) = self.db.delete_cf(prepared_cf, KEY_STAGED) {
                    warn!(error = %rollback, "failed to roll back prepared commit");
                }
            }
            return Err(CommitError::Database(e.to_string()));
        }

        // Indices are a best-effort secondary structure; a crash between the
        // batch above and these writes is repaired by re-indexing, not by
        // rolling back the block.
        let indexer = self.indexer();
        for block in &storage.blocks {
            if let Err(e) = indexer.index(block) {
                warn!(height = %block.height(), error = %e, "block indexing failed");
            }
        }

        let last = storage
            .blocks
            .last()
            .cloned()
            .expect("checked non-empty above");
        *self.last_commit.write().expect("cache lock poisoned") = Some(last);

        let empty = BTreeMap::new();
        let wsv = Wsv::new(&self.db, wsv_cf, &empty);
        let peers = wsv.peers()?;

        info!(
            height = %storage.top_height,
            hash = %storage.top_hash,
            blocks = storage.blocks.len(),
            "committed"
        );

        Ok(LedgerState {
            top_block_height: storage.top_height,
            top_block_hash: storage.top_hash,
            peers,
        })
    }

    /// Apply and commit a single block outside consensus (genesis
    /// installation, tests). The block is still executed command by command.
    pub fn insert_block(&self, block: Block) -> bool {
        debug!(height = %block.height(), "create mutable storage");
        let mut storage = match self.create_mutable_storage() {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "cannot create mutable storage");
                return false;
            }
        };
        let inserted = storage.apply(block, |_, _, _| true);
        info!(inserted, "block inserted");
        if !inserted {
            return false;
        }
        self.commit(storage).is_ok()
    }

    fn rollback_stale_prepared(&self) -> Result<(), StorageError> {
        let cf = self.cf("prepared")?;
        let stale = self
            .db
            .get_cf(cf, KEY_STAGED)
            .map_err(|e| StorageError::Database(e.to_string()))?;
        if stale.is_some() {
            warn!("rolling back stale prepared commit from a previous run");
            let mut write_opts = rocksdb::WriteOptions::default();
            write_opts.set_sync(true);
            self.db
                .delete_cf_opt(cf, KEY_STAGED, &write_opts)
                .map_err(|e| StorageError::Database(e.to_string()))?;
        }
        Ok(())
    }

    /// Erase the entire ledger under the exclusive latch. Concurrent commits
    /// and new sessions are blocked until this returns.
    pub fn drop_ledger(&self) -> Result<(), StorageError> {
        let _exclusive = self
            .reset_latch
            .write()
            .map_err(|_| StorageError::Database("reset latch poisoned".into()))?;
        info!("dropping ledger");

        for name in ["blocks", "wsv", "index", "meta", "prepared", "ordering"] {
            let cf = self.cf(name)?;
            let keys: Vec<Vec<u8>> = self
                .db
                .iterator_cf(cf, rocksdb::IteratorMode::Start)
                .filter_map(|item| item.ok().map(|(k, _)| k.to_vec()))
                .collect();
            let mut batch = WriteBatch::default();
            for key in keys {
                batch.delete_cf(cf, key);
            }
            self.db
                .write(batch)
                .map_err(|e| StorageError::Database(e.to_string()))?;
        }

        *self.last_commit.write().expect("cache lock poisoned") = None;
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Own-vote records (consensus safety critical)
    // ═══════════════════════════════════════════════════════════════════════

    /// Persist our own vote for a round.
    ///
    /// MUST be called before the vote is broadcast: after a crash/restart,
    /// recorded votes are what prevents voting for a different hash at the
    /// same round.
    ///
    /// # Panics
    ///
    /// Panics if the write fails. If the vote cannot be made durable it must
    /// not be broadcast, and there is no way to continue safely.
    pub fn put_own_vote(&self, round: Round, block_hash: Hash) {
        let cf = self
            .db
            .cf_handle("meta")
            .expect("meta column family must exist");
        let mut write_opts = rocksdb::WriteOptions::default();
        write_opts.set_sync(true);
        self.db
            .put_cf_opt(cf, own_vote_key(round), block_hash.as_bytes(), &write_opts)
            .expect("own-vote persistence failed - cannot continue safely");
    }

    /// Our recorded vote at `round`, if any.
    pub fn own_vote(&self, round: Round) -> Option<Hash> {
        let cf = self.db.cf_handle("meta")?;
        self.db
            .get_cf(cf, own_vote_key(round))
            .ok()
            .flatten()
            .map(|v| Hash::from_hash_bytes(&v))
    }

    /// All recorded own votes, for recovery on startup.
    pub fn all_own_votes(&self) -> BTreeMap<Round, Hash> {
        let Some(cf) = self.db.cf_handle("meta") else {
            return BTreeMap::new();
        };
        self.db
            .iterator_cf(
                cf,
                rocksdb::IteratorMode::From(OWN_VOTE_PREFIX, rocksdb::Direction::Forward),
            )
            .take_while(|item| {
                item.as_ref()
                    .map(|(k, _)| k.starts_with(OWN_VOTE_PREFIX))
                    .unwrap_or(false)
            })
            .filter_map(|item| {
                let (key, value) = item.ok()?;
                let round = round_from_key(&key)?;
                Some((round, Hash::from_hash_bytes(&value)))
            })
            .collect()
    }

    /// Remove own votes strictly below `round`. Settled rounds no longer
    /// need equivocation protection and must not grow without bound.
    pub fn prune_own_votes(&self, round: Round) {
        let Some(cf) = self.db.cf_handle("meta") else {
            return;
        };
        let mut batch = WriteBatch::default();
        for (recorded, _) in self.all_own_votes() {
            if recorded < round {
                batch.delete_cf(cf, own_vote_key(recorded));
            }
        }
        if let Err(e) = self.db.write(batch) {
            warn!(error = %e, "failed to prune own votes");
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Sessions
    // ═══════════════════════════════════════════════════════════════════════

    /// Read-only view over committed blocks.
    pub fn block_query(&self) -> BlockQuery {
        BlockQuery::new(self.db.clone(), self.last_commit.clone())
    }

    /// The auxiliary index builder/reader.
    pub fn indexer(&self) -> BlockIndexer {
        BlockIndexer::new(self.db.clone())
    }

    /// The ordering service's persistent resume state.
    pub fn ordering_state(&self) -> OrderingState {
        OrderingState::new(self.db.clone())
    }

    /// Committed WSV reads (no overlay).
    pub fn account(&self, id: &str) -> Result<Option<crate::Account>, StorageError> {
        let empty = BTreeMap::new();
        Wsv::new(&self.db, self.cf("wsv")?, &empty).account(id)
    }

    pub fn balance(&self, account: &str, asset: &str) -> Result<u64, StorageError> {
        let empty = BTreeMap::new();
        Wsv::new(&self.db, self.cf("wsv")?, &empty).balance(account, asset)
    }

    pub fn peers(&self) -> Result<Vec<concordia_types::PeerInfo>, StorageError> {
        let empty = BTreeMap::new();
        Wsv::new(&self.db, self.cf("wsv")?, &empty).peers()
    }
}

fn own_vote_key(round: Round) -> Vec<u8> {
    let mut key = Vec::with_capacity(OWN_VOTE_PREFIX.len() + 16);
    key.extend_from_slice(OWN_VOTE_PREFIX);
    key.extend_from_slice(&round.block_round.to_be_bytes());
    key.extend_from_slice(&round.reject_round.to_be_bytes());
    key
}

fn round_from_key(key: &[u8]) -> Option<Round> {
    let rest = key.strip_prefix(OWN_VOTE_PREFIX)?;
    if rest.len() != 16 {
        return None;
    }
    let block_round = u64::from_be_bytes(rest[..8].try_into().ok()?);
    let reject_round = u64::from_be_bytes(rest[8..].try_into().ok()?);
    Some(Round::new(block_round, reject_round))
}

#[cfg(test)]
mod tests {
    use super::*;
    use concordia_types::test_utils::{test_keypair, test_transfer};
    use concordia_types::{BlockHeader, Command, PeerId, PeerInfo, Transaction};
    use tempfile::TempDir;

    fn genesis_block() -> Block {
        let admin_key = test_keypair(1);
        let alice_key = test_keypair(2);
        Block {
            header: BlockHeader {
                height: BlockHeight(1),
                prev_hash: Hash::ZERO,
                proposal_hash: Hash::from_bytes(b"genesis-proposal"),
                created_at: 0,
            },
            transactions: vec![Transaction::new(
                "admin@test".into(),
                vec![
                    Command::CreateAccount {
                        account_id: "admin@test".into(),
                        public_key: admin_key.public_key(),
                    },
                    Command::CreateAccount {
                        account_id: "alice@test".into(),
                        public_key: alice_key.public_key(),
                    },
                    Command::CreateAsset {
                        asset_id: "coin#test".into(),
                        precision: 2,
                    },
                    Command::AddAssetQuantity {
                        account_id: "alice@test".into(),
                        asset_id: "coin#test".into(),
                        amount: 100,
                    },
                    Command::AddPeer {
                        peer: PeerInfo {
                            peer_id: PeerId(0),
                            public_key: admin_key.public_key(),
                            address: "localhost:50541".into(),
                        },
                    },
                ],
                0,
            )],
            signatures: vec![],
        }
    }

    fn next_block(store: &LedgerStore, transactions: Vec<Transaction>) -> Block {
        let (height, hash) = store.top();
        Block {
            header: BlockHeader {
                height: height.next(),
                prev_hash: hash,
                proposal_hash: Hash::from_bytes(b"proposal"),
                created_at: 1000 * height.0,
            },
            transactions,
            signatures: vec![],
        }
    }

    #[test]
    fn test_insert_block_and_read_back() {
        let temp_dir = TempDir::new().unwrap();
        let store = LedgerStore::open(temp_dir.path()).unwrap();

        let genesis = genesis_block();
        assert!(store.insert_block(genesis.clone()));

        let (height, hash) = store.top();
        assert_eq!(height, BlockHeight(1));
        assert_eq!(hash, genesis.hash());
        assert_eq!(store.balance("alice@test", "coin#test").unwrap(), 100);
        assert_eq!(store.peers().unwrap().len(), 1);
    }

    #[test]
    fn test_apply_failure_leaves_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let store = LedgerStore::open(temp_dir.path()).unwrap();
        assert!(store.insert_block(genesis_block()));

        // alice has 100; transferring 500 must fail the whole block.
        let block = next_block(
            &store,
            vec![test_transfer(
                "alice@test",
                "alice@test",
                "admin@test",
                500,
            )],
        );
        let mut storage = store.create_mutable_storage().unwrap();
        assert!(!storage.apply(block, |_, _, _| true));
        assert_eq!(storage.staged_blocks(), 0);
        assert_eq!(store.balance("alice@test", "coin#test").unwrap(), 100);
    }

    #[test]
    fn test_commit_of_applied_chain() {
        let temp_dir = TempDir::new().unwrap();
        let store = LedgerStore::open(temp_dir.path()).unwrap();
        assert!(store.insert_block(genesis_block()));

        let block2 = next_block(
            &store,
            vec![test_transfer("alice@test", "alice@test", "admin@test", 30)],
        );
        let mut storage = store.create_mutable_storage().unwrap();
        assert!(storage.apply(block2.clone(), |_, _, _| true));

        let block3 = Block {
            header: BlockHeader {
                height: BlockHeight(3),
                prev_hash: block2.hash(),
                proposal_hash: Hash::from_bytes(b"proposal"),
                created_at: 3000,
            },
            transactions: vec![test_transfer("alice@test", "alice@test", "admin@test", 20)],
            signatures: vec![],
        };
        assert!(storage.apply(block3, |_, _, _| true));

        let state = store.commit(storage).unwrap();
        assert_eq!(state.top_block_height, BlockHeight(3));
        assert_eq!(store.balance("alice@test", "coin#test").unwrap(), 50);
        assert_eq!(store.balance("admin@test", "coin#test").unwrap(), 50);
    }

    #[test]
    fn test_prepare_crash_rolls_back_on_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let genesis = genesis_block();

        // Session one: commit genesis, then prepare (but never commit) a
        // second block - and "crash" by dropping the store.
        {
            let store = LedgerStore::open(temp_dir.path()).unwrap();
            assert!(store.insert_block(genesis.clone()));

            let block2 = next_block(
                &store,
                vec![test_transfer("alice@test", "alice@test", "admin@test", 30)],
            );
            let mut storage = store.create_mutable_storage().unwrap();
            assert!(storage.apply(block2, |_, _, _| true));
            store.prepare_block(&mut storage).unwrap();
            // Crash: storage dropped without commit.
        }

        // Restart: the stale prepared commit is rolled back and nothing of
        // the second block is visible.
        {
            let store = LedgerStore::open(temp_dir.path()).unwrap();
            let (height, hash) = store.top();
            assert_eq!(height, BlockHeight(1));
            assert_eq!(hash, genesis.hash());
            assert_eq!(store.balance("alice@test", "coin#test").unwrap(), 100);
            assert!(store.block_query().block(BlockHeight(2)).is_none());
        }
    }

    #[test]
    fn test_prepared_commit_clears_staging() {
        let temp_dir = TempDir::new().unwrap();
        let store = LedgerStore::open(temp_dir.path()).unwrap();
        assert!(store.insert_block(genesis_block()));

        let block2 = next_block(
            &store,
            vec![test_transfer("alice@test", "alice@test", "admin@test", 10)],
        );
        let mut storage = store.create_mutable_storage().unwrap();
        assert!(storage.apply(block2, |_, _, _| true));
        store.prepare_block(&mut storage).unwrap();
        store.commit(storage).unwrap();

        // A fresh session must not see (or roll back) anything stale.
        let storage = store.create_mutable_storage().unwrap();
        assert_eq!(storage.top_height(), BlockHeight(2));
        assert_eq!(store.balance("admin@test", "coin#test").unwrap(), 10);
    }

    #[test]
    fn test_commit_empty_storage_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = LedgerStore::open(temp_dir.path()).unwrap();
        let storage = store.create_mutable_storage().unwrap();
        assert!(matches!(store.commit(storage), Err(CommitError::Empty)));
    }

    #[test]
    fn test_own_vote_persistence_and_recovery() {
        let temp_dir = TempDir::new().unwrap();
        let hash_a = Hash::from_bytes(b"block-a");

        {
            let store = LedgerStore::open(temp_dir.path()).unwrap();
            store.put_own_vote(Round::new(5, 0), hash_a);
            store.put_own_vote(Round::new(5, 1), Hash::from_bytes(b"block-b"));
        }

        {
            let store = LedgerStore::open(temp_dir.path()).unwrap();
            let votes = store.all_own_votes();
            assert_eq!(votes.len(), 2);
            assert_eq!(votes.get(&Round::new(5, 0)), Some(&hash_a));
            assert_eq!(store.own_vote(Round::new(5, 0)), Some(hash_a));
            assert_eq!(store.own_vote(Round::new(6, 0)), None);
        }
    }

    #[test]
    fn test_own_vote_pruning() {
        let temp_dir = TempDir::new().unwrap();
        let store = LedgerStore::open(temp_dir.path()).unwrap();

        for block_round in 1..=5 {
            store.put_own_vote(
                Round::new(block_round, 0),
                Hash::from_bytes(&block_round.to_be_bytes()),
            );
        }
        store.prune_own_votes(Round::new(4, 0));

        let votes = store.all_own_votes();
        assert_eq!(votes.len(), 2);
        assert!(votes.contains_key(&Round::new(4, 0)));
        assert!(votes.contains_key(&Round::new(5, 0)));
        assert!(!votes.contains_key(&Round::new(3, 0)));
    }

    #[test]
    fn test_drop_ledger_erases_everything() {
        let temp_dir = TempDir::new().unwrap();
        let store = LedgerStore::open(temp_dir.path()).unwrap();
        assert!(store.insert_block(genesis_block()));
        store.put_own_vote(Round::new(1, 0), Hash::from_bytes(b"x"));

        store.drop_ledger().unwrap();

        assert_eq!(store.top(), (BlockHeight(0), Hash::ZERO));
        assert!(store.all_own_votes().is_empty());
        assert_eq!(store.balance("alice@test", "coin#test").unwrap(), 0);
        assert!(store.block_query().block(BlockHeight(1)).is_none());

        // The store is usable again after the reset.
        assert!(store.insert_block(genesis_block()));
        assert_eq!(store.top().0, BlockHeight(1));
    }

    #[test]
    fn test_missing_references_fail_the_block() {
        let temp_dir = TempDir::new().unwrap();
        let store = LedgerStore::open(temp_dir.path()).unwrap();
        assert!(store.insert_block(genesis_block()));

        // Minting an asset that was never created.
        let bad_asset = next_block(
            &store,
            vec![Transaction::new(
                "admin@test".into(),
                vec![Command::AddAssetQuantity {
                    account_id: "alice@test".into(),
                    asset_id: "ghost#test".into(),
                    amount: 5,
                }],
                0,
            )],
        );
        assert!(!store.insert_block(bad_asset));

        // Transferring from an account that does not exist.
        let bad_account = next_block(
            &store,
            vec![test_transfer("ghost@test", "ghost@test", "alice@test", 1)],
        );
        assert!(!store.insert_block(bad_account));

        assert_eq!(store.top().0, BlockHeight(1));
        assert_eq!(store.balance("alice@test", "coin#test").unwrap(), 100);
    }

    #[test]
    fn test_mint_creates_missing_balance_record() {
        let temp_dir = TempDir::new().unwrap();
        let store = LedgerStore::open(temp_dir.path()).unwrap();
        assert!(store.insert_block(genesis_block()));

        // admin has no balance record for coin#test yet; minting must
        // create one rather than fail.
        let mint = next_block(
            &store,
            vec![Transaction::new(
                "admin@test".into(),
                vec![Command::AddAssetQuantity {
                    account_id: "admin@test".into(),
                    asset_id: "coin#test".into(),
                    amount: 7,
                }],
                0,
            )],
        );
        assert!(store.insert_block(mint));
        assert_eq!(store.balance("admin@test", "coin#test").unwrap(), 7);
    }

    #[test]
    fn test_duplicate_account_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let store = LedgerStore::open(temp_dir.path()).unwrap();
        assert!(store.insert_block(genesis_block()));

        let block = next_block(
            &store,
            vec![Transaction::new(
                "admin@test".into(),
                vec![Command::CreateAccount {
                    account_id: "alice@test".into(),
                    public_key: test_keypair(2).public_key(),
                }],
                0,
            )],
        );
        assert!(!store.insert_block(block));
        assert_eq!(store.top().0, BlockHeight(1));
    }
}
