//! Runner smoke test: a single-peer network commits through the full tokio
//! pipeline - gate, synchronizer, storage, watch publication.

use concordia_messages::VoteBundleGossip;
use concordia_node::{
    BlockLoader, LoaderError, MessengerError, NodeConfig, NodeHandle, NodeRunner, NodeState,
    PeerMessenger,
};
use concordia_storage::LedgerStore;
use concordia_types::test_utils::test_peer_set;
use concordia_types::{
    Block, BlockHeader, BlockHeight, Command, Hash, PeerId, Round, Transaction,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

struct NullMessenger;

impl PeerMessenger for NullMessenger {
    fn broadcast(&self, _message: &VoteBundleGossip) -> Result<(), MessengerError> {
        Ok(())
    }
    fn send_to(&self, _peer: PeerId, _message: &VoteBundleGossip) -> Result<(), MessengerError> {
        Ok(())
    }
}

struct NullLoader;

impl BlockLoader for NullLoader {
    fn retrieve_blocks(
        &self,
        _peer: PeerId,
        _from: BlockHeight,
    ) -> Result<Vec<Block>, LoaderError> {
        Err(LoaderError::NotFound)
    }
    fn retrieve_block(&self, _peer: PeerId, _hash: Hash) -> Result<Block, LoaderError> {
        Err(LoaderError::NotFound)
    }
}

fn start_single_node(dir: &TempDir) -> (Arc<LedgerStore>, NodeHandle, tokio::task::JoinHandle<()>) {
    let (peers, keys) = test_peer_set(1);
    let store = Arc::new(LedgerStore::open(dir.path()).expect("open store"));
    let config = NodeConfig::new(PeerId(0), peers);
    let state = NodeState::new(config.clone(), keys[0].clone(), &store);
    let (runner, handle) = NodeRunner::new(
        config,
        state,
        store.clone(),
        Arc::new(NullMessenger),
        Arc::new(NullLoader),
    );
    let task = tokio::spawn(runner.run());
    (store, handle, task)
}

#[tokio::test]
async fn test_single_peer_commit_through_runner() {
    let dir = TempDir::new().unwrap();
    let (store, handle, task) = start_single_node(&dir);

    let genesis = Block {
        header: BlockHeader {
            height: BlockHeight(1),
            prev_hash: Hash::ZERO,
            proposal_hash: Hash::from_bytes(b"genesis"),
            created_at: 0,
        },
        transactions: vec![Transaction::new(
            "admin@test".into(),
            vec![Command::CreateAsset {
                asset_id: "coin#test".into(),
                precision: 2,
            }],
            0,
        )],
        signatures: vec![],
    };

    let mut updates = handle.ledger_updates();
    handle
        .submit_candidate(Round::new(1, 0), genesis.clone())
        .await;

    // In a one-peer network our own vote is the quorum; the ledger state
    // must arrive promptly.
    tokio::time::timeout(Duration::from_secs(5), updates.changed())
        .await
        .expect("commit within the deadline")
        .expect("runner alive");

    let state = updates.borrow().clone().expect("ledger state published");
    assert_eq!(state.top_block_height, BlockHeight(1));
    assert_eq!(state.top_block_hash, genesis.hash());
    assert_eq!(store.top(), (BlockHeight(1), genesis.hash()));

    // Our vote was persisted before broadcast.
    assert_eq!(store.own_vote(Round::new(1, 0)), Some(genesis.hash()));

    task.abort();
}

#[tokio::test]
async fn test_invalid_bundle_rejected_at_ingress() {
    let dir = TempDir::new().unwrap();
    let (_store, handle, task) = start_single_node(&dir);

    // An empty bundle is stateless-invalid: typed error, no side effect.
    let result = handle
        .deliver_bundle(PeerId(0), VoteBundleGossip::new(vec![]))
        .await;
    assert!(result.is_err());

    task.abort();
}
