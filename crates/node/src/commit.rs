//! Commit execution shared by the runner and the test harness.

use concordia_core::Event;
use concordia_storage::LedgerStore;
use concordia_sync::ChainValidator;
use concordia_types::{Block, BlockSignature, PeerId, VoteMessage};
use concordia_yac::RecoveredVotes;
use std::collections::HashSet;
use tracing::warn;

/// Turn the quorum's votes into the committed block's signature set.
///
/// Each vote carries the voter's signature over the block itself (inside its
/// `YacHash`); those are what the chain validator later counts. Duplicate
/// signers are skipped.
pub fn attach_quorum_signatures(block: &mut Block, votes: &[VoteMessage]) {
    let mut seen: HashSet<PeerId> = block.signatures.iter().map(|s| s.signer).collect();
    for vote in votes {
        let Some(signature) = vote.hash.block_signature else {
            continue;
        };
        if seen.insert(vote.voter) {
            block.signatures.push(BlockSignature {
                signer: vote.voter,
                signature,
            });
        }
    }
}

/// Apply `blocks` in order through one mutable storage, prepare, and commit.
///
/// Returns the event to feed back into the state machine: `CommitCompleted`
/// with the new ledger state, or `CommitFailed` naming the height that
/// refused.
pub fn commit_blocks(store: &LedgerStore, validator: &ChainValidator, blocks: Vec<Block>) -> Event {
    let first_height = match blocks.first() {
        Some(block) => block.height(),
        None => {
            warn!("commit requested with no blocks");
            return Event::CommitFailed {
                height: store.top().0,
            };
        }
    };

    let mut storage = match store.create_mutable_storage() {
        Ok(storage) => storage,
        Err(e) => {
            warn!(error = %e, "cannot create mutable storage");
            return Event::CommitFailed {
                height: first_height,
            };
        }
    };

    for block in blocks {
        let height = block.height();
        let tip = storage.top_height();
        let applied = storage.apply(block, |candidate, _wsv, top_hash| {
            validator.validate_block(candidate, tip, top_hash).is_ok()
        });
        if !applied {
            return Event::CommitFailed { height };
        }
    }

    if let Err(e) = store.prepare_block(&mut storage) {
        warn!(error = %e, "prepare failed");
        return Event::CommitFailed {
            height: first_height,
        };
    }

    match store.commit(storage) {
        Ok(state) => Event::CommitCompleted { state },
        Err(e) => {
            warn!(error = %e, "commit failed");
            Event::CommitFailed {
                height: first_height,
            }
        }
    }
}

/// Load the gate's recovered own votes from storage.
pub fn recovered_votes(store: &LedgerStore) -> RecoveredVotes {
    RecoveredVotes {
        voted: store.all_own_votes(),
    }
}
