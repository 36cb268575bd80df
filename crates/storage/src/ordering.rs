//! Ordering-service resume state.
//!
//! A single durable value: the next proposal height the ordering service
//! should produce after a restart.

use crate::StorageError;
use rocksdb::DB;
use std::sync::Arc;

const KEY_NEXT_HEIGHT: &[u8] = b"next_proposal_height";

/// Persistent resume state for the ordering service.
pub struct OrderingState {
    db: Arc<DB>,
}

impl OrderingState {
    pub(crate) fn new(db: Arc<DB>) -> Self {
        Self { db }
    }

    fn cf(&self) -> Result<&rocksdb::ColumnFamily, StorageError> {
        self.db
            .cf_handle("ordering")
            .ok_or_else(|| StorageError::Database("ordering column family not found".into()))
    }

    /// The next proposal height to produce. A fresh (or reset) state starts
    /// at 1.
    pub fn next_proposal_height(&self) -> Result<u64, StorageError> {
        let value = self
            .db
            .get_cf(self.cf()?, KEY_NEXT_HEIGHT)
            .map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(value
            .and_then(|v| <[u8; 8]>::try_from(v.as_slice()).ok())
            .map(u64::from_be_bytes)
            .unwrap_or(1))
    }

    /// Record that `height` was consumed; the next proposal is `height + 1`.
    pub fn advance(&self, height: u64) -> Result<(), StorageError> {
        self.db
            .put_cf(self.cf()?, KEY_NEXT_HEIGHT, (height + 1).to_be_bytes())
            .map_err(|e| StorageError::Database(e.to_string()))
    }

    /// Forget the resume state. Used by recovery tooling and tests.
    pub fn reset_state(&self) -> Result<(), StorageError> {
        self.db
            .delete_cf(self.cf()?, KEY_NEXT_HEIGHT)
            .map_err(|e| StorageError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LedgerStore;
    use tempfile::TempDir;

    #[test]
    fn test_fresh_state_starts_at_one() {
        let temp_dir = TempDir::new().unwrap();
        let store = LedgerStore::open(temp_dir.path()).unwrap();
        assert_eq!(store.ordering_state().next_proposal_height().unwrap(), 1);
    }

    #[test]
    fn test_advance_and_survive_restart() {
        let temp_dir = TempDir::new().unwrap();
        {
            let store = LedgerStore::open(temp_dir.path()).unwrap();
            let ordering = store.ordering_state();
            ordering.advance(1).unwrap();
            ordering.advance(2).unwrap();
            assert_eq!(ordering.next_proposal_height().unwrap(), 3);
        }
        {
            let store = LedgerStore::open(temp_dir.path()).unwrap();
            assert_eq!(store.ordering_state().next_proposal_height().unwrap(), 3);
        }
    }

    #[test]
    fn test_reset_state() {
        let temp_dir = TempDir::new().unwrap();
        let store = LedgerStore::open(temp_dir.path()).unwrap();
        let ordering = store.ordering_state();

        ordering.advance(7).unwrap();
        assert_eq!(ordering.next_proposal_height().unwrap(), 8);

        ordering.reset_state().unwrap();
        assert_eq!(ordering.next_proposal_height().unwrap(), 1);
    }
}
