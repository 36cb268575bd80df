//! World State View: materialized ledger projections and command execution.
//!
//! The WSV lives in its own column family as plain key-value records. Reads
//! go through an overlay of staged writes first, so an uncommitted block
//! sees its own earlier commands.

use crate::{CommandError, StorageError};
use concordia_types::{Command, PeerInfo, PublicKey};
use rocksdb::DB;
use sbor::prelude::BasicSbor;
use std::collections::BTreeMap;

/// An account record.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct Account {
    pub account_id: String,
    pub public_key: PublicKey,
}

/// An asset record.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct Asset {
    pub asset_id: String,
    pub precision: u8,
}

/// Key layout inside the `wsv` column family.
pub(crate) mod keys {
    pub const PEER_PREFIX: &[u8] = b"peer:";

    pub fn account(id: &str) -> Vec<u8> {
        [b"acct:", id.as_bytes()].concat()
    }

    pub fn asset(id: &str) -> Vec<u8> {
        [b"asst:", id.as_bytes()].concat()
    }

    /// NUL separates the ids; account and asset ids never contain NUL.
    pub fn balance(account: &str, asset: &str) -> Vec<u8> {
        [b"bal:", account.as_bytes(), b"\x00", asset.as_bytes()].concat()
    }

    pub fn peer(peer_id: u64) -> Vec<u8> {
        [PEER_PREFIX, &peer_id.to_be_bytes()[..]].concat()
    }
}

/// Read view over the WSV: staged overlay first, then the database.
pub struct Wsv<'a> {
    db: &'a DB,
    cf: &'a rocksdb::ColumnFamily,
    overlay: &'a BTreeMap<Vec<u8>, Vec<u8>>,
}

impl<'a> Wsv<'a> {
    pub(crate) fn new(
        db: &'a DB,
        cf: &'a rocksdb::ColumnFamily,
        overlay: &'a BTreeMap<Vec<u8>, Vec<u8>>,
    ) -> Self {
        Self { db, cf, overlay }
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        if let Some(v) = self.overlay.get(key) {
            return Ok(Some(v.clone()));
        }
        self.db
            .get_cf(self.cf, key)
            .map_err(|e| StorageError::Database(e.to_string()))
    }

    pub fn account(&self, id: &str) -> Result<Option<Account>, StorageError> {
        match self.get(&keys::account(id))? {
            Some(bytes) => sbor::basic_decode(&bytes)
                .map(Some)
                .map_err(|e| StorageError::Codec(format!("{e:?}"))),
            None => Ok(None),
        }
    }

    pub fn asset(&self, id: &str) -> Result<Option<Asset>, StorageError> {
        match self.get(&keys::asset(id))? {
            Some(bytes) => sbor::basic_decode(&bytes)
                .map(Some)
                .map_err(|e| StorageError::Codec(format!("{e:?}"))),
            None => Ok(None),
        }
    }

    /// Balance of `asset` on `account`. A missing record reads as zero; the
    /// distinction between "no record" and "zero" matters only to
    /// `execute_command`, which uses `balance_record`.
    pub fn balance(&self, account: &str, asset: &str) -> Result<u64, StorageError> {
        Ok(self.balance_record(account, asset)?.unwrap_or(0))
    }

    /// Balance record, if one exists.
    pub fn balance_record(&self, account: &str, asset: &str) -> Result<Option<u64>, StorageError> {
        match self.get(&keys::balance(account, asset))? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| StorageError::Codec("balance is not 8 bytes".into()))?;
                Ok(Some(u64::from_be_bytes(arr)))
            }
            None => Ok(None),
        }
    }

    /// All registered peers, in id order. Overlay entries shadow the
    /// database so an uncommitted `AddPeer` is already visible.
    pub fn peers(&self) -> Result<Vec<PeerInfo>, StorageError> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> = BTreeMap::new();

        let iter = self.db.iterator_cf(
            self.cf,
            rocksdb::IteratorMode::From(keys::PEER_PREFIX, rocksdb::Direction::Forward),
        );
        for item in iter {
            let (key, value) = item.map_err(|e| StorageError::Database(e.to_string()))?;
            if !key.starts_with(keys::PEER_PREFIX) {
                break;
            }
            merged.insert(key.to_vec(), value.to_vec());
        }
        for (key, value) in self.overlay.range(keys::PEER_PREFIX.to_vec()..) {
            if !key.starts_with(keys::PEER_PREFIX) {
                break;
            }
            merged.insert(key.clone(), value.clone());
        }

        merged
            .values()
            .map(|bytes| {
                sbor::basic_decode(bytes).map_err(|e| StorageError::Codec(format!("{e:?}")))
            })
            .collect()
    }
}

/// Apply one command to the staged overlay.
///
/// Reads go through `wsv` (overlay + database); writes land in `staged`.
/// Any error leaves `staged` exactly as the caller passed it only if the
/// caller discards it - this function may have written some keys before
/// failing, so callers execute against a scratch copy.
pub fn execute_command(
    wsv: &Wsv<'_>,
    staged: &mut BTreeMap<Vec<u8>, Vec<u8>>,
    command: &Command,
) -> Result<(), CommandError> {
    match command {
        Command::CreateAccount {
            account_id,
            public_key,
        } => {
            if read_through(wsv, staged, &keys::account(account_id)).is_some() {
                return Err(CommandError::AccountAlreadyExists(account_id.clone()));
            }
            let record = Account {
                account_id: account_id.clone(),
                public_key: *public_key,
            };
            staged.insert(keys::account(account_id), encode(&record));
            Ok(())
        }

        Command::CreateAsset {
            asset_id,
            precision,
        } => {
            if read_through(wsv, staged, &keys::asset(asset_id)).is_some() {
                return Err(CommandError::AssetAlreadyExists(asset_id.clone()));
            }
            let record = Asset {
                asset_id: asset_id.clone(),
                precision: *precision,
            };
            staged.insert(keys::asset(asset_id), encode(&record));
            Ok(())
        }

        Command::AddAssetQuantity {
            account_id,
            asset_id,
            amount,
        } => {
            require_account(wsv, staged, account_id)?;
            require_asset(wsv, staged, asset_id)?;
            // No record yet means a fresh zero balance - an explicit branch,
            // not an error.
            let balance = read_balance(wsv, staged, account_id, asset_id).unwrap_or(0);
            let updated = balance
                .checked_add(*amount)
                .ok_or_else(|| CommandError::AmountOverflow {
                    account: account_id.clone(),
                    asset: asset_id.clone(),
                })?;
            staged.insert(
                keys::balance(account_id, asset_id),
                updated.to_be_bytes().to_vec(),
            );
            Ok(())
        }

        Command::TransferAsset {
            src_account_id,
            dest_account_id,
            asset_id,
            amount,
        } => {
            require_account(wsv, staged, src_account_id)?;
            require_account(wsv, staged, dest_account_id)?;
            require_asset(wsv, staged, asset_id)?;

            let src_balance = read_balance(wsv, staged, src_account_id, asset_id).unwrap_or(0);
            if src_balance < *amount {
                return Err(CommandError::InsufficientBalance {
                    account: src_account_id.clone(),
                    asset: asset_id.clone(),
                    balance: src_balance,
                    requested: *amount,
                });
            }
            let dest_balance = read_balance(wsv, staged, dest_account_id, asset_id).unwrap_or(0);
            let dest_updated =
                dest_balance
                    .checked_add(*amount)
                    .ok_or_else(|| CommandError::AmountOverflow {
                        account: dest_account_id.clone(),
                        asset: asset_id.clone(),
                    })?;

            staged.insert(
                keys::balance(src_account_id, asset_id),
                (src_balance - amount).to_be_bytes().to_vec(),
            );
            staged.insert(
                keys::balance(dest_account_id, asset_id),
                dest_updated.to_be_bytes().to_vec(),
            );
            Ok(())
        }

        Command::AddPeer { peer } => {
            let key = keys::peer(peer.peer_id.0);
            if read_through(wsv, staged, &key).is_some() {
                return Err(CommandError::PeerAlreadyExists(peer.peer_id.0));
            }
            staged.insert(key, encode(peer));
            Ok(())
        }
    }
}

fn encode<T: sbor::prelude::BasicEncode>(value: &T) -> Vec<u8> {
    sbor::basic_encode(value).expect("wsv record encoding cannot fail")
}

fn read_through(
    wsv: &Wsv<'_>,
    staged: &BTreeMap<Vec<u8>, Vec<u8>>,
    key: &[u8],
) -> Option<Vec<u8>> {
    staged.get(key).cloned().or_else(|| wsv.get(key).ok()?)
}

fn read_balance(
    wsv: &Wsv<'_>,
    staged: &BTreeMap<Vec<u8>, Vec<u8>>,
    account: &str,
    asset: &str,
) -> Option<u64> {
    let bytes = read_through(wsv, staged, &keys::balance(account, asset))?;
    let arr: [u8; 8] = bytes.as_slice().try_into().ok()?;
    Some(u64::from_be_bytes(arr))
}

fn require_account(
    wsv: &Wsv<'_>,
    staged: &BTreeMap<Vec<u8>, Vec<u8>>,
    id: &str,
) -> Result<(), CommandError> {
    if read_through(wsv, staged, &keys::account(id)).is_none() {
        return Err(CommandError::AccountNotFound(id.to_string()));
    }
    Ok(())
}

fn require_asset(
    wsv: &Wsv<'_>,
    staged: &BTreeMap<Vec<u8>, Vec<u8>>,
    id: &str,
) -> Result<(), CommandError> {
    if read_through(wsv, staged, &keys::asset(id)).is_none() {
        return Err(CommandError::AssetNotFound(id.to_string()));
    }
    Ok(())
}
