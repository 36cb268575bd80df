//! Storage error types.

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// The store is mid-reset (exclusive latch held); no new sessions.
    #[error("storage unavailable: reset in progress")]
    Unavailable,

    /// A value failed to encode or decode.
    #[error("codec error: {0}")]
    Codec(String),
}

/// Error committing a mutable storage.
#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    #[error("commit failed: {0}")]
    Database(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Commit called on a storage with no applied blocks.
    #[error("nothing to commit")]
    Empty,
}

/// A ledger command that could not be applied.
///
/// These are values, not exceptions: `apply` branches on them and reports
/// the block as not committed, leaving the database untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("asset not found: {0}")]
    AssetNotFound(String),

    #[error("account already exists: {0}")]
    AccountAlreadyExists(String),

    #[error("asset already exists: {0}")]
    AssetAlreadyExists(String),

    #[error("peer already registered: {0}")]
    PeerAlreadyExists(u64),

    #[error("insufficient balance on {account} for {asset}: have {balance}, need {requested}")]
    InsufficientBalance {
        account: String,
        asset: String,
        balance: u64,
        requested: u64,
    },

    #[error("balance overflow on {account} for {asset}")]
    AmountOverflow { account: String, asset: String },
}
