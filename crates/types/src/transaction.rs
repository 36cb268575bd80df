//! Ledger transactions and commands.

use crate::{Hash, KeyPair, PeerInfo, PublicKey, Signature};
use sbor::prelude::BasicSbor;

/// A ledger mutation, one of a closed set of kinds.
///
/// Commands are a plain sum type dispatched by `match`; execution and
/// permission checks live in the storage crate as free functions over this
/// enum.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub enum Command {
    /// Register a new account.
    CreateAccount {
        account_id: String,
        public_key: PublicKey,
    },
    /// Register a new asset kind.
    CreateAsset { asset_id: String, precision: u8 },
    /// Mint `amount` of `asset_id` onto `account_id`.
    AddAssetQuantity {
        account_id: String,
        asset_id: String,
        amount: u64,
    },
    /// Move `amount` of `asset_id` between two accounts.
    TransferAsset {
        src_account_id: String,
        dest_account_id: String,
        asset_id: String,
        amount: u64,
    },
    /// Add a peer to the network membership.
    AddPeer { peer: PeerInfo },
}

impl Command {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Command::CreateAccount { .. } => "CreateAccount",
            Command::CreateAsset { .. } => "CreateAsset",
            Command::AddAssetQuantity { .. } => "AddAssetQuantity",
            Command::TransferAsset { .. } => "TransferAsset",
            Command::AddPeer { .. } => "AddPeer",
        }
    }
}

/// A signed batch of commands from one creator account.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct Transaction {
    pub creator_account_id: String,
    pub commands: Vec<Command>,
    /// Milliseconds since epoch, assigned by the creator.
    pub created_at: u64,
    pub signature: Option<Signature>,
}

impl Transaction {
    pub fn new(creator_account_id: String, commands: Vec<Command>, created_at: u64) -> Self {
        Self {
            creator_account_id,
            commands,
            created_at,
            signature: None,
        }
    }

    /// Sign the transaction payload with the creator's key.
    pub fn signed(mut self, key: &KeyPair) -> Self {
        self.signature = Some(key.sign(&self.payload()));
        self
    }

    /// Hash of the signable payload. Stable across re-signing.
    pub fn hash(&self) -> Hash {
        Hash::from_bytes(&self.payload())
    }

    fn payload(&self) -> Vec<u8> {
        let unsigned = Transaction {
            creator_account_id: self.creator_account_id.clone(),
            commands: self.commands.clone(),
            created_at: self.created_at,
            signature: None,
        };
        sbor::basic_encode(&unsigned).expect("transaction encoding cannot fail")
    }
}
