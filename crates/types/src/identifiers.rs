//! Newtype identifiers.

use sbor::prelude::BasicSbor;
use serde::Serialize;

/// Position of a block in the chain. Height 1 is the genesis block; height 0
/// means "empty chain".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, BasicSbor, Serialize,
)]
pub struct BlockHeight(pub u64);

impl BlockHeight {
    /// The height directly above this one.
    pub fn next(self) -> BlockHeight {
        BlockHeight(self.0 + 1)
    }
}

impl std::fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Index of a peer within the fixed membership of the network.
///
/// The peer set is known and ordered; a `PeerId` resolves to a public key and
/// network address through [`crate::PeerSet`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, BasicSbor, Serialize,
)]
pub struct PeerId(pub u64);

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "peer#{}", self.0)
    }
}
