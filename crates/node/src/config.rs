//! Node configuration.

use concordia_sync::SyncConfig;
use concordia_types::{PeerId, PeerSet};
use concordia_yac::YacConfig;

/// Everything a node needs to participate in consensus.
///
/// Plain data with explicit defaults; loading it from files or flags is the
/// embedder's concern.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Our identity within the peer set.
    pub local_peer: PeerId,
    /// The fixed network membership.
    pub peers: PeerSet,
    pub yac: YacConfig,
    pub sync: SyncConfig,
}

impl NodeConfig {
    pub fn new(local_peer: PeerId, peers: PeerSet) -> Self {
        Self {
            local_peer,
            peers,
            yac: YacConfig::default(),
            sync: SyncConfig::default(),
        }
    }
}
