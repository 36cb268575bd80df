//! Outbound message types for network communication.

use concordia_messages::VoteBundleGossip;

/// Outbound network messages.
///
/// These are the messages a node can send to other nodes. The runner handles
/// the actual network I/O; block-loader requests are not listed here because
/// they are request-response fetches driven by `Action::FetchChain`.
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    /// A vote bundle: a single voting step, or a full commit/reject
    /// certificate being propagated (including directly to a late voter).
    VoteBundle(VoteBundleGossip),
}

impl OutboundMessage {
    /// Get a human-readable name for this message type.
    pub fn type_name(&self) -> &'static str {
        match self {
            OutboundMessage::VoteBundle(_) => "VoteBundle",
        }
    }
}
