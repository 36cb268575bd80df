//! Transport-level validation errors.

/// Rejection of a message before it reaches any state machine.
///
/// A transport error has no side effect on consensus state: the message is
/// dropped and the error is returned to the sender's RPC layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// A vote bundle carried no votes.
    #[error("vote bundle is empty")]
    EmptyBundle,

    /// Votes inside one bundle referenced different rounds.
    #[error("vote bundle mixes rounds: {0} and {1}")]
    InconsistentRounds(concordia_types::Round, concordia_types::Round),

    /// A bundle carried more votes than the network has peers.
    #[error("vote bundle has {votes} votes but the network has {peers} peers")]
    OversizedBundle { votes: usize, peers: usize },

    /// Payload bytes did not decode.
    #[error("undecodable message payload: {0}")]
    Undecodable(String),
}
