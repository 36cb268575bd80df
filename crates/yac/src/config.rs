//! YAC configuration.

use std::time::Duration;

/// Tunables for the consensus gate.
#[derive(Debug, Clone)]
pub struct YacConfig {
    /// How often our vote is re-broadcast while the round stays open.
    pub vote_retry_interval: Duration,

    /// After this many fruitless retries the round is abandoned with
    /// `AgreementOnNone`. `None` retries forever (logging each attempt),
    /// which is the production default: a stalled round is a liveness
    /// problem, not a reason to give up the chain position.
    pub abandon_after_retries: Option<u32>,
}

impl Default for YacConfig {
    fn default() -> Self {
        Self {
            vote_retry_interval: Duration::from_secs(2),
            abandon_after_retries: None,
        }
    }
}
