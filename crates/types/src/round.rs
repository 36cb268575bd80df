//! Consensus round identifier.

use sbor::prelude::BasicSbor;
use serde::Serialize;

/// Identifies one consensus attempt.
///
/// `block_round` advances when a block is committed; `reject_round` advances
/// when the peers fail to agree and retry at the same chain position. The
/// derived ordering is lexicographic over `(block_round, reject_round)`,
/// which is the total order consensus progress follows.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, BasicSbor, Serialize,
)]
pub struct Round {
    pub block_round: u64,
    pub reject_round: u64,
}

impl Round {
    pub fn new(block_round: u64, reject_round: u64) -> Self {
        Self {
            block_round,
            reject_round,
        }
    }

    /// The round retried after a reject: same chain position, next attempt.
    pub fn next_reject(self) -> Round {
        Round {
            block_round: self.block_round,
            reject_round: self.reject_round + 1,
        }
    }

    /// The round following a successful commit.
    pub fn next_block(self) -> Round {
        Round {
            block_round: self.block_round + 1,
            reject_round: 0,
        }
    }
}

impl std::fmt::Display for Round {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.block_round, self.reject_round)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_is_lexicographic() {
        assert!(Round::new(1, 5) < Round::new(2, 0));
        assert!(Round::new(2, 0) < Round::new(2, 1));
        assert!(Round::new(3, 0) > Round::new(2, 9));
    }

    #[test]
    fn test_advancement() {
        let r = Round::new(5, 2);
        assert_eq!(r.next_reject(), Round::new(5, 3));
        assert_eq!(r.next_block(), Round::new(6, 0));
    }
}
