//! Supermajority arithmetic.

/// True if `current` votes out of `total` peers form a supermajority
/// (strictly more than 2/3). With `total = 3f + 1` this is `2f + 1`.
pub fn has_supermajority(current: usize, total: usize) -> bool {
    current * 3 > total * 2
}

/// True if the round can be proven unwinnable.
///
/// `max_vote_count` is the tally of the most popular hash and `voted` the
/// number of distinct peers that have voted so far. Even if every silent
/// peer joined the leading hash, the total would still miss supermajority.
pub fn reject_proved(max_vote_count: usize, voted: usize, total: usize) -> bool {
    let missing = total.saturating_sub(voted);
    !has_supermajority(max_vote_count + missing, total)
}
