//! Uniform random reduction of candidate pools.
//!
//! Used wherever growth must be bounded: mutant batches, and the pending pool
//! when admission would push it past its ceiling.

use rand::seq::SliceRandom;
use rand::Rng;

/// Reduce `candidates` to `min(n, len)` elements chosen uniformly at random
/// without replacement. Unselected candidates are dropped. The order of the
/// result is unspecified.
pub fn reduce<T>(mut candidates: Vec<T>, n: usize, rng: &mut impl Rng) -> Vec<T> {
    random_sample(&mut candidates, n, rng);
    candidates
}

/// In-place form of [`reduce`]: shuffle, then drop from the back until only
/// `n` remain.
pub fn random_sample<T>(inputs: &mut Vec<T>, n: usize, rng: &mut impl Rng) {
    if n >= inputs.len() {
        return;
    }
    inputs.shuffle(rng);
    inputs.truncate(n);
}
