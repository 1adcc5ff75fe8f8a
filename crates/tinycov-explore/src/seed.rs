//! Seed enumeration: the initial worklist population.
//!
//! The full space of sequences is the Cartesian power `A^L` of the alphabet,
//! which grows exponentially with the sequence length. Seeding is therefore
//! pluggable: [`SeedStrategy::Exhaustive`] enumerates everything,
//! [`SeedStrategy::Random`] draws a bounded set of distinct sequences, and
//! [`SeedStrategy::Auto`] picks between them by space size.

use crate::config::ConfigError;
use crate::input::{ControlAlphabet, InputSequence, Symbol};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Largest seed pool any strategy may materialize.
pub const MAX_SEED_POOL: u64 = 1 << 24;

/// How the worklist is populated at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SeedStrategy {
    /// Every sequence of the configured length.
    Exhaustive,
    /// `count` distinct uniformly random sequences (all of them if the space
    /// is smaller).
    Random { count: usize },
    /// Exhaustive when `A^L <= max_exhaustive`, otherwise random.
    Auto {
        max_exhaustive: u64,
        random_count: usize,
    },
}

impl Default for SeedStrategy {
    fn default() -> Self {
        SeedStrategy::Auto {
            max_exhaustive: 4096,
            random_count: 1024,
        }
    }
}

impl SeedStrategy {
    /// Reject strategies that cannot produce a bounded, non-empty seed set.
    pub fn validate(&self, alphabet_size: usize, length: usize) -> Result<(), ConfigError> {
        match *self {
            SeedStrategy::Exhaustive => match space_size(alphabet_size, length) {
                Some(size) if size <= MAX_SEED_POOL => {}
                _ => {
                    return Err(ConfigError::SeedSpaceTooLarge {
                        alphabet_size,
                        length,
                    })
                }
            },
            SeedStrategy::Random { count }
            | SeedStrategy::Auto {
                random_count: count,
                ..
            } => check_random_count(count)?,
        }
        Ok(())
    }

    /// Produce the seed sequences for `alphabet` at the given length.
    ///
    /// Must only be called with a validated configuration.
    pub fn seed(
        &self,
        alphabet: &ControlAlphabet,
        length: usize,
        rng: &mut impl Rng,
    ) -> Vec<InputSequence> {
        let space = space_size(alphabet.len(), length);
        match *self {
            SeedStrategy::Exhaustive => {
                ExhaustiveSequences::new(alphabet.len(), length).collect()
            }
            SeedStrategy::Random { count } => random_seeds(alphabet, length, count, space, rng),
            SeedStrategy::Auto {
                max_exhaustive,
                random_count,
            } => match space {
                Some(size) if size <= max_exhaustive.min(MAX_SEED_POOL) => {
                    ExhaustiveSequences::new(alphabet.len(), length).collect()
                }
                _ => random_seeds(alphabet, length, random_count, space, rng),
            },
        }
    }
}

fn check_random_count(count: usize) -> Result<(), ConfigError> {
    if count == 0 {
        return Err(ConfigError::Invalid("random seed count must be positive".into()));
    }
    if count as u64 > MAX_SEED_POOL {
        return Err(ConfigError::Invalid(format!(
            "random seed count {} exceeds the limit of {}",
            count, MAX_SEED_POOL
        )));
    }
    Ok(())
}

/// Number of distinct sequences, `A^L`, or `None` if it overflows a `u64`.
pub fn space_size(alphabet_size: usize, length: usize) -> Option<u64> {
    let exp = u32::try_from(length).ok()?;
    (alphabet_size as u64).checked_pow(exp)
}

fn random_seeds(
    alphabet: &ControlAlphabet,
    length: usize,
    count: usize,
    space: Option<u64>,
    rng: &mut impl Rng,
) -> Vec<InputSequence> {
    if let Some(size) = space {
        if size <= count as u64 {
            return ExhaustiveSequences::new(alphabet.len(), length).collect();
        }
    }

    let mut seen = BTreeSet::new();
    let mut seeds = Vec::with_capacity(count);
    while seeds.len() < count {
        let candidate = InputSequence::random(alphabet, length, rng);
        if seen.insert(candidate.clone()) {
            seeds.push(candidate);
        }
    }
    log::debug!("Drew {} random seeds of length {}", seeds.len(), length);
    seeds
}

/// Iterator over every sequence of `length` symbols from an alphabet of
/// `alphabet_size`, in lexicographic order.
pub struct ExhaustiveSequences {
    alphabet_size: usize,
    digits: Vec<u8>,
    done: bool,
}

impl ExhaustiveSequences {
    pub fn new(alphabet_size: usize, length: usize) -> Self {
        let alphabet_size = alphabet_size.min(ControlAlphabet::MAX_SYMBOLS);
        Self {
            alphabet_size,
            digits: vec![0; length],
            // No symbols means no sequences of positive length.
            done: alphabet_size == 0 && length > 0,
        }
    }
}

impl Iterator for ExhaustiveSequences {
    type Item = InputSequence;

    fn next(&mut self) -> Option<InputSequence> {
        if self.done {
            return None;
        }
        let current: InputSequence = self.digits.iter().map(|&d| Symbol::new(d)).collect();

        // Odometer increment, rightmost digit fastest.
        self.done = true;
        for digit in self.digits.iter_mut().rev() {
            if (*digit as usize) + 1 < self.alphabet_size {
                *digit += 1;
                self.done = false;
                break;
            }
            *digit = 0;
        }

        Some(current)
    }
}
