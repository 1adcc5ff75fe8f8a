//! Sequence mutation: generates successor sequences from a parent.
//!
//! Every variant keeps the fixed sequence length and stays inside the
//! alphabet. The parent is never modified; each variant is built in a
//! scratch buffer and frozen into a new [`InputSequence`].

use crate::config::ConfigError;
use crate::input::{ControlAlphabet, InputSequence, Symbol};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Relative weights of each mutation operator, plus how many operators to
/// stack per variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationConfig {
    /// Replace one symbol with a different one.
    pub substitute_prob: f64,
    /// Insert a symbol and drop the last one.
    pub insert_prob: f64,
    /// Delete a symbol and append a random one.
    pub delete_prob: f64,
    /// Keep a random prefix and randomize the rest.
    pub regenerate_prob: f64,
    /// Parent prefix joined to a retained donor's suffix.
    pub splice_prob: f64,
    /// Upper bound on stacked operators per variant (at least 1).
    pub max_mutations: usize,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            substitute_prob: 0.35,
            insert_prob: 0.15,
            delete_prob: 0.15,
            regenerate_prob: 0.15,
            splice_prob: 0.2,
            max_mutations: 3,
        }
    }
}

impl MutationConfig {
    fn weights(&self) -> [f64; 5] {
        [
            self.substitute_prob,
            self.insert_prob,
            self.delete_prob,
            self.regenerate_prob,
            self.splice_prob,
        ]
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = self.weights();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ConfigError::Invalid(
                "mutation weights must be finite and non-negative".into(),
            ));
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err(ConfigError::Invalid(
                "at least one mutation weight must be positive".into(),
            ));
        }
        if self.max_mutations == 0 {
            return Err(ConfigError::Invalid("max_mutations must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MutationOp {
    Substitute,
    Insert,
    Delete,
    RegenerateSuffix,
    Splice,
}

const OPS: [MutationOp; 5] = [
    MutationOp::Substitute,
    MutationOp::Insert,
    MutationOp::Delete,
    MutationOp::RegenerateSuffix,
    MutationOp::Splice,
];

/// Generates variant sequences from a base sequence.
pub struct SequenceMutator {
    /// Master seed for deterministic mutation.
    seed: u64,
    /// Counter for generating unique child seeds.
    counter: u64,
}

impl SequenceMutator {
    pub fn new(seed: u64) -> Self {
        Self { seed, counter: 0 }
    }

    /// Resume a mutator at a known counter (used when restoring a session).
    pub fn with_counter(seed: u64, counter: u64) -> Self {
        Self { seed, counter }
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Generate `n` variants of `base`.
    ///
    /// `donors` are other retained sequences available for splicing. Variants
    /// are deterministic given the seed and counter; duplicates among them
    /// are possible and left to the caller.
    pub fn mutate(
        &mut self,
        base: &InputSequence,
        n: usize,
        donors: &[&InputSequence],
        alphabet: &ControlAlphabet,
        config: &MutationConfig,
    ) -> Vec<InputSequence> {
        (0..n)
            .map(|_| self.mutate_once(base, donors, alphabet, config))
            .collect()
    }

    fn mutate_once(
        &mut self,
        base: &InputSequence,
        donors: &[&InputSequence],
        alphabet: &ControlAlphabet,
        config: &MutationConfig,
    ) -> InputSequence {
        let child_seed = self.seed.wrapping_add(self.counter);
        self.counter += 1;
        let mut rng = ChaCha8Rng::seed_from_u64(child_seed);

        let mut symbols = base.symbols().to_vec();
        if symbols.is_empty() || alphabet.is_empty() {
            return base.clone();
        }

        let num_mutations = rng.gen_range(1..=config.max_mutations.max(1));
        for _ in 0..num_mutations {
            match pick_op(config, &mut rng) {
                Some(MutationOp::Substitute) | None => substitute(&mut symbols, alphabet, &mut rng),
                Some(MutationOp::Insert) => insert(&mut symbols, alphabet, &mut rng),
                Some(MutationOp::Delete) => delete(&mut symbols, alphabet, &mut rng),
                Some(MutationOp::RegenerateSuffix) => {
                    regenerate_suffix(&mut symbols, alphabet, &mut rng)
                }
                Some(MutationOp::Splice) => splice(&mut symbols, base, donors, alphabet, &mut rng),
            }
        }

        // Stacked operators can cancel out; a variant must differ from its parent.
        if symbols.as_slice() == base.symbols() && alphabet.len() >= 2 {
            substitute(&mut symbols, alphabet, &mut rng);
        }

        InputSequence::from(symbols)
    }
}

/// Roulette-wheel choice over the configured weights.
fn pick_op(config: &MutationConfig, rng: &mut ChaCha8Rng) -> Option<MutationOp> {
    let weights = config.weights();
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return None;
    }
    let mut roll = rng.gen::<f64>() * total;
    for (op, weight) in OPS.iter().zip(weights.iter()) {
        if roll < *weight {
            return Some(*op);
        }
        roll -= weight;
    }
    // Rounding can leave a sliver past the last bucket.
    OPS.iter()
        .zip(weights.iter())
        .rev()
        .find(|(_, w)| **w > 0.0)
        .map(|(op, _)| *op)
}

/// Operator 1: replace one position with a different symbol.
fn substitute(symbols: &mut [Symbol], alphabet: &ControlAlphabet, rng: &mut ChaCha8Rng) {
    let pos = rng.gen_range(0..symbols.len());
    symbols[pos] = alphabet.random_other(symbols[pos], rng);
}

/// Operator 2: insert a random symbol, shifting the tail right and dropping
/// the last symbol.
fn insert(symbols: &mut Vec<Symbol>, alphabet: &ControlAlphabet, rng: &mut ChaCha8Rng) {
    let pos = rng.gen_range(0..symbols.len());
    symbols.insert(pos, alphabet.random_symbol(rng));
    symbols.pop();
}

/// Operator 3: delete one symbol, shifting the tail left and appending a
/// random symbol.
fn delete(symbols: &mut Vec<Symbol>, alphabet: &ControlAlphabet, rng: &mut ChaCha8Rng) {
    let pos = rng.gen_range(0..symbols.len());
    symbols.remove(pos);
    symbols.push(alphabet.random_symbol(rng));
}

/// Operator 4: truncate at a random cut and extend back to full length with
/// random symbols.
fn regenerate_suffix(symbols: &mut [Symbol], alphabet: &ControlAlphabet, rng: &mut ChaCha8Rng) {
    let cut = rng.gen_range(0..symbols.len());
    for symbol in &mut symbols[cut..] {
        *symbol = alphabet.random_symbol(rng);
    }
}

/// Operator 5: keep the parent's prefix and take the suffix from a donor.
///
/// Falls back to substitution when no donor of the same length differs from
/// the parent.
fn splice(
    symbols: &mut [Symbol],
    base: &InputSequence,
    donors: &[&InputSequence],
    alphabet: &ControlAlphabet,
    rng: &mut ChaCha8Rng,
) {
    let usable: Vec<&InputSequence> = donors
        .iter()
        .copied()
        .filter(|d| d.len() == symbols.len() && *d != base)
        .collect();

    let Some(donor) = usable.choose(rng) else {
        substitute(symbols, alphabet, rng);
        return;
    };

    let cut = rng.gen_range(0..symbols.len());
    symbols[cut..].copy_from_slice(&donor.symbols()[cut..]);
}
