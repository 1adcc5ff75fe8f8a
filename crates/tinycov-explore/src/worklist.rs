//! Worklist: the pool of pending, not-yet-executed sequences.

use crate::input::InputSequence;
use crate::sampling;
use rand::Rng;
use std::collections::BTreeSet;

/// Pending sequences, dispatched most-recently-added first.
///
/// A membership index mirrors the stack so duplicate admissions are
/// rejected in logarithmic time.
#[derive(Debug, Default)]
pub struct Worklist {
    stack: Vec<InputSequence>,
    members: BTreeSet<InputSequence>,
}

impl Worklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a worklist from `sequences`, skipping duplicates.
    pub fn from_sequences<I: IntoIterator<Item = InputSequence>>(sequences: I) -> Self {
        let mut worklist = Self::new();
        for sequence in sequences {
            worklist.push(sequence);
        }
        worklist
    }

    /// Add a sequence. Returns `false` (and drops it) if already pending.
    pub fn push(&mut self, sequence: InputSequence) -> bool {
        if !self.members.insert(sequence.clone()) {
            return false;
        }
        self.stack.push(sequence);
        true
    }

    /// Remove and return the most recently added sequence.
    pub fn pop(&mut self) -> Option<InputSequence> {
        let sequence = self.stack.pop()?;
        self.members.remove(&sequence);
        Some(sequence)
    }

    pub fn contains(&self, sequence: &InputSequence) -> bool {
        self.members.contains(sequence)
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Pending sequences in dispatch order reversed (oldest first).
    pub fn iter(&self) -> impl Iterator<Item = &InputSequence> + '_ {
        self.stack.iter()
    }

    /// Shrink to at most `n` pending sequences by uniform random sampling.
    ///
    /// Returns the number of sequences discarded. Relative order of the
    /// survivors is not preserved.
    pub fn reduce_to(&mut self, n: usize, rng: &mut impl Rng) -> usize {
        let before = self.stack.len();
        if before <= n {
            return 0;
        }
        sampling::random_sample(&mut self.stack, n, rng);
        self.members = self.stack.iter().cloned().collect();
        before - self.stack.len()
    }
}
