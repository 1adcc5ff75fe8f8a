//! Coverage bitmaps, state snapshots and the subsumption relation.
//!
//! A [`CoverageBitmap`] is a compact set of program-location IDs reached by
//! one run. The target produces it fresh per run; the generator only reads
//! it, merges it into the global union, and compares it against retained
//! bitmaps with [`subsumed_by`].

use crate::input::InputSequence;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const WORD_BITS: usize = 64;

/// Set of covered location IDs, one bit per ID.
///
/// Invariant: `words` never ends in a zero word, so structural equality is
/// set equality. IDs are opaque; the universe size is never assumed and the
/// word vector grows on demand.
///
/// Storage is dense: a bitmap costs `max_id / 8` bytes regardless of how
/// many IDs it holds, and every clone pays that again. Targets should number
/// their locations compactly from zero; an ID near `u32::MAX` costs 512 MiB.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<u32>", into = "Vec<u32>")]
pub struct CoverageBitmap {
    words: Vec<u64>,
}

impl CoverageBitmap {
    pub fn new() -> Self {
        Self { words: Vec::new() }
    }

    /// Build a bitmap from location IDs (duplicates are fine).
    pub fn from_ids<I: IntoIterator<Item = u32>>(ids: I) -> Self {
        let mut bitmap = Self::new();
        for id in ids {
            bitmap.insert(id);
        }
        bitmap
    }

    /// Mark a location as covered.
    pub fn insert(&mut self, id: u32) {
        let (word, bit) = Self::position(id);
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1 << bit;
    }

    pub fn contains(&self, id: u32) -> bool {
        let (word, bit) = Self::position(id);
        self.words
            .get(word)
            .map_or(false, |w| w & (1 << bit) != 0)
    }

    /// Reset to the empty set.
    pub fn clear(&mut self) {
        self.words.clear();
    }

    /// Number of covered locations.
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Union `other` into this bitmap.
    pub fn merge(&mut self, other: &CoverageBitmap) {
        if other.words.len() > self.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        for (mine, theirs) in self.words.iter_mut().zip(other.words.iter()) {
            *mine |= theirs;
        }
    }

    /// Number of locations in this bitmap that are absent from `global`.
    pub fn has_new_coverage(&self, global: &CoverageBitmap) -> usize {
        self.words
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let known = global.words.get(i).copied().unwrap_or(0);
                (w & !known).count_ones() as usize
            })
            .sum()
    }

    /// True iff every location in `self` is also in `rhs`.
    pub fn is_subset_of(&self, rhs: &CoverageBitmap) -> bool {
        self.words.iter().enumerate().all(|(i, w)| {
            let theirs = rhs.words.get(i).copied().unwrap_or(0);
            w & !theirs == 0
        })
    }

    /// Covered location IDs in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &word)| {
            let base = (i * WORD_BITS) as u32;
            BitIter(word).map(move |bit| base + bit)
        })
    }

    fn position(id: u32) -> (usize, u32) {
        (id as usize / WORD_BITS, id % WORD_BITS as u32)
    }
}

impl From<Vec<u32>> for CoverageBitmap {
    fn from(ids: Vec<u32>) -> Self {
        Self::from_ids(ids)
    }
}

impl From<CoverageBitmap> for Vec<u32> {
    fn from(bitmap: CoverageBitmap) -> Self {
        bitmap.iter().collect()
    }
}

impl FromIterator<u32> for CoverageBitmap {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self::from_ids(iter)
    }
}

/// Iterates the set bit positions of one word, lowest first.
struct BitIter(u64);

impl Iterator for BitIter {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.0 == 0 {
            return None;
        }
        let bit = self.0.trailing_zeros();
        self.0 &= self.0 - 1;
        Some(bit)
    }
}

/// Check whether the coverage `lhs` is completely subsumed by `rhs`.
///
/// True iff `lhs` is a subset of `rhs`; vacuously true for an empty `lhs`.
/// Reflexive and transitive, so equal bitmaps subsume each other and the
/// caller must break the tie.
pub fn subsumed_by(lhs: &CoverageBitmap, rhs: &CoverageBitmap) -> bool {
    lhs.is_subset_of(rhs)
}

/// Opaque terminal memory image of the target for one run.
///
/// Never interpreted; only digested for grouping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateSnapshot(Vec<u8>);

impl StateSnapshot {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Stable hexadecimal SHA-256 digest of the snapshot bytes.
    pub fn digest(&self) -> String {
        format!("{:x}", Sha256::digest(&self.0))
    }
}

impl From<Vec<u8>> for StateSnapshot {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Feedback for one executed sequence.
#[derive(Debug, Clone)]
pub struct CoverageRecord {
    pub sequence: InputSequence,
    pub coverage: CoverageBitmap,
    pub state: StateSnapshot,
}

/// Accumulates the union of coverage over every recorded run.
pub struct CoverageCollector {
    global_coverage: CoverageBitmap,
    total_runs: u64,
}

impl CoverageCollector {
    pub fn new() -> Self {
        Self {
            global_coverage: CoverageBitmap::new(),
            total_runs: 0,
        }
    }

    /// Fold one run's bitmap into the global union.
    ///
    /// Returns the number of locations seen for the first time.
    pub fn update_global(&mut self, bitmap: &CoverageBitmap) -> usize {
        self.total_runs += 1;
        let new_locations = bitmap.has_new_coverage(&self.global_coverage);
        if new_locations > 0 {
            self.global_coverage.merge(bitmap);
            log::info!(
                "New coverage: {} locations (total: {})",
                new_locations,
                self.global_coverage.count()
            );
        }
        new_locations
    }

    /// Restore a previously saved union without counting it as a run.
    pub fn restore(&mut self, global: CoverageBitmap, total_runs: u64) {
        self.global_coverage = global;
        self.total_runs = total_runs;
    }

    pub fn stats(&self) -> CoverageStats {
        let total_locations = self.global_coverage.count();
        CoverageStats {
            total_locations,
            total_runs: self.total_runs,
            locations_per_run_avg: if self.total_runs > 0 {
                total_locations as f64 / self.total_runs as f64
            } else {
                0.0
            },
        }
    }

    pub fn global_coverage(&self) -> &CoverageBitmap {
        &self.global_coverage
    }
}

impl Default for CoverageCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Coverage statistics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageStats {
    pub total_locations: usize,
    pub total_runs: u64,
    pub locations_per_run_avg: f64,
}
