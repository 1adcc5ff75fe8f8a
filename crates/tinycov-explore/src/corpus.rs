//! Corpus: the retained sequences whose coverage is not explained by any
//! other retained sequence.
//!
//! Admission applies the subsumption relation in both directions: a record
//! subsumed by a retained entry is redundant, and retained entries subsumed
//! by a newly admitted record are evicted. The retained set is therefore an
//! antichain under subset order. Equal bitmaps subsume each other; the
//! earlier-seen entry wins.

use crate::coverage::{subsumed_by, CoverageBitmap, CoverageRecord};
use crate::input::InputSequence;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A retained sequence together with the coverage that justified keeping it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusEntry {
    /// Unique entry ID, assigned on admission.
    pub id: u64,
    pub sequence: InputSequence,
    pub coverage: CoverageBitmap,
    /// Digest of the terminal state snapshot.
    pub state_digest: String,
    /// Locations this entry reached first, globally.
    pub new_locations: usize,
}

/// Outcome of [`Corpus::admit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Coverage already explained by the retained entry `subsumed_by`.
    Redundant { subsumed_by: u64 },
    /// Kept as entry `id`; `evicted` lists entries it strictly subsumes.
    Retained { id: u64, evicted: Vec<u64> },
}

impl Admission {
    pub fn is_retained(&self) -> bool {
        matches!(self, Admission::Retained { .. })
    }
}

pub struct Corpus {
    entries: Vec<CorpusEntry>,
    /// Digests of every terminal state seen, retained or not.
    distinct_states: BTreeSet<String>,
    next_id: u64,
    evicted: u64,
}

impl Corpus {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            distinct_states: BTreeSet::new(),
            next_id: 0,
            evicted: 0,
        }
    }

    /// Rebuild a corpus from saved entries.
    pub fn restore(
        entries: Vec<CorpusEntry>,
        distinct_states: BTreeSet<String>,
        evicted: u64,
    ) -> Self {
        let next_id = entries.iter().map(|e| e.id + 1).max().unwrap_or(0);
        Self {
            entries,
            distinct_states,
            next_id,
            evicted,
        }
    }

    /// Decide whether `record` adds coverage and retain it if so.
    ///
    /// `new_locations` is the number of locations the record reached for the
    /// first time, as measured by the caller against global coverage.
    pub fn admit(&mut self, record: CoverageRecord, new_locations: usize) -> Admission {
        let state_digest = record.state.digest();
        self.distinct_states.insert(state_digest.clone());

        if let Some(existing) = self.find_subsuming(&record.coverage) {
            return Admission::Redundant {
                subsumed_by: existing.id,
            };
        }

        let mut evicted = Vec::new();
        self.entries.retain(|entry| {
            if subsumed_by(&entry.coverage, &record.coverage) {
                evicted.push(entry.id);
                false
            } else {
                true
            }
        });
        self.evicted += evicted.len() as u64;
        if !evicted.is_empty() {
            log::debug!("Corpus evicted {} subsumed entries", evicted.len());
        }

        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(CorpusEntry {
            id,
            sequence: record.sequence,
            coverage: record.coverage,
            state_digest,
            new_locations,
        });

        Admission::Retained { id, evicted }
    }

    /// The earliest retained entry whose coverage subsumes `coverage`.
    pub fn find_subsuming(&self, coverage: &CoverageBitmap) -> Option<&CorpusEntry> {
        self.entries
            .iter()
            .find(|entry| subsumed_by(coverage, &entry.coverage))
    }

    pub fn get(&self, id: u64) -> Option<&CorpusEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Retained sequences, oldest first.
    pub fn sequences(&self) -> Vec<&InputSequence> {
        self.entries.iter().map(|e| &e.sequence).collect()
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    pub fn distinct_states(&self) -> &BTreeSet<String> {
        &self.distinct_states
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CorpusStats {
        CorpusStats {
            retained: self.entries.len(),
            evicted: self.evicted,
            distinct_states: self.distinct_states.len(),
        }
    }
}

impl Default for Corpus {
    fn default() -> Self {
        Self::new()
    }
}

/// Corpus statistics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorpusStats {
    /// Entries currently retained.
    pub retained: usize,
    /// Entries dropped because a later record subsumed them.
    pub evicted: u64,
    /// Distinct terminal states observed.
    pub distinct_states: usize,
}
