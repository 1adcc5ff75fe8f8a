//! Checkpoint save/load for resumable generation sessions.
//!
//! A checkpoint holds everything the scheduler needs to continue:
//! - Configuration
//! - Retained corpus and the set of executed sequences
//! - Pending sequences (including any that were in flight)
//! - Global coverage and distinct state digests
//! - Progress counters and the mutator position
//!
//! The sampling RNG is not saved. On resume it is reseeded from the
//! configured seed and the number of recorded executions.

use crate::config::GeneratorConfig;
use crate::corpus::CorpusEntry;
use crate::coverage::CoverageBitmap;
use crate::input::InputSequence;
use serde::{Deserialize, Serialize};
use snafu::Snafu;
use std::fs;
use std::path::Path;

/// Bumped whenever the on-disk layout changes incompatibly.
pub const CHECKPOINT_VERSION: u32 = 1;

/// Errors from checkpoint operations.
#[derive(Debug, Snafu)]
pub enum CheckpointError {
    #[snafu(display("I/O error"), context(false))]
    Io { source: std::io::Error },

    #[snafu(display("JSON error"), context(false))]
    Json { source: serde_json::Error },

    #[snafu(display("unsupported checkpoint version {found} (expected {})", CHECKPOINT_VERSION))]
    Version { found: u32 },
}

/// Progress counters carried across a resume.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCounters {
    pub dispatched: u64,
    pub recorded: u64,
    pub redundant: u64,
    pub unrecognized: u64,
    pub admitted: u64,
    pub sampled_out: u64,
}

/// Complete checkpoint: everything needed to resume generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorationCheckpoint {
    pub config: GeneratorConfig,
    pub corpus: Vec<CorpusEntry>,
    /// Oldest first; restored in the same order so dispatch order survives.
    pub pending: Vec<InputSequence>,
    pub executed: Vec<InputSequence>,
    pub global_coverage: CoverageBitmap,
    pub distinct_states: Vec<String>,
    /// Corpus entries evicted so far.
    pub evicted: u64,
    pub counters: SessionCounters,
    pub mutator_counter: u64,
}

#[derive(Serialize)]
struct VersionedRef<'a> {
    version: u32,
    #[serde(flatten)]
    checkpoint: &'a ExplorationCheckpoint,
}

#[derive(Deserialize)]
struct Versioned {
    version: u32,
    #[serde(flatten)]
    checkpoint: ExplorationCheckpoint,
}

/// Save a checkpoint to a JSON file.
pub fn save_checkpoint<P: AsRef<Path>>(
    path: P,
    checkpoint: &ExplorationCheckpoint,
) -> Result<(), CheckpointError> {
    let json = serde_json::to_string_pretty(&VersionedRef {
        version: CHECKPOINT_VERSION,
        checkpoint,
    })?;
    fs::write(path, json)?;
    Ok(())
}

/// Load a checkpoint from a JSON file.
pub fn load_checkpoint<P: AsRef<Path>>(path: P) -> Result<ExplorationCheckpoint, CheckpointError> {
    let json = fs::read_to_string(path)?;
    let versioned: Versioned = serde_json::from_str(&json)?;
    if versioned.version != CHECKPOINT_VERSION {
        return VersionSnafu {
            found: versioned.version,
        }
        .fail();
    }
    Ok(versioned.checkpoint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Symbol;
    use crate::seed::SeedStrategy;

    fn seq(tag: u8) -> InputSequence {
        vec![Symbol::new(tag); 4].into()
    }

    fn sample_checkpoint() -> ExplorationCheckpoint {
        ExplorationCheckpoint {
            config: GeneratorConfig {
                sequence_length: 4,
                seed: 123,
                seeding: SeedStrategy::Random { count: 10 },
                ..Default::default()
            },
            corpus: vec![CorpusEntry {
                id: 0,
                sequence: seq(1),
                coverage: CoverageBitmap::from_ids([3, 70]),
                state_digest: "ab".repeat(32),
                new_locations: 2,
            }],
            pending: vec![seq(2), seq(3)],
            executed: vec![seq(1)],
            global_coverage: CoverageBitmap::from_ids([3, 70]),
            distinct_states: vec!["ab".repeat(32)],
            evicted: 0,
            counters: SessionCounters {
                dispatched: 2,
                recorded: 1,
                admitted: 5,
                ..Default::default()
            },
            mutator_counter: 32,
        }
    }

    #[test]
    fn test_checkpoint_roundtrip() {
        let checkpoint = sample_checkpoint();
        let json = serde_json::to_string(&checkpoint).unwrap();
        let roundtrip: ExplorationCheckpoint = serde_json::from_str(&json).unwrap();

        assert_eq!(checkpoint.config, roundtrip.config);
        assert_eq!(checkpoint.corpus, roundtrip.corpus);
        assert_eq!(checkpoint.pending, roundtrip.pending);
        assert_eq!(checkpoint.counters, roundtrip.counters);
        assert_eq!(checkpoint.global_coverage, roundtrip.global_coverage);
    }

    #[test]
    fn test_save_load_checkpoint() {
        let path = std::env::temp_dir().join(format!(
            "tinycov_checkpoint_{}.json",
            std::process::id()
        ));

        let checkpoint = sample_checkpoint();
        save_checkpoint(&path, &checkpoint).unwrap();
        let loaded = load_checkpoint(&path).unwrap();

        assert_eq!(checkpoint.config, loaded.config);
        assert_eq!(checkpoint.executed, loaded.executed);
        assert_eq!(checkpoint.mutator_counter, loaded.mutator_counter);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_rejects_other_version() {
        let path = std::env::temp_dir().join(format!(
            "tinycov_checkpoint_version_{}.json",
            std::process::id()
        ));

        let mut value = serde_json::to_value(VersionedRef {
            version: CHECKPOINT_VERSION,
            checkpoint: &sample_checkpoint(),
        })
        .unwrap();
        value["version"] = serde_json::json!(99);
        fs::write(&path, value.to_string()).unwrap();

        let err = load_checkpoint(&path).unwrap_err();
        assert!(matches!(err, CheckpointError::Version { found: 99 }));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_checkpoint("/nonexistent/tinycov/checkpoint.json").unwrap_err();
        assert!(matches!(err, CheckpointError::Io { .. }));
    }
}
