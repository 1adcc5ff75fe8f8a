//! Coverage-guided input generation for the TinyBoy VM.
//!
//! This crate produces fixed-length sequences of control-pad inputs, learns
//! from the coverage and final state each sequence produces, and steers the
//! search toward sequences that reach new program locations.
//!
//! # Architecture
//!
//! The generator is a worklist search driven by an external harness:
//!
//! ```text
//! 1. Seed the worklist with candidate sequences
//! 2. Harness: has_more()? → generate() → run on target → record()
//! 3. record() compares coverage against the retained corpus:
//!    - subsumed by a retained bitmap → discard
//!    - otherwise → retain, mutate into successors, push them
//! 4. Pool ceiling keeps the worklist bounded by random resampling
//! 5. Repeat until the worklist is empty or the budget is spent
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use tinycov_explore::demo::MazeTarget;
//! use tinycov_explore::report::{format_report, ExplorationReport};
//! use tinycov_explore::{AutomatedTester, GeneratorConfig, TesterConfig, WorklistScheduler};
//!
//! let config = GeneratorConfig {
//!     sequence_length: 16,
//!     seed: 42,
//!     ..Default::default()
//! };
//! let scheduler = WorklistScheduler::new(config).unwrap();
//!
//! let mut tester = AutomatedTester::new(scheduler, MazeTarget::new(), TesterConfig::default());
//! let summary = tester.run();
//!
//! let report = ExplorationReport::new(&summary, tester.generator());
//! println!("{}", format_report(&report));
//! ```
//!
//! # Module Structure
//!
//! - [`input`]: Symbols, the control alphabet, and input sequences
//! - [`coverage`]: Coverage bitmaps, subsumption, and state snapshots
//! - [`seed`]: Initial worklist population
//! - [`mutator`]: Generates successor sequences from a retained parent
//! - [`corpus`]: Retained sequences forming a coverage antichain
//! - [`worklist`]: Pending sequences, most recent first
//! - [`scheduler`]: The worklist scheduler itself
//! - [`tester`]: Generator/target traits and the driver loop
//! - [`checkpoint`]: Save and resume sessions
//! - [`report`]: Session reports
//! - [`demo`]: A small maze target
//!
//! # Determinism
//!
//! Generation is deterministic given the same seed and the same feedback.
//! Seeded RNGs are used throughout, and ordered collections (`BTreeSet`)
//! stand in for hashed ones.

pub mod checkpoint;
pub mod config;
pub mod corpus;
pub mod coverage;
pub mod demo;
pub mod input;
pub mod mutator;
pub mod report;
pub mod sampling;
pub mod scheduler;
pub mod seed;
pub mod tester;
pub mod worklist;

// Re-export main types for convenience
pub use checkpoint::{load_checkpoint, save_checkpoint, CheckpointError, ExplorationCheckpoint};
pub use config::{ConfigError, GeneratorConfig};
pub use corpus::{Admission, Corpus, CorpusEntry, CorpusStats};
pub use coverage::{
    subsumed_by, CoverageBitmap, CoverageCollector, CoverageRecord, CoverageStats, StateSnapshot,
};
pub use input::{Button, ControlAlphabet, InputSequence, Symbol};
pub use mutator::{MutationConfig, SequenceMutator};
pub use scheduler::{SchedulerStats, WorklistScheduler};
pub use seed::SeedStrategy;
pub use tester::{
    AutomatedTester, Execution, InputGenerator, StopReason, Target, TesterConfig, TesterReport,
};
pub use worklist::Worklist;
