//! The automated-tester protocol: generate, execute, record.
//!
//! [`InputGenerator`] is the capability a generator offers its driver;
//! [`Target`] is the system under test. [`AutomatedTester`] wires the two
//! together and runs until the generator is exhausted or a budget is spent.

use crate::coverage::{CoverageBitmap, CoverageCollector, CoverageStats, StateSnapshot};
use log::{debug, info};

/// A source of test inputs that learns from execution feedback.
///
/// Callers must check [`has_more`](Self::has_more) before each
/// [`generate`](Self::generate), and report every generated input back
/// through [`record`](Self::record) before generating the next.
pub trait InputGenerator {
    type Input;

    /// True while there are inputs left to hand out.
    fn has_more(&self) -> bool;

    /// Remove and return the next input, or `None` once exhausted.
    fn generate(&mut self) -> Option<Self::Input>;

    /// Feedback for an executed input: the covered locations and the
    /// terminal state. Unrecognized inputs are ignored.
    fn record(&mut self, input: Self::Input, coverage: CoverageBitmap, state: StateSnapshot);
}

/// Result of executing one input on a target.
#[derive(Debug, Clone, Default)]
pub struct Execution {
    pub coverage: CoverageBitmap,
    pub state: StateSnapshot,
}

/// A deterministic system that can run an input and report what it did.
pub trait Target {
    type Input;

    fn execute(&mut self, input: &Self::Input) -> Execution;
}

/// Driver settings.
#[derive(Debug, Clone)]
pub struct TesterConfig {
    /// Stop after this many executions (`None` = until exhausted).
    pub max_executions: Option<u64>,
    /// Log progress every N executions (0 disables).
    pub progress_interval: u64,
}

impl Default for TesterConfig {
    fn default() -> Self {
        Self {
            max_executions: None,
            progress_interval: 1000,
        }
    }
}

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The generator had nothing left.
    Exhausted,
    /// The execution budget was spent.
    Budget,
}

/// Summary of one driver session.
#[derive(Debug, Clone)]
pub struct TesterReport {
    pub executions: u64,
    pub stop_reason: StopReason,
    /// Coverage as observed by the driver across every execution.
    pub coverage_stats: CoverageStats,
}

/// Runs `generate → execute → record` until done.
pub struct AutomatedTester<G, T> {
    generator: G,
    target: T,
    config: TesterConfig,
    coverage: CoverageCollector,
    executions: u64,
}

impl<G, T> AutomatedTester<G, T>
where
    G: InputGenerator,
    T: Target<Input = G::Input>,
{
    pub fn new(generator: G, target: T, config: TesterConfig) -> Self {
        Self {
            generator,
            target,
            config,
            coverage: CoverageCollector::new(),
            executions: 0,
        }
    }

    /// Run the session to completion.
    ///
    /// Calling `run` again continues from where the previous call stopped,
    /// with the budget counted across calls.
    pub fn run(&mut self) -> TesterReport {
        info!(
            "Starting session: budget {}",
            self.config
                .max_executions
                .map_or_else(|| "unbounded".to_string(), |b| b.to_string())
        );

        let stop_reason = loop {
            if let Some(budget) = self.config.max_executions {
                if self.executions >= budget {
                    break StopReason::Budget;
                }
            }
            if !self.generator.has_more() {
                break StopReason::Exhausted;
            }
            let Some(input) = self.generator.generate() else {
                debug!("Generator reported more inputs but produced none");
                break StopReason::Exhausted;
            };

            let execution = self.target.execute(&input);
            self.coverage.update_global(&execution.coverage);
            self.generator
                .record(input, execution.coverage, execution.state);
            self.executions += 1;

            if self.config.progress_interval > 0
                && self.executions % self.config.progress_interval == 0
            {
                info!(
                    "Executions: {}, locations: {}",
                    self.executions,
                    self.coverage.global_coverage().count()
                );
            }
        };

        info!(
            "Session stopped ({:?}) after {} executions, {} locations",
            stop_reason,
            self.executions,
            self.coverage.global_coverage().count()
        );

        TesterReport {
            executions: self.executions,
            stop_reason,
            coverage_stats: self.coverage.stats(),
        }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    /// Global coverage across every execution so far.
    pub fn coverage(&self) -> &CoverageBitmap {
        self.coverage.global_coverage()
    }

    pub fn into_parts(self) -> (G, T) {
        (self.generator, self.target)
    }
}
