//! Format generation session reports for human consumption.

use crate::corpus::CorpusEntry;
use crate::coverage::CoverageStats;
use crate::input::ControlAlphabet;
use crate::scheduler::{SchedulerStats, WorklistScheduler};
use crate::tester::{StopReason, TesterReport};

/// Entries listed in full before the rest are summarized.
const MAX_LISTED_ENTRIES: usize = 20;

/// Everything a finished session has to say.
#[derive(Debug, Clone)]
pub struct ExplorationReport {
    pub executions: u64,
    pub stop_reason: StopReason,
    pub coverage_stats: CoverageStats,
    pub scheduler: SchedulerStats,
    /// Retained corpus, oldest first.
    pub corpus: Vec<CorpusEntry>,
    pub alphabet: ControlAlphabet,
}

impl ExplorationReport {
    /// Combine a driver run with the scheduler's session totals.
    ///
    /// Coverage figures come from the scheduler, so a resumed session reports
    /// everything recorded since the original start; `executions` counts only
    /// this driver run.
    pub fn new(tester: &TesterReport, scheduler: &WorklistScheduler) -> Self {
        Self {
            executions: tester.executions,
            stop_reason: tester.stop_reason,
            coverage_stats: scheduler.coverage_stats(),
            scheduler: scheduler.stats(),
            corpus: scheduler.corpus().entries().to_vec(),
            alphabet: scheduler.config().alphabet.clone(),
        }
    }
}

/// Format a session report for human consumption.
pub fn format_report(report: &ExplorationReport) -> String {
    let mut output = String::new();

    output.push_str("═══════════════════════════════════════════════════════════════════════\n");
    output.push_str("  TinyCov Input Generation Report\n");
    output.push_str("═══════════════════════════════════════════════════════════════════════\n\n");

    let stop = match report.stop_reason {
        StopReason::Exhausted => "worklist exhausted",
        StopReason::Budget => "execution budget reached",
    };
    output.push_str(&format!("Executions:             {}\n", report.executions));
    output.push_str(&format!("Stopped:                {}\n", stop));
    output.push_str(&format!("Corpus entries:         {}\n", report.corpus.len()));
    output.push_str(&format!(
        "Locations covered:      {}\n",
        report.coverage_stats.total_locations
    ));
    output.push_str(&format!(
        "Distinct final states:  {}\n",
        report.scheduler.distinct_states
    ));
    output.push('\n');

    output.push_str("─── Coverage Statistics ───────────────────────────────────────────────\n");
    output.push_str(&format!(
        "Total runs:             {}\n",
        report.coverage_stats.total_runs
    ));
    output.push_str(&format!(
        "Avg locations/run:      {:.2}\n",
        report.coverage_stats.locations_per_run_avg
    ));
    output.push('\n');

    let s = &report.scheduler;
    output.push_str("─── Worklist Statistics ───────────────────────────────────────────────\n");
    output.push_str(&format!("Dispatched:             {}\n", s.dispatched));
    output.push_str(&format!("Recorded:               {}\n", s.recorded));
    output.push_str(&format!("Redundant:              {}\n", s.redundant));
    output.push_str(&format!("Mutants admitted:       {}\n", s.admitted));
    if s.sampled_out > 0 {
        output.push_str(&format!("Sampled out:            {}\n", s.sampled_out));
    }
    if s.evicted > 0 {
        output.push_str(&format!("Evicted from corpus:    {}\n", s.evicted));
    }
    if s.unrecognized > 0 {
        output.push_str(&format!("Unrecognized records:   {}\n", s.unrecognized));
    }
    output.push_str(&format!("Still pending:          {}\n", s.pending));
    output.push('\n');

    if report.corpus.is_empty() {
        output
            .push_str("─── Empty Corpus ──────────────────────────────────────────────────────\n");
        output.push_str("No sequences were recorded.\n\n");
    } else {
        output
            .push_str("─── Corpus ────────────────────────────────────────────────────────────\n");
        for entry in report.corpus.iter().take(MAX_LISTED_ENTRIES) {
            output.push_str(&format_entry(entry, &report.alphabet));
        }
        if report.corpus.len() > MAX_LISTED_ENTRIES {
            output.push_str(&format!(
                "  ... and {} more entries\n",
                report.corpus.len() - MAX_LISTED_ENTRIES
            ));
        }
        output.push('\n');
    }

    output.push_str("═══════════════════════════════════════════════════════════════════════\n");

    output
}

/// One corpus entry on a single line.
pub fn format_entry(entry: &CorpusEntry, alphabet: &ControlAlphabet) -> String {
    let digest = entry.state_digest.get(..12).unwrap_or(&entry.state_digest);
    format!(
        "  #{:<5} {} locs (+{}) state {}  {}\n",
        entry.id,
        entry.coverage.count(),
        entry.new_locations,
        digest,
        entry.sequence.display(alphabet)
    )
}
