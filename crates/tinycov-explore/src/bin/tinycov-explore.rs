//! CLI binary for the TinyCov input generator.
//!
//! Drives the worklist scheduler against the built-in maze target.
//!
//! # Usage
//!
//! ```bash
//! # Generate until the worklist is exhausted
//! tinycov-explore run
//!
//! # Longer sequences, bounded budget, custom pool ceiling
//! tinycov-explore run --length 16 --executions 50000 --max-pool 4096
//!
//! # Start from a JSON configuration file
//! tinycov-explore run --config tinycov.json
//!
//! # Save results to directory (checkpoint + report)
//! tinycov-explore run --executions 10000 --output results/
//!
//! # Resume from a previous session
//! tinycov-explore resume --corpus results/ --executions 10000
//! ```
//!
//! # Checkpointing
//!
//! When `--output` is given, the final session state is written to
//! `{output}/checkpoint.json` and the report to `{output}/report.txt`.
//! `resume` continues from that checkpoint and overwrites both files.

use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::Path;
use tinycov_explore::checkpoint::{load_checkpoint, save_checkpoint};
use tinycov_explore::config::GeneratorConfig;
use tinycov_explore::demo::MazeTarget;
use tinycov_explore::report::{format_report, ExplorationReport};
use tinycov_explore::scheduler::WorklistScheduler;
use tinycov_explore::seed::SeedStrategy;
use tinycov_explore::tester::{AutomatedTester, TesterConfig};

#[derive(Parser)]
#[command(name = "tinycov-explore")]
#[command(about = "Coverage-guided input generation for the TinyBoy VM")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a generation session.
    Run(RunArgs),

    /// Resume from saved checkpoint.
    Resume {
        /// Path to corpus directory (containing checkpoint.json).
        #[arg(short, long)]
        corpus: String,

        /// Additional executions to run (default: until exhausted).
        #[arg(short, long)]
        executions: Option<u64>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// JSON configuration file; flags below override its values.
    #[arg(long)]
    config: Option<String>,

    /// Sequence length.
    #[arg(short, long)]
    length: Option<usize>,

    /// Random seed for reproducibility.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Ceiling on the number of pending sequences.
    #[arg(short, long)]
    max_pool: Option<usize>,

    /// Stop after this many executions (default: until exhausted).
    #[arg(short, long)]
    executions: Option<u64>,

    /// Seeding strategy: "auto", "exhaustive", or "random".
    #[arg(long)]
    seeding: Option<String>,

    /// Number of random seeds (for "random" and "auto").
    #[arg(long, default_value = "1024")]
    seed_count: usize,

    /// Candidate mutants generated per retained sequence.
    #[arg(long)]
    batch: Option<usize>,

    /// Mutants admitted per retained sequence.
    #[arg(long)]
    mutants: Option<usize>,

    /// Output directory for the checkpoint and report.
    #[arg(short, long)]
    output: Option<String>,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => cmd_run(args),
        Commands::Resume { corpus, executions } => cmd_resume(corpus, executions),
    }
}

fn build_config(args: &RunArgs) -> Result<GeneratorConfig, String> {
    let mut config = match &args.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .map_err(|e| format!("failed to read config {}: {}", path, e))?;
            serde_json::from_str(&json)
                .map_err(|e| format!("failed to parse config {}: {}", path, e))?
        }
        None => GeneratorConfig::default(),
    };

    if let Some(length) = args.length {
        config.sequence_length = length;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(max_pool) = args.max_pool {
        config.max_pool = max_pool;
    }
    if let Some(batch) = args.batch {
        config.candidate_batch = batch;
    }
    if let Some(mutants) = args.mutants {
        config.mutants_per_record = mutants;
    }
    if let Some(seeding) = &args.seeding {
        config.seeding = match seeding.as_str() {
            "auto" => SeedStrategy::Auto {
                max_exhaustive: 4096,
                random_count: args.seed_count,
            },
            "exhaustive" | "all" => SeedStrategy::Exhaustive,
            "random" | "rand" => SeedStrategy::Random {
                count: args.seed_count,
            },
            other => {
                return Err(format!(
                    "unknown seeding strategy '{}'. Use 'auto', 'exhaustive', or 'random'.",
                    other
                ))
            }
        };
    }

    Ok(config)
}

fn cmd_run(args: RunArgs) {
    let config = match build_config(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // Create output directory if specified
    if let Some(ref output_dir) = args.output {
        if let Err(e) = fs::create_dir_all(output_dir) {
            eprintln!("Error: failed to create output directory: {}", e);
            std::process::exit(1);
        }
    }

    eprintln!("═══════════════════════════════════════════════════════════════════════");
    eprintln!("  TinyCov Input Generation");
    eprintln!("═══════════════════════════════════════════════════════════════════════");
    eprintln!();
    eprintln!("Configuration:");
    eprintln!("  Alphabet:       {} symbols", config.alphabet.len());
    eprintln!("  Length:         {}", config.sequence_length);
    eprintln!("  Seed:           {}", config.seed);
    eprintln!("  Seeding:        {:?}", config.seeding);
    eprintln!("  Max pool:       {}", config.max_pool);
    eprintln!("  Batch:          {}", config.candidate_batch);
    eprintln!("  Mutants/record: {}", config.mutants_per_record);
    match args.executions {
        Some(n) => eprintln!("  Executions:     {}", n),
        None => eprintln!("  Executions:     until exhausted"),
    }
    if let Some(ref output_dir) = args.output {
        eprintln!("  Output:         {}", output_dir);
    }
    eprintln!();

    let scheduler = match WorklistScheduler::new(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    eprintln!("Starting generation...");
    eprintln!();
    run_session(scheduler, args.executions, args.output.as_deref());
}

fn cmd_resume(corpus: String, executions: Option<u64>) {
    // Validate corpus directory exists
    if !Path::new(&corpus).is_dir() {
        eprintln!("Error: corpus directory not found: {}", corpus);
        std::process::exit(1);
    }

    let checkpoint_path = format!("{}/checkpoint.json", corpus);
    if !Path::new(&checkpoint_path).exists() {
        eprintln!("Error: checkpoint file not found: {}", checkpoint_path);
        std::process::exit(1);
    }

    let checkpoint = match load_checkpoint(&checkpoint_path) {
        Ok(cp) => cp,
        Err(e) => {
            eprintln!("Error: failed to load checkpoint: {}", e);
            std::process::exit(1);
        }
    };

    eprintln!("═══════════════════════════════════════════════════════════════════════");
    eprintln!("  TinyCov Input Generation (RESUME)");
    eprintln!("═══════════════════════════════════════════════════════════════════════");
    eprintln!();
    eprintln!("Checkpoint loaded from: {}", checkpoint_path);
    eprintln!();
    eprintln!("Previous progress:");
    eprintln!("  Recorded:          {}", checkpoint.counters.recorded);
    eprintln!("  Corpus entries:    {}", checkpoint.corpus.len());
    eprintln!("  Locations:         {}", checkpoint.global_coverage.count());
    eprintln!("  Pending:           {}", checkpoint.pending.len());
    eprintln!();

    let scheduler = match WorklistScheduler::from_checkpoint(checkpoint) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: checkpoint configuration is invalid: {}", e);
            std::process::exit(1);
        }
    };

    if !scheduler.has_more() {
        eprintln!("Error: checkpoint has no pending sequences left");
        std::process::exit(1);
    }

    eprintln!("Resuming generation...");
    eprintln!();
    run_session(scheduler, executions, Some(&corpus));
}

fn run_session(scheduler: WorklistScheduler, executions: Option<u64>, output: Option<&str>) {
    let tester_config = TesterConfig {
        max_executions: executions,
        ..Default::default()
    };
    let mut tester = AutomatedTester::new(scheduler, MazeTarget::new(), tester_config);
    let summary = tester.run();

    eprintln!();
    eprintln!("Generation complete!");
    eprintln!();

    let (scheduler, _) = tester.into_parts();
    let formatted = format_report(&ExplorationReport::new(&summary, &scheduler));
    println!("{}", formatted);

    let Some(output_dir) = output else {
        return;
    };

    let report_path = format!("{}/report.txt", output_dir);
    if let Err(e) = fs::write(&report_path, &formatted) {
        eprintln!("Warning: failed to save report: {}", e);
    } else {
        eprintln!("Saved report to: {}", report_path);
    }

    let checkpoint_path = format!("{}/checkpoint.json", output_dir);
    if let Err(e) = save_checkpoint(&checkpoint_path, &scheduler.checkpoint()) {
        eprintln!("Warning: failed to save checkpoint: {}", e);
    } else {
        eprintln!("Saved checkpoint to: {}", checkpoint_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(flags: &[&str]) -> RunArgs {
        let argv = ["tinycov-explore", "run"].iter().chain(flags.iter());
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Run(args) => args,
            Commands::Resume { .. } => panic!("expected the run subcommand"),
        }
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = build_config(&run_args(&["--length", "6", "--seed", "9", "--mutants", "4"]))
            .unwrap();
        assert_eq!(config.sequence_length, 6);
        assert_eq!(config.seed, 9);
        assert_eq!(config.mutants_per_record, 4);
    }

    #[test]
    fn test_intractable_exhaustive_seeding_is_rejected() {
        let config = build_config(&run_args(&["--seeding", "exhaustive", "--length", "20"]))
            .unwrap();
        assert_eq!(config.seeding, SeedStrategy::Exhaustive);
        assert!(WorklistScheduler::new(config).is_err());
    }

    #[test]
    fn test_unknown_seeding_is_rejected() {
        let err = build_config(&run_args(&["--seeding", "bogus"])).unwrap_err();
        assert!(err.contains("unknown seeding strategy"));
    }
}
