//! Timetable Experiment CLI.
//!
//! Generate scheduling configurations, negotiate them, and sweep seeds.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use negotiation_kernel::ScheduleConfig;
use timetable_experiment::experiment::{ExperimentRunner, ExperimentRunnerConfig, RunOutput};
use timetable_experiment::generator::{ScheduleGenerator, ScheduleGeneratorConfig};
use timetable_experiment::results::{SweepResults, format_duration};

#[derive(Parser)]
#[command(name = "timetable-experiment")]
#[command(about = "Negotiated class timetabling between teacher, group and room agents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a schedule configuration.
    Generate {
        /// Difficulty: easy, medium, hard
        #[arg(short, long, default_value = "easy")]
        difficulty: String,
        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Output file (JSON); printed to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Negotiate a single configuration.
    Run {
        /// Configuration file (JSON); a generated one is used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Difficulty for generated configurations: easy, medium, hard
        #[arg(short, long, default_value = "easy")]
        difficulty: String,
        /// Seed for the round shuffling (and generation)
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Maximum rounds
        #[arg(long, env = "TIMETABLE_MAX_ROUNDS", default_value = "100000")]
        max_rounds: usize,
        /// Print the full message log
        #[arg(long)]
        log_messages: bool,
        /// Output file for the report (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output file for the decoded timetables (JSON)
        #[arg(long)]
        timetable: Option<PathBuf>,
    },

    /// Run many seeds and summarize placement rates.
    Sweep {
        /// Number of seeds per difficulty
        #[arg(short, long, default_value = "30")]
        trials: usize,
        /// Difficulties (comma-separated): easy, medium, hard
        #[arg(short, long, default_value = "easy,medium,hard")]
        difficulties: String,
        /// Maximum rounds
        #[arg(long, default_value = "100000")]
        max_rounds: usize,
        /// Output file for results (JSON)
        #[arg(short, long, default_value = "results/timetable-sweep.json")]
        output: PathBuf,
    },
}

fn parse_difficulty(s: &str) -> ScheduleGeneratorConfig {
    match s.to_lowercase().as_str() {
        "easy" => ScheduleGeneratorConfig::easy(),
        "medium" => ScheduleGeneratorConfig::medium(),
        "hard" => ScheduleGeneratorConfig::hard(),
        _ => {
            eprintln!("Unknown difficulty: {}. Using 'easy'.", s);
            ScheduleGeneratorConfig::easy()
        }
    }
}

fn load_config(path: &Path) -> Result<ScheduleConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(ScheduleConfig::from_json(&json)?)
}

fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::create_dir_all(path.parent().unwrap_or(Path::new(".")))?;
    std::fs::write(path, json)?;
    Ok(())
}

fn print_run(output: &RunOutput) {
    let report = &output.report;
    println!("\n=== Negotiation Complete ===");
    println!("Config: {}", report.config_key);
    println!("Seed: {}", report.seed);
    println!("Rounds: {}", report.rounds);
    println!("Messages: {}", report.messages);
    println!(
        "Placed: {}/{} ({:.1}%), not placed: {}",
        report.stats.placed,
        report.stats.owned,
        report.placement_rate() * 100.0,
        report.stats.not_placed
    );
    println!("Duration: {}", format_duration(report.duration_ms));

    println!("\nTeacher states:");
    for (teacher, state) in &output.teacher_states {
        println!("  {}: {}", teacher, state);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Generate {
            difficulty,
            seed,
            output,
        } => {
            let mut generator = ScheduleGenerator::new(parse_difficulty(&difficulty), seed);
            let config = generator.generate();
            match output {
                Some(output) => {
                    write_json(&output, &config)?;
                    println!("Configuration written to: {}", output.display());
                }
                None => println!("{}", config.to_json()?),
            }
        }

        Commands::Run {
            config,
            difficulty,
            seed,
            max_rounds,
            log_messages,
            output,
            timetable,
        } => {
            if max_rounds == 0 {
                bail!("--max-rounds must be positive");
            }
            let runner = ExperimentRunner::new(ExperimentRunnerConfig {
                max_rounds: Some(max_rounds),
                generator_config: parse_difficulty(&difficulty),
                keep_message_log: log_messages,
            });

            let result = match &config {
                Some(path) => {
                    let schedule_config = load_config(path)?;
                    let key = path
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_else(|| "config".to_string());
                    runner.run(&key, &schedule_config, seed)?
                }
                None => runner.run_generated(&difficulty, seed, seed)?,
            };

            if log_messages {
                for line in &result.message_log {
                    println!("{}", line);
                }
            }
            print_run(&result);

            if let Some(output) = output {
                write_json(&output, &result.report)?;
                println!("\nReport written to: {}", output.display());
            }
            if let Some(timetable) = timetable {
                write_json(&timetable, &result.timetables)?;
                println!("Timetables written to: {}", timetable.display());
            }
        }

        Commands::Sweep {
            trials,
            difficulties,
            max_rounds,
            output,
        } => {
            let difficulty_names: Vec<&str> =
                difficulties.split(',').map(|s| s.trim()).collect();

            info!(
                difficulties = ?difficulty_names,
                trials,
                "Starting seed sweep"
            );

            let mut sweep = SweepResults::new();
            for difficulty in &difficulty_names {
                let runner = ExperimentRunner::new(ExperimentRunnerConfig {
                    max_rounds: Some(max_rounds),
                    generator_config: parse_difficulty(difficulty),
                    keep_message_log: false,
                });

                for trial in 0..trials {
                    let seed = trial as u64;
                    let result = runner.run_generated(difficulty, seed, seed)?;
                    println!(
                        "difficulty={} trial={}: placed={}/{} rounds={} messages={}",
                        difficulty,
                        trial,
                        result.report.stats.placed,
                        result.report.stats.owned,
                        result.report.rounds,
                        result.report.messages
                    );
                    sweep.add(result.report);
                }
            }
            sweep.compute_summary();

            println!("\n=== Sweep Summary ===");
            for (key, summary) in &sweep.summary {
                println!(
                    "{}: {:.1}% placed (min {:.1}%, max {:.1}%), {}/{} complete, avg rounds={:.1}",
                    key,
                    summary.avg_placement_rate * 100.0,
                    summary.min_placement_rate * 100.0,
                    summary.max_placement_rate * 100.0,
                    summary.complete_runs,
                    summary.runs,
                    summary.avg_rounds
                );
            }

            std::fs::create_dir_all(output.parent().unwrap_or(Path::new(".")))?;
            sweep.save(&output)?;
            println!("\nResults written to: {}", output.display());
        }
    }

    Ok(())
}
