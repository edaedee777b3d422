//! Experiment runner for timetable negotiation.
//!
//! Orchestrates the run lifecycle:
//! 1. Load or generate a schedule configuration
//! 2. Build the orchestrator with a seeded RNG
//! 3. Run rounds until every teacher is done
//! 4. Collect statistics, decoded timetables and the message log

use std::collections::BTreeMap;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use negotiation_kernel::{EntityRegistry, ScheduleConfig, ScheduleOrchestrator, TeacherState};

use crate::decoder::{GroupTimetable, TimetableDecoder};
use crate::generator::{ScheduleGenerator, ScheduleGeneratorConfig};
use crate::results::{RunReport, format_duration};

/// Configuration for the experiment runner.
#[derive(Debug, Clone)]
pub struct ExperimentRunnerConfig {
    /// Abort a run after this many rounds
    pub max_rounds: Option<usize>,
    /// Generator configuration for synthetic runs
    pub generator_config: ScheduleGeneratorConfig,
    /// Keep the rendered message log in the output
    pub keep_message_log: bool,
}

impl Default for ExperimentRunnerConfig {
    fn default() -> Self {
        Self {
            max_rounds: Some(100_000),
            generator_config: ScheduleGeneratorConfig::easy(),
            keep_message_log: false,
        }
    }
}

/// Everything a finished run produces.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub report: RunReport,
    pub timetables: Vec<GroupTimetable>,
    /// Final state per teacher name
    pub teacher_states: BTreeMap<String, TeacherState>,
    /// Empty unless `keep_message_log` is set
    pub message_log: Vec<String>,
}

/// Runs negotiations and packages their results.
pub struct ExperimentRunner {
    config: ExperimentRunnerConfig,
}

impl ExperimentRunner {
    /// Create a new experiment runner.
    pub fn new(config: ExperimentRunnerConfig) -> Self {
        Self { config }
    }

    /// Generate a configuration from `generator_seed`, then negotiate it.
    pub fn run_generated(
        &self,
        config_key: &str,
        generator_seed: u64,
        seed: u64,
    ) -> Result<RunOutput> {
        let mut generator =
            ScheduleGenerator::new(self.config.generator_config.clone(), generator_seed);
        let schedule_config = generator.generate();
        self.run(config_key, &schedule_config, seed)
    }

    /// Negotiate one configuration with the given shuffling seed.
    pub fn run(
        &self,
        config_key: &str,
        schedule_config: &ScheduleConfig,
        seed: u64,
    ) -> Result<RunOutput> {
        let started_at = Utc::now();
        let start_time = Instant::now();

        let mut registry = EntityRegistry::new();
        let mut schedule = ScheduleOrchestrator::new(
            schedule_config,
            &mut registry,
            ChaCha8Rng::seed_from_u64(seed),
        )
        .with_context(|| format!("Failed to build schedule '{config_key}'"))?;
        debug!(config = config_key, entities = ?registry.entities(), "Names registered");

        info!(
            config = config_key,
            seed,
            groups = schedule_config.groups.len(),
            rooms = schedule_config.rooms.len(),
            occurrences = schedule.stats().owned,
            "Starting negotiation"
        );

        let rounds = schedule
            .run(self.config.max_rounds)
            .with_context(|| format!("Negotiation of '{config_key}' failed"))?;

        let duration_ms = start_time.elapsed().as_millis() as u64;
        let stats = schedule.stats();
        if stats.not_placed > 0 {
            warn!(
                config = config_key,
                not_placed = stats.not_placed,
                "Some occurrences could not be placed"
            );
        }
        info!(
            config = config_key,
            rounds,
            placed = stats.placed,
            owned = stats.owned,
            duration = %format_duration(duration_ms),
            "Negotiation complete"
        );

        let timetables =
            TimetableDecoder::new(&registry, &schedule_config.period).decode(&schedule);
        let teacher_states = schedule
            .teacher_states()
            .into_iter()
            .map(|(id, state)| {
                let name = registry
                    .name(id)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("#{id}"));
                (name, state)
            })
            .collect();
        let message_log = if self.config.keep_message_log {
            schedule.message_log()
        } else {
            Vec::new()
        };

        Ok(RunOutput {
            report: RunReport {
                config_key: config_key.to_string(),
                seed,
                started_at,
                ended_at: Utc::now(),
                duration_ms,
                rounds,
                messages: schedule.deliveries().len(),
                stats,
            },
            timetables,
            teacher_states,
            message_log,
        })
    }
}
