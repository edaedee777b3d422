//! Run reports and seed-sweep summaries.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use negotiation_kernel::ScheduleStats;

/// Result of one negotiation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Label of the configuration (difficulty or file name)
    pub config_key: String,
    /// Seed of the shuffling RNG
    pub seed: u64,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// End time
    pub ended_at: DateTime<Utc>,
    /// Wall-clock duration of the negotiation
    pub duration_ms: u64,
    /// Rounds until every teacher finished
    pub rounds: usize,
    /// Delivered messages, replies included
    pub messages: usize,
    /// Occurrence counts
    pub stats: ScheduleStats,
}

impl RunReport {
    pub fn placement_rate(&self) -> f64 {
        self.stats.placement_rate()
    }
}

/// Aggregate results of a seed sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepResults {
    /// All individual runs
    pub results: Vec<RunReport>,
    /// Summary statistics by configuration
    pub summary: BTreeMap<String, SweepSummary>,
}

/// Summary statistics for one configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepSummary {
    pub config_key: String,
    pub runs: usize,
    pub avg_placement_rate: f64,
    /// Standard error of the placement rate
    pub placement_rate_se: f64,
    pub min_placement_rate: f64,
    pub max_placement_rate: f64,
    /// Runs that placed every occurrence
    pub complete_runs: usize,
    pub avg_rounds: f64,
    pub avg_messages: f64,
    pub avg_duration_ms: f64,
}

impl SweepResults {
    /// Create a new empty sweep.
    pub fn new() -> Self {
        Self {
            results: Vec::new(),
            summary: BTreeMap::new(),
        }
    }

    /// Add a result.
    pub fn add(&mut self, result: RunReport) {
        self.results.push(result);
    }

    /// Compute summary statistics.
    pub fn compute_summary(&mut self) {
        let mut by_config: BTreeMap<&str, Vec<&RunReport>> = BTreeMap::new();
        for result in &self.results {
            by_config.entry(result.config_key.as_str()).or_default().push(result);
        }

        let mut summary = BTreeMap::new();
        for (key, results) in by_config {
            let runs = results.len();
            let n = runs as f64;
            let rates: Vec<f64> = results.iter().map(|r| r.placement_rate()).collect();
            let avg_placement_rate = rates.iter().sum::<f64>() / n;

            // SE = std_dev / sqrt(n)
            let placement_rate_se = if runs > 1 {
                let variance = rates
                    .iter()
                    .map(|r| (r - avg_placement_rate).powi(2))
                    .sum::<f64>()
                    / (n - 1.0);
                variance.sqrt() / n.sqrt()
            } else {
                0.0
            };

            let mean = |f: fn(&RunReport) -> f64| results.iter().map(|r| f(r)).sum::<f64>() / n;

            summary.insert(
                key.to_string(),
                SweepSummary {
                    config_key: key.to_string(),
                    runs,
                    avg_placement_rate,
                    placement_rate_se,
                    min_placement_rate: rates.iter().copied().fold(f64::INFINITY, f64::min),
                    max_placement_rate: rates.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                    complete_runs: results.iter().filter(|r| r.stats.not_placed == 0).count(),
                    avg_rounds: mean(|r| r.rounds as f64),
                    avg_messages: mean(|r| r.messages as f64),
                    avg_duration_ms: mean(|r| r.duration_ms as f64),
                },
            );
        }
        self.summary = summary;
    }

    /// Save results to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load results from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let results = serde_json::from_str(&json)?;
        Ok(results)
    }
}

impl Default for SweepResults {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a duration in milliseconds for display.
pub fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        format!("{:.1}m", ms as f64 / 60_000.0)
    }
}
