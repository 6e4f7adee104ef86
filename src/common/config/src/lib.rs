//! Configuration management for tessera.
//!
//! Provides the knobs consulted while lowering logical plans and while the
//! reference scheduler drives the produced step stream.

use serde::{Deserialize, Serialize};

use common_error::TesseraResult;

/// Global tessera configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TesseraConfig {
    /// Physical planning configuration.
    pub planner: PlannerConfig,
    /// Reference scheduler configuration.
    pub scheduler: SchedulerConfig,
}

impl TesseraConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> TesseraResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Replace the planner configuration.
    pub fn with_planner(mut self, planner: PlannerConfig) -> Self {
        self.planner = planner;
        self
    }

    /// Replace the scheduler configuration.
    pub fn with_scheduler(mut self, scheduler: SchedulerConfig) -> Self {
        self.scheduler = scheduler;
        self
    }
}

/// Configuration consulted by the physical plan translator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Rows sampled from each input partition to compute sort boundaries.
    pub sort_sample_size: usize,
    /// Fixed seed for random fanouts. `None` lets each task pick its own.
    pub random_fanout_seed: Option<u64>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            sort_sample_size: 20,
            random_fanout_seed: None,
        }
    }
}

impl PlannerConfig {
    /// Set the per-partition sample size used by sorts.
    pub fn with_sort_sample_size(mut self, size: usize) -> Self {
        self.sort_sample_size = size;
        self
    }

    /// Use a fixed seed for random fanouts.
    pub fn with_random_fanout_seed(mut self, seed: u64) -> Self {
        self.random_fanout_seed = Some(seed);
        self
    }
}

/// Configuration for the reference local scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Maximum number of materialization requests running at once.
    pub max_inflight_tasks: usize,
    /// Consecutive not-ready polls tolerated with nothing in flight.
    pub max_idle_polls: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_inflight_tasks: 8,
            max_idle_polls: 10_000,
        }
    }
}

impl SchedulerConfig {
    /// Set the in-flight task cap. Values below one are clamped to one.
    pub fn with_max_inflight_tasks(mut self, n: usize) -> Self {
        self.max_inflight_tasks = n.max(1);
        self
    }

    /// Set the idle poll budget.
    pub fn with_max_idle_polls(mut self, n: usize) -> Self {
        self.max_idle_polls = n;
        self
    }
}
