//! Configuration types for the simulator.

use netsim_experiment::Capacity;
use netsim_types::SimTime;
use std::path::PathBuf;
use thiserror::Error;

/// A configuration that cannot be run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Grid values are signed 64-bit integers.
    #[error("Seed {0} does not fit a signed 64-bit grid value")]
    SeedOutOfRange(u64),
}

/// Configuration for a flip sweep.
#[derive(Clone, Debug)]
pub struct FlipConfig {
    /// Number of agents in each network.
    pub nodes: usize,

    /// One grid point per seed.
    pub seeds: Vec<u64>,

    /// An edge is added for each node pair whose uniform sample exceeds this.
    pub edge_threshold: f64,

    /// An agent flips its state when a standard normal draw exceeds this.
    pub flip_threshold: f64,

    /// Simulated time each point runs for.
    pub runtime: SimTime,

    /// Time between logged snapshots.
    pub interval: SimTime,

    /// How many snapshots are buffered before a flush.
    pub capacity: Capacity,

    /// Where log files are written.
    pub results_dir: PathBuf,

    /// Remove earlier logs of the same point before writing.
    pub replace_previous: bool,
}

impl FlipConfig {
    /// Create a configuration for `nodes` agents and the given seeds.
    pub fn new(nodes: usize, seeds: impl IntoIterator<Item = u64>) -> Self {
        Self {
            nodes,
            seeds: seeds.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn with_edge_threshold(mut self, threshold: f64) -> Self {
        self.edge_threshold = threshold;
        self
    }

    pub fn with_flip_threshold(mut self, threshold: f64) -> Self {
        self.flip_threshold = threshold;
        self
    }

    pub fn with_runtime(mut self, runtime: SimTime) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn with_interval(mut self, interval: SimTime) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_capacity(mut self, capacity: Capacity) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_results_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.results_dir = dir.into();
        self
    }

    pub fn with_replace_previous(mut self, replace: bool) -> Self {
        self.replace_previous = replace;
        self
    }

    /// Check that every seed can be carried by the grid, returning them as
    /// grid values.
    pub fn grid_seeds(&self) -> Result<Vec<i64>, ConfigError> {
        self.seeds
            .iter()
            .map(|&seed| i64::try_from(seed).map_err(|_| ConfigError::SeedOutOfRange(seed)))
            .collect()
    }

    /// Number of snapshots each point is expected to log.
    pub fn snapshots_per_point(&self) -> u64 {
        if self.interval == 0 {
            return 0;
        }
        self.runtime.div_ceil(self.interval)
    }
}

impl Default for FlipConfig {
    fn default() -> Self {
        Self {
            nodes: 50,
            seeds: vec![0, 1, 2],
            edge_threshold: 0.9,
            flip_threshold: 0.5,
            runtime: 10,
            interval: 1,
            capacity: Capacity::default(),
            results_dir: PathBuf::from("results"),
            replace_previous: false,
        }
    }
}
