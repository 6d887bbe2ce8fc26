//! Sweeping an experiment over its grid.
//!
//! For each point, in grid order:
//!
//! ```text
//! build_structure ─► build_environment ─► attach_logger ─► run_until(runtime) ─► finalize log
//! ```
//!
//! Errors from the three hooks abort the sweep. A process error while
//! running fails only that point; its log is still finalized and the sweep
//! moves on.

use crate::log_factory::unix_timestamp;
use crate::logger::{LogError, LogOutput, LoggerHandle};
use crate::{Grid, GridError, GridPoint};
use netsim_builders::BuildError;
use netsim_core::{Network, NetworkSnapshot};
use netsim_simulation::{Environment, SimulationError, SimulationStats};
use netsim_types::{ProcessId, SimTime};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

/// Errors that abort a sweep.
#[derive(Debug, Error)]
pub enum CaseError {
    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    #[error("Failed to build structure: {0}")]
    Build(#[from] BuildError),

    #[error("Logging failed: {0}")]
    Log(#[from] LogError),

    #[error("Simulation error: {0}")]
    Simulation(SimulationError),

    /// Anything else an experiment's hooks reject.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// A concrete experiment: a grid and how to set up one of its points.
///
/// Hooks must be deterministic in `point`, so a rerun of a point rebuilds
/// the same structure and environment.
pub trait Experiment {
    /// Observation type written by the experiment's logger.
    type State: Serialize + 'static;

    fn grid(&self) -> Grid;

    fn build_structure(&self, point: &GridPoint) -> Result<Network, CaseError>;

    fn build_environment(&self, network: Network, point: &GridPoint) -> Result<Environment, CaseError>;

    fn attach_logger(
        &self,
        env: &mut Environment,
        point: &GridPoint,
    ) -> Result<LoggerHandle<Self::State>, CaseError>;
}

/// How the run of one point ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PointStatus {
    Completed(SimulationStats),

    /// A process failed at `time`; later events were not processed.
    Failed {
        time: SimTime,
        process: ProcessId,
        reason: String,
    },

    /// The environment already stood at or past the runtime.
    Skipped,
}

impl PointStatus {
    pub fn is_success(&self) -> bool {
        !matches!(self, PointStatus::Failed { .. })
    }
}

/// Record of one processed point.
#[derive(Debug, Clone, PartialEq)]
pub struct PointOutcome<T> {
    pub point: GridPoint,
    /// Unix seconds at which the point's log was finalized.
    pub completed_at: u64,
    pub status: PointStatus,
    pub log: LogOutput<T>,
}

/// A named sweep with a fixed runtime per point.
#[derive(Debug, Clone)]
pub struct SimulationCase<T = NetworkSnapshot> {
    name: String,
    runtime: SimTime,
    success: bool,
    started_at: Option<u64>,
    finished_at: Option<u64>,
    outcomes: Vec<PointOutcome<T>>,
}

impl<T> SimulationCase<T> {
    pub fn new(name: impl Into<String>, runtime: SimTime) -> Self {
        Self {
            name: name.into(),
            runtime,
            success: false,
            started_at: None,
            finished_at: None,
            outcomes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn runtime(&self) -> SimTime {
        self.runtime
    }

    /// True once a sweep has finished with every point successful.
    pub fn success(&self) -> bool {
        self.success
    }

    pub fn started_at(&self) -> Option<u64> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<u64> {
        self.finished_at
    }

    pub fn outcomes(&self) -> &[PointOutcome<T>] {
        &self.outcomes
    }

    /// Completion times of the processed points, in order.
    pub fn timestamps(&self) -> impl Iterator<Item = u64> + '_ {
        self.outcomes.iter().map(|o| o.completed_at)
    }
}

impl<T: Serialize + 'static> SimulationCase<T> {
    /// Run every point of the experiment's grid, in order.
    ///
    /// Outcomes of an earlier sweep are discarded.
    pub fn run<E>(&mut self, experiment: &E) -> Result<(), CaseError>
    where
        E: Experiment<State = T>,
    {
        let grid = experiment.grid();
        self.success = false;
        self.outcomes.clear();
        self.finished_at = None;
        self.started_at = Some(unix_timestamp());
        info!(case = %self.name, points = grid.len(), runtime = self.runtime, "Starting sweep");

        for point in grid.iter() {
            let outcome = self.run_point(experiment, point)?;
            self.outcomes.push(outcome);
        }

        self.success = self.outcomes.iter().all(|o| o.status.is_success());
        self.finished_at = Some(unix_timestamp());
        let failed = self.outcomes.iter().filter(|o| !o.status.is_success()).count();
        info!(case = %self.name, points = self.outcomes.len(), failed, "Sweep finished");
        Ok(())
    }

    fn run_point<E>(&self, experiment: &E, point: GridPoint) -> Result<PointOutcome<T>, CaseError>
    where
        E: Experiment<State = T>,
    {
        let network = experiment.build_structure(&point)?;
        let mut env = experiment.build_environment(network, &point)?;
        let logger = experiment.attach_logger(&mut env, &point)?;

        let status = if env.now() >= self.runtime {
            PointStatus::Skipped
        } else {
            match env.run_until(self.runtime) {
                Ok(stats) => PointStatus::Completed(stats),
                Err(SimulationError::Process {
                    time,
                    process,
                    source,
                }) => {
                    warn!(%point, time, %process, error = %source, "Point failed");
                    PointStatus::Failed {
                        time,
                        process,
                        reason: source.to_string(),
                    }
                }
                Err(other) => {
                    logger.finalize()?;
                    return Err(CaseError::Simulation(other));
                }
            }
        };

        let log = logger.finalize()?;
        info!(%point, success = status.is_success(), "Point done");
        Ok(PointOutcome {
            point,
            completed_at: unix_timestamp(),
            status,
            log,
        })
    }
}

/// Run `experiment` as a new case and return it.
pub fn run_simulation<E: Experiment>(
    name: impl Into<String>,
    runtime: SimTime,
    experiment: &E,
) -> Result<SimulationCase<E::State>, CaseError> {
    let mut case = SimulationCase::new(name, runtime);
    case.run(experiment)?;
    Ok(case)
}
