//! Running a flip sweep and summarising its logs.

use crate::config::{ConfigError, FlipConfig};
use crate::flip::{FlipExperiment, STATE};
use netsim_core::NetworkSnapshot;
use netsim_experiment::{
    run_simulation, CaseError, GridPoint, LogOutput, PointStatus, ResultSet, ResultsError,
    SimulationCase,
};
use std::fmt;
use thiserror::Error;
use tracing::info;

/// Errors that stop the simulator.
#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Case(#[from] CaseError),

    #[error("Failed to read back results: {0}")]
    Results(#[from] ResultsError),
}

/// What one point of a sweep produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSummary {
    pub point: GridPoint,
    pub status: PointStatus,
    pub snapshots: usize,
    /// Agents whose state is on in the last snapshot.
    pub final_on: Option<usize>,
}

impl fmt::Display for PointSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match &self.status {
            PointStatus::Completed(stats) => format!("completed ({} events)", stats.events_processed),
            PointStatus::Failed { time, reason, .. } => format!("failed at t={time}: {reason}"),
            PointStatus::Skipped => "skipped".to_string(),
        };
        write!(f, "{} {status}, {} snapshots", self.point, self.snapshots)?;
        if let Some(on) = self.final_on {
            write!(f, ", {on} on at the end")?;
        }
        Ok(())
    }
}

/// A finished sweep and a summary per point.
#[derive(Debug)]
pub struct SimulationReport {
    pub case: SimulationCase<NetworkSnapshot>,
    pub points: Vec<PointSummary>,
}

impl SimulationReport {
    pub fn success(&self) -> bool {
        self.case.success()
    }
}

/// Run the flip model for every configured seed.
pub fn run(config: FlipConfig) -> Result<SimulationReport, SimulatorError> {
    let runtime = config.runtime;
    let experiment = FlipExperiment::new(config)?;
    let case = run_simulation("flip", runtime, &experiment)?;

    let mut points = Vec::with_capacity(case.outcomes().len());
    for outcome in case.outcomes() {
        let loaded;
        let snapshots: &[NetworkSnapshot] = match &outcome.log {
            LogOutput::InMemory(snapshots) => snapshots,
            LogOutput::Persisted(path) => {
                loaded = ResultSet::<NetworkSnapshot>::from_path(path)?;
                loaded.as_slice()
            }
        };
        let summary = PointSummary {
            point: outcome.point.clone(),
            status: outcome.status.clone(),
            snapshots: snapshots.len(),
            final_on: snapshots.last().map(|s| s.count_true(STATE)),
        };
        info!(summary = %summary, "Point summary");
        points.push(summary);
    }

    Ok(SimulationReport { case, points })
}

#[cfg(test)]
mod tests {
    use super::*;
    use netsim_experiment::Capacity;

    #[test]
    fn test_run_logs_every_interval_for_every_seed() {
        let dir = tempfile::tempdir().unwrap();
        let config = FlipConfig::new(15, [0, 1, 2])
            .with_runtime(12)
            .with_interval(2)
            .with_capacity(Capacity::Items(4))
            .with_results_dir(dir.path());
        let expected = config.snapshots_per_point() as usize;

        let report = run(config).unwrap();
        assert!(report.success());
        assert_eq!(report.points.len(), 3);
        for summary in &report.points {
            assert_eq!(summary.snapshots, expected);
            assert!(summary.final_on.is_some_and(|on| on <= 15));
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 3);
    }

    #[test]
    fn test_same_seeds_reproduce_summaries() {
        let run_once = || {
            let dir = tempfile::tempdir().unwrap();
            let config = FlipConfig::new(10, [5]).with_runtime(8).with_results_dir(dir.path());
            run(config).unwrap().points
        };
        let a = run_once();
        let b = run_once();
        assert_eq!(
            a.iter().map(|p| p.final_on).collect::<Vec<_>>(),
            b.iter().map(|p| p.final_on).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_unrepresentable_seed_rejected_before_running() {
        let dir = tempfile::tempdir().unwrap();
        let config = FlipConfig::new(3, [u64::MAX]).with_results_dir(dir.path());
        assert!(matches!(
            run(config),
            Err(SimulatorError::Config(ConfigError::SeedOutOfRange(u64::MAX)))
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
