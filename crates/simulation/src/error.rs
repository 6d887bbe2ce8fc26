//! Error types for the event engine.

use netsim_core::ProcessError;
use netsim_types::{ProcessId, SimTime};
use thiserror::Error;

/// Errors raised while driving an environment.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// `draw` was asked for a distribution outside the fixed table.
    #[error("Unknown distribution: {0}")]
    UnknownDistribution(String),

    /// The requested horizon lies before the current time.
    #[error("Horizon {horizon} is before current time {now}")]
    HorizonInPast { horizon: SimTime, now: SimTime },

    /// A process failed while being resumed.
    #[error("{process} failed at time {time}: {source}")]
    Process {
        time: SimTime,
        process: ProcessId,
        #[source]
        source: ProcessError,
    },
}
