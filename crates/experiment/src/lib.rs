//! Experiment orchestration for netsim.
//!
//! ```text
//!   Grid ──iter──► GridPoint ──► Experiment hooks ──► Environment::run_until
//!                     │                                     │
//!                     └── hash ──► LoggerFactory ──► Logger ◄┘ (every interval)
//!                                         │
//!                                  log file (JSON batches)
//!                                         │
//!                     from_grid ◄── ResultSet::from_path
//! ```
//!
//! - [`Grid`]: named parameter dimensions and their Cartesian product
//! - [`SimulationCase`]: runs an [`Experiment`] over every grid point
//! - [`Logger`]: periodic, buffered observation recorder with a bounded
//!   buffer
//! - [`ResultSet`]: observations loaded back from a log

mod case;
mod grid;
mod log_factory;
mod logger;
mod results;

pub use case::{run_simulation, CaseError, Experiment, PointOutcome, PointStatus, SimulationCase};
pub use grid::{Grid, GridError, GridIter, GridPoint};
pub use log_factory::{unix_timestamp, LoggerFactory};
pub use logger::{Capacity, LogError, LogOutput, Logger, LoggerHandle, StateFn};
pub use results::{from_grid, ResultSet, ResultsError};
