//! Netsim Simulator
//!
//! A ready-made experiment built on the netsim crates: a random graph of
//! agents that flip a boolean `state` attribute, swept over seeds, with
//! every point logged to its own file.
//!
//! # Example
//!
//! ```ignore
//! use netsim_simulator::{run, FlipConfig};
//!
//! let config = FlipConfig::new(50, [0, 1, 2])
//!     .with_runtime(10)
//!     .with_results_dir("results");
//!
//! let report = run(config)?;
//! for point in &report.points {
//!     println!("{point}");
//! }
//! ```

pub mod config;
pub mod flip;
pub mod runner;

pub use config::{ConfigError, FlipConfig};
pub use flip::{seed_of, FlipExperiment, Flipper, STATE};
pub use runner::{run, PointSummary, SimulationReport, SimulatorError};
