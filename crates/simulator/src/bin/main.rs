//! Netsim Simulator
//!
//! Runs the flip model over the default seeds and prints a summary per point.
//!
//! `NETSIM_RESULTS_DIR` and `NETSIM_RUNTIME` override the results directory
//! and the simulated time per point; `RUST_LOG` sets the log filter.

use netsim_simulator::{run, FlipConfig};
use std::env;
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn config_from_env() -> FlipConfig {
    let mut config = FlipConfig::default();
    if let Ok(dir) = env::var("NETSIM_RESULTS_DIR") {
        config = config.with_results_dir(dir);
    }
    if let Ok(raw) = env::var("NETSIM_RUNTIME") {
        match raw.parse() {
            Ok(runtime) => config = config.with_runtime(runtime),
            Err(error) => warn!(value = %raw, %error, "Ignoring NETSIM_RUNTIME"),
        }
    }
    config
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run(config_from_env()) {
        Ok(report) => {
            for point in &report.points {
                println!("{point}");
            }
            if report.success() {
                ExitCode::SUCCESS
            } else {
                eprintln!("Some points failed");
                ExitCode::FAILURE
            }
        }
        Err(error) => {
            eprintln!("Error: {error}");
            ExitCode::FAILURE
        }
    }
}
