//! Execution context handed to a process on each resume.

use crate::{Network, ProcessError};
use netsim_types::SimTime;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Exp1, StandardNormal};

/// Random number generator used by every netsim component.
pub type SimRng = ChaCha8Rng;

/// Names accepted by [`draw`], each with fixed default parameters.
pub const DRAW_TABLE: &[&str] = &["normal", "uniform", "exponential"];

/// Draw one sample from a small table of named distributions.
///
/// - `normal`: mean 0, standard deviation 1
/// - `uniform`: `[0, 1)`
/// - `exponential`: rate 1
///
/// Returns `None` for any other name.
pub fn draw(rng: &mut impl Rng, name: &str) -> Option<f64> {
    match name {
        "normal" => Some(StandardNormal.sample(rng)),
        "uniform" => Some(rng.gen::<f64>()),
        "exponential" => Some(Exp1.sample(rng)),
        _ => None,
    }
}

/// What a process can see and touch while it runs.
pub struct Context<'a> {
    now: SimTime,
    network: &'a mut Network,
    rng: &'a mut SimRng,
}

impl<'a> Context<'a> {
    pub fn new(now: SimTime, network: &'a mut Network, rng: &'a mut SimRng) -> Self {
        Self { now, network, rng }
    }

    /// Current simulated time.
    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn network(&self) -> &Network {
        &*self.network
    }

    pub fn network_mut(&mut self) -> &mut Network {
        &mut *self.network
    }

    /// The environment's random stream.
    pub fn rng(&mut self) -> &mut SimRng {
        &mut *self.rng
    }

    /// Sample the environment's named distribution table.
    pub fn draw(&mut self, name: &str) -> Result<f64, ProcessError> {
        draw(&mut *self.rng, name).ok_or_else(|| ProcessError::UnknownDistribution(name.to_string()))
    }
}
