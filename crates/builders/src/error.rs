//! Error types for network construction.

use netsim_core::NetworkError;
use thiserror::Error;

/// Errors raised while declaring or building a network.
///
/// Declaration errors (`UnknownDistribution`, `MissingRandomStream`,
/// `InvalidDistributionParameters`, `InvalidEdgeDistribution`) surface from
/// setters, before any build starts. The rest surface from `build()`.
#[derive(Debug, Error)]
pub enum BuildError {
    /// No stream method or registered family has this name.
    #[error("Unknown distribution: {name}")]
    UnknownDistribution { name: String },

    /// A stochastic attribute was declared on a builder without a random stream.
    #[error("Attribute {attribute} is stochastic but no random stream was supplied")]
    MissingRandomStream { attribute: String },

    /// The distribution exists but its parameters are unusable.
    #[error("Invalid parameters for {name}: {reason}")]
    InvalidDistributionParameters { name: String, reason: String },

    /// Edge generation by distribution needs a distribution, not a constant.
    #[error("Edge generation requires a distribution specification, got a constant")]
    InvalidEdgeDistribution,

    /// An edge-generation sample could not be compared with the threshold.
    #[error("Distribution {name} produced a non-numeric sample")]
    NonNumericSample { name: String },

    /// A sampler returned a different number of values than requested.
    #[error("Attribute {attribute}: expected {expected} samples, got {actual}")]
    SizeMismatch {
        attribute: String,
        expected: usize,
        actual: usize,
    },

    /// Populating the network failed.
    #[error(transparent)]
    Network(#[from] NetworkError),
}
