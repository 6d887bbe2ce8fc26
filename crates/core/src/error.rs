//! Errors raised by agent logic.

use netsim_types::AgentId;
use thiserror::Error;

/// Failure inside a running process.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The process asked for a distribution the environment does not offer.
    #[error("Unknown distribution: {0}")]
    UnknownDistribution(String),

    /// A node attribute the process relies on is missing or has the wrong type.
    #[error("Attribute {attribute} missing or mistyped on {agent}")]
    Attribute { agent: AgentId, attribute: String },

    /// The process touched a node that is not in the network.
    #[error(transparent)]
    Network(#[from] crate::NetworkError),

    /// Any other failure in agent logic.
    #[error("Agent logic failed: {0}")]
    Failed(String),
}
