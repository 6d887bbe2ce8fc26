//! Shared types for netsim.
//!
//! Values carried by node/edge attributes and grid dimensions, identifier
//! newtypes, and the content hash used to name persisted results.

mod hash;
mod identifiers;
mod value;

pub use hash::Hash;
pub use identifiers::{AgentId, ProcessId, SimTime};
pub use value::{Attributes, Value};
