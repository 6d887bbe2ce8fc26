//! Core abstractions for netsim.
//!
//! This crate defines what the rest of the workspace builds on:
//!
//! - [`Network`]: the node/edge container agents observe and mutate
//! - [`Agent`] and [`Node`]: node identifiers, with agents carrying a shared
//!   [`Behavior`]
//! - [`Process`] and [`Step`]: the resumable-task contract driven by the
//!   event engine
//! - [`Context`]: what a process sees while it runs
//!
//! Nothing here schedules anything; scheduling lives in `netsim-simulation`.

mod agent;
mod context;
mod error;
mod network;
mod traits;

pub use agent::{Agent, Node, NodeLabel};
pub use context::{draw, Context, SimRng, DRAW_TABLE};
pub use error::ProcessError;
pub use network::{Network, NetworkError, NetworkKind, NetworkSnapshot};
pub use traits::{Behavior, Process, Step};
