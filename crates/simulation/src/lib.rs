//! Deterministic discrete-event engine.
//!
//! Given the same network, seed and processes, an [`Environment`] produces
//! identical runs every time.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      Environment                        │
//! │                                                         │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     Event Queue (BTreeSet<EventKey>)               │ │
//! │  │     Ordered by: time, sequence                     │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │                             │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     processes: HashMap<ProcessId, Box<dyn Process>>│ │
//! │  │     Each resumed with a Context until it suspends  │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │                             │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     Step::Timeout(d) → reschedule at now + d       │ │
//! │  └────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────┘
//! ```

mod environment;
mod error;
mod event_queue;

pub use environment::{Environment, SimulationStats};
pub use error::SimulationError;
pub use event_queue::EventKey;
