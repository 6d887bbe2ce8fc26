//! Core traits for resumable processes and agent behaviour.

use crate::{Agent, Context, ProcessError};
use netsim_types::SimTime;

/// What a process asks of the engine when it hands control back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Resume this process again after the given number of time units.
    Timeout(SimTime),

    /// The process is done and must not be resumed again.
    Finished,
}

/// A resumable task driven by the event engine.
///
/// Each call to `resume` runs until the next suspension point and returns
/// what the process is waiting for. The engine owns scheduling; cancelling a
/// process means the engine simply stops resuming it.
///
/// # Guarantees expected from implementors
///
/// - **Synchronous**: `resume` never blocks
/// - **Deterministic**: given the same context (time, network, RNG state),
///   a process takes the same step
///
/// # Example
///
/// ```ignore
/// struct Flip;
///
/// impl Process for Flip {
///     fn resume(&mut self, ctx: &mut Context<'_>) -> Result<Step, ProcessError> {
///         if ctx.draw("normal")? > 0.5 {
///             // mutate node attributes through ctx.network_mut()
///         }
///         Ok(Step::Timeout(1))
///     }
/// }
/// ```
pub trait Process {
    /// Run until the next suspension point.
    ///
    /// An `Err` terminates the current run of the environment; the caller
    /// decides whether that fails a whole sweep or a single grid point.
    fn resume(&mut self, ctx: &mut Context<'_>) -> Result<Step, ProcessError>;
}

impl<F> Process for F
where
    F: FnMut(&mut Context<'_>) -> Result<Step, ProcessError>,
{
    fn resume(&mut self, ctx: &mut Context<'_>) -> Result<Step, ProcessError> {
        self(ctx)
    }
}

/// The behaviour capability attached to an [`Agent`].
///
/// Agents are plain ids; all dynamics live here. State belongs in node
/// attributes, not in the behaviour, so one behaviour value is shared by
/// every agent built from the same factory.
pub trait Behavior {
    /// Create the resumable action for the given agent.
    fn run(&self, agent: &Agent) -> Box<dyn Process>;

    /// Name of the behaviour variant.
    ///
    /// Two agents are equal only when both their ids and their kinds match.
    fn kind(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
