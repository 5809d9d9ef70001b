use arbor_blackboard::Client;

use crate::error::{SetupError, UpdateError};
use crate::status::Status;

/// A leaf node's work. The engine drives the lifecycle, the implementation only supplies hooks.
///
/// Per tick the engine calls `initialise` when the node was not already `RUNNING`, then
/// `update`. When `update` resolves to `SUCCESS` or `FAILURE`, `terminate` follows immediately.
/// `terminate(Status::Invalid)` is delivered when a parent preempts the node mid-run, which is
/// the place to release anything acquired in `initialise`.
pub trait Behaviour: 'static {
    /// One-off, possibly slow preparation. Runs once before the first tick.
    fn setup(&mut self) -> Result<(), SetupError> {
        Ok(())
    }

    fn initialise(&mut self) {}

    /// Must not return [`Status::Invalid`].
    fn update(&mut self) -> Result<Status, UpdateError>;

    fn terminate(&mut self, _new_status: Status) {}

    fn shutdown(&mut self) {}

    fn feedback_message(&self) -> &str {
        ""
    }

    /// Blackboard clients this behaviour reads or writes through.
    fn blackboard_clients(&self) -> Vec<&Client> {
        Vec::new()
    }
}
