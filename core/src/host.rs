//! Interface to the game that consumes playback

use crate::error::CommandError;
use crate::input::InputFrame;

/// Game-side callbacks driven by [`InputController`](crate::InputController).
///
/// Only [`Host::apply_inputs`] is required; the rest default to a host that
/// never loads, isn't restricted and has no console.
pub trait Host {
    /// Whether the game is in a loading screen; playback pauses while true.
    fn is_loading(&self) -> bool {
        false
    }

    /// Feed the inputs for the current frame.
    fn apply_inputs(&mut self, frame: &InputFrame);

    /// Whether commands that aren't legal in restricted mode must be skipped.
    fn is_restricted_mode_enabled(&self) -> bool {
        false
    }

    /// Toggle safe mode, where inputs the game considers unsafe are refused.
    fn set_safe_mode(&mut self, _safe: bool) {}

    /// Run a console command for the `Console` script command.
    fn console(&mut self, _args: &[String]) -> Result<(), CommandError> {
        Err(CommandError::Unsupported)
    }
}
