//! Timeline data produced by the loader

mod frame;
mod timeline;

pub use frame::{InputFrame, RepeatInfo};
pub use timeline::{Comment, Diagnostic, FastForward, ScriptTimeline};
