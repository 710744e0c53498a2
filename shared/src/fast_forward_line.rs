//! Fast-forward marker lines
//!
//! ```text
//! ***        fast-forward to here at the default speed
//! ***10      ... at 10 frames per update
//! ***S       ... and save state on arrival
//! ***!S0.5   force stop, even past a label target
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

pub const PREFIX: &str = "***";

/// A parsed `***` line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FastForwardLine {
    pub force_stop: bool,
    pub save_state: bool,
    /// Speed text as written, kept for display
    pub speed_text: String,
    /// `None` when missing or not a number
    pub speed: Option<f32>,
}

impl FastForwardLine {
    pub fn parse(line: &str) -> Option<FastForwardLine> {
        let mut rest = line.trim_start().strip_prefix(PREFIX)?;

        let force_stop = match rest.strip_prefix('!') {
            Some(stripped) => {
                rest = stripped;
                true
            }
            None => false,
        };

        let save_state = match rest.strip_prefix(['S', 's']) {
            Some(stripped) => {
                rest = stripped;
                true
            }
            None => false,
        };

        let speed_text = rest.trim().to_string();
        let speed = speed_text
            .parse::<f32>()
            .ok()
            .filter(|speed| speed.is_finite() && *speed > 0.0);

        Some(FastForwardLine {
            force_stop,
            save_state,
            speed_text,
            speed,
        })
    }

    pub fn is_fast_forward(line: &str) -> bool {
        line.trim_start().starts_with(PREFIX)
    }
}

impl fmt::Display for FastForwardLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(PREFIX)?;
        if self.force_stop {
            f.write_str("!")?;
        }
        if self.save_state {
            f.write_str("S")?;
        }
        f.write_str(&self.speed_text)
    }
}
