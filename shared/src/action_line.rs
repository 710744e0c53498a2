//! Action line codec
//!
//! An action line is a duration followed by comma-separated action letters:
//!
//! ```text
//!   30,R,J
//!    5,AUL,X
//!   12,F,90,0.5
//! ```
//!
//! Letters toggle their bit, so `30,J,J` holds nothing. `A` and `M` open a
//! run of direction letters that land on the dash-only / move-only axis
//! bits, `P` opens a run of custom key letters, and `F` consumes the rest of
//! the line as `angle[,magnitude]`.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::actions::{ACTION_CHARS, Actions};

/// Token separator
pub const DELIMITER: char = ',';
/// Longest duration a single line may hold
pub const MAX_FRAMES: u32 = 9999;
/// Width the duration is right-aligned to when serialized
pub const MAX_FRAMES_DIGITS: usize = 4;

pub const MIN_FEATHER_ANGLE: f32 = 0.0;
pub const MAX_FEATHER_ANGLE: f32 = 360.0;
pub const MIN_FEATHER_MAGNITUDE: f32 = 0.26;
pub const MAX_FEATHER_MAGNITUDE: f32 = 1.0;

/// One parsed action line
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActionLine {
    /// Ticks this line is held for, always in `1..=MAX_FRAMES`
    pub frames: u32,
    pub actions: Actions,
    /// Degrees, clockwise from up
    pub feather_angle: Option<f32>,
    pub feather_magnitude: Option<f32>,
    /// Extra keys, only present while [`Actions::PRESSED_KEY`] is set
    pub custom_keys: BTreeSet<char>,
}

/// Which letter run is currently open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpenRun {
    None,
    DashOnly,
    MoveOnly,
    PressedKey,
}

impl ActionLine {
    /// Create a line holding `actions` for `frames` ticks
    pub fn new(frames: u32, actions: Actions) -> Self {
        Self {
            frames: frames.clamp(1, MAX_FRAMES),
            actions,
            ..Default::default()
        }
    }

    /// Parse a line, returning `None` if it isn't an action line
    ///
    /// A line qualifies when everything before the first delimiter is a
    /// positive integer. Unknown letters are ignored, as is malformed
    /// feather data.
    pub fn parse(line: &str) -> Option<ActionLine> {
        let line = line.trim();
        let (frames_text, rest) = match line.split_once(DELIMITER) {
            Some((frames, rest)) => (frames.trim(), rest),
            None => (line, ""),
        };

        let frames = parse_frames(frames_text)?;
        let mut parsed = ActionLine {
            frames,
            ..Default::default()
        };

        let mut open = OpenRun::None;
        for (index, c) in rest.char_indices() {
            if c == DELIMITER || c.is_whitespace() {
                open = OpenRun::None;
                continue;
            }

            if parsed.toggle_in_run(open, c) {
                continue;
            }
            open = OpenRun::None;

            let Some(action) = Actions::for_char(c) else {
                continue;
            };

            if action == Actions::FEATHER {
                parsed.actions.toggle(Actions::FEATHER);
                parsed.parse_feather(&rest[index + c.len_utf8()..]);
                break;
            }

            parsed.actions.toggle(action);
            open = if action == Actions::DASH_ONLY {
                OpenRun::DashOnly
            } else if action == Actions::MOVE_ONLY {
                OpenRun::MoveOnly
            } else if action == Actions::PRESSED_KEY {
                OpenRun::PressedKey
            } else {
                OpenRun::None
            };
        }

        parsed.normalize();
        Some(parsed)
    }

    /// Whether `text` parses as an action line
    pub fn is_action_line(text: &str) -> bool {
        ActionLine::parse(text).is_some()
    }

    /// Apply `c` to the open run, returns false if the run doesn't take it
    fn toggle_in_run(&mut self, open: OpenRun, c: char) -> bool {
        match open {
            OpenRun::DashOnly => match Actions::direction_for_char(c) {
                Some(direction) => {
                    self.actions.toggle(direction.to_dash_only());
                    true
                }
                None => false,
            },
            OpenRun::MoveOnly => match Actions::direction_for_char(c) {
                Some(direction) => {
                    self.actions.toggle(direction.to_move_only());
                    true
                }
                None => false,
            },
            OpenRun::PressedKey if c.is_ascii_alphabetic() => {
                let key = c.to_ascii_uppercase();
                if !self.custom_keys.remove(&key) {
                    self.custom_keys.insert(key);
                }
                true
            }
            OpenRun::PressedKey | OpenRun::None => false,
        }
    }

    fn parse_feather(&mut self, text: &str) {
        let text = text.trim_start().strip_prefix(DELIMITER).unwrap_or(text);
        let mut tokens = text.split(DELIMITER).map(str::trim);

        if let Some(angle) = tokens.next().and_then(parse_float) {
            self.feather_angle = Some(angle.clamp(MIN_FEATHER_ANGLE, MAX_FEATHER_ANGLE));
        }
        if let Some(magnitude) = tokens.next().and_then(parse_float) {
            self.feather_magnitude =
                Some(magnitude.clamp(MIN_FEATHER_MAGNITUDE, MAX_FEATHER_MAGNITUDE));
        }
    }

    /// Drop sub-state whose marker bit ended up toggled off
    fn normalize(&mut self) {
        if !self.actions.contains(Actions::DASH_ONLY) {
            self.actions.remove(Actions::DASH_ONLY_DIRECTIONS);
        }
        if !self.actions.contains(Actions::MOVE_ONLY) {
            self.actions.remove(Actions::MOVE_ONLY_DIRECTIONS);
        }
        if !self.actions.contains(Actions::PRESSED_KEY) {
            self.custom_keys.clear();
        }
        if !self.actions.contains(Actions::FEATHER) {
            self.feather_angle = None;
            self.feather_magnitude = None;
        }
    }

    /// Analog stick position for the feather angle/magnitude, `(x, y)` with up positive
    pub fn feather_vector(&self) -> Option<(f32, f32)> {
        if !self.actions.contains(Actions::FEATHER) {
            return None;
        }
        let angle = self.feather_angle.unwrap_or(0.0).to_radians();
        let magnitude = self.feather_magnitude.unwrap_or(MAX_FEATHER_MAGNITUDE);
        Some((angle.sin() * magnitude, angle.cos() * magnitude))
    }
}

fn parse_frames(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Digit strings too long for u64 still mean "a lot"
    let frames = text.parse::<u64>().unwrap_or(u64::MAX);
    match frames {
        0 => None,
        n => Some(n.min(MAX_FRAMES as u64) as u32),
    }
}

fn parse_float(text: &str) -> Option<f32> {
    text.parse::<f32>().ok().filter(|value| value.is_finite())
}

impl fmt::Display for ActionLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>width$}", self.frames, width = MAX_FRAMES_DIGITS)?;

        for (ch, action) in ACTION_CHARS {
            if *action == Actions::FEATHER || !self.actions.contains(*action) {
                continue;
            }
            write!(f, "{DELIMITER}{ch}")?;
            if *action == Actions::DASH_ONLY {
                for dir in self.actions.dash_only_chars() {
                    write!(f, "{dir}")?;
                }
            } else if *action == Actions::MOVE_ONLY {
                for dir in self.actions.move_only_chars() {
                    write!(f, "{dir}")?;
                }
            } else if *action == Actions::PRESSED_KEY {
                for key in &self.custom_keys {
                    write!(f, "{key}")?;
                }
            }
        }

        if self.actions.contains(Actions::FEATHER) {
            write!(f, "{DELIMITER}F{DELIMITER}")?;
            if let Some(angle) = self.feather_angle {
                write!(f, "{angle}")?;
            }
            if let Some(magnitude) = self.feather_magnitude {
                write!(f, "{DELIMITER}{magnitude}")?;
            }
        }

        Ok(())
    }
}
