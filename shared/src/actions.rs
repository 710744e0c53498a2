//! Action bitset for a single input frame
//!
//! Every letter of an action line maps to exactly one bit. The order of
//! [`ACTION_CHARS`] is the canonical serialization order and must not change,
//! since checksums are computed over the serialized text.

use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// Independent boolean actions held during a frame
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Actions: u32 {
        const LEFT = 1 << 0;
        const RIGHT = 1 << 1;
        const UP = 1 << 2;
        const DOWN = 1 << 3;
        const JUMP = 1 << 4;
        const DASH = 1 << 5;
        const GRAB = 1 << 6;
        const START = 1 << 7;
        const RESTART = 1 << 8;
        const FEATHER = 1 << 9;
        const JOURNAL = 1 << 10;
        const JUMP2 = 1 << 11;
        const DASH2 = 1 << 12;
        const CONFIRM = 1 << 13;
        const DEMO_DASH = 1 << 14;
        const DEMO_DASH2 = 1 << 15;
        const DASH_ONLY = 1 << 16;
        const LEFT_DASH_ONLY = 1 << 17;
        const RIGHT_DASH_ONLY = 1 << 18;
        const UP_DASH_ONLY = 1 << 19;
        const DOWN_DASH_ONLY = 1 << 20;
        const MOVE_ONLY = 1 << 21;
        const LEFT_MOVE_ONLY = 1 << 22;
        const RIGHT_MOVE_ONLY = 1 << 23;
        const UP_MOVE_ONLY = 1 << 24;
        const DOWN_MOVE_ONLY = 1 << 25;
        const PRESSED_KEY = 1 << 26;
    }
}

/// Letter table in canonical serialization order
pub const ACTION_CHARS: &[(char, Actions)] = &[
    ('L', Actions::LEFT),
    ('R', Actions::RIGHT),
    ('U', Actions::UP),
    ('D', Actions::DOWN),
    ('J', Actions::JUMP),
    ('K', Actions::JUMP2),
    ('Z', Actions::DEMO_DASH),
    ('V', Actions::DEMO_DASH2),
    ('X', Actions::DASH),
    ('C', Actions::DASH2),
    ('G', Actions::GRAB),
    ('S', Actions::START),
    ('Q', Actions::RESTART),
    ('N', Actions::JOURNAL),
    ('O', Actions::CONFIRM),
    ('A', Actions::DASH_ONLY),
    ('M', Actions::MOVE_ONLY),
    ('P', Actions::PRESSED_KEY),
    ('F', Actions::FEATHER),
];

/// Direction letters in the order they are written after `A` / `M`
pub const DIRECTION_CHARS: &[(char, Actions)] = &[
    ('L', Actions::LEFT),
    ('R', Actions::RIGHT),
    ('U', Actions::UP),
    ('D', Actions::DOWN),
];

// (direction, dash-only bit, move-only bit)
const AXIS_BITS: &[(Actions, Actions, Actions)] = &[
    (Actions::LEFT, Actions::LEFT_DASH_ONLY, Actions::LEFT_MOVE_ONLY),
    (Actions::RIGHT, Actions::RIGHT_DASH_ONLY, Actions::RIGHT_MOVE_ONLY),
    (Actions::UP, Actions::UP_DASH_ONLY, Actions::UP_MOVE_ONLY),
    (Actions::DOWN, Actions::DOWN_DASH_ONLY, Actions::DOWN_MOVE_ONLY),
];

impl Actions {
    /// Plain movement directions
    pub const DIRECTIONS: Actions = Actions::LEFT
        .union(Actions::RIGHT)
        .union(Actions::UP)
        .union(Actions::DOWN);

    /// Dash-only axis bits
    pub const DASH_ONLY_DIRECTIONS: Actions = Actions::LEFT_DASH_ONLY
        .union(Actions::RIGHT_DASH_ONLY)
        .union(Actions::UP_DASH_ONLY)
        .union(Actions::DOWN_DASH_ONLY);

    /// Move-only axis bits
    pub const MOVE_ONLY_DIRECTIONS: Actions = Actions::LEFT_MOVE_ONLY
        .union(Actions::RIGHT_MOVE_ONLY)
        .union(Actions::UP_MOVE_ONLY)
        .union(Actions::DOWN_MOVE_ONLY);

    /// Look up the action for a letter (case-insensitive)
    pub fn for_char(c: char) -> Option<Actions> {
        let upper = c.to_ascii_uppercase();
        ACTION_CHARS
            .iter()
            .find(|(ch, _)| *ch == upper)
            .map(|(_, action)| *action)
    }

    /// Look up the letter of a single action bit
    pub fn char_for(self) -> Option<char> {
        ACTION_CHARS
            .iter()
            .find(|(_, action)| *action == self)
            .map(|(ch, _)| *ch)
    }

    /// Look up a plain direction for a letter (case-insensitive)
    pub fn direction_for_char(c: char) -> Option<Actions> {
        let upper = c.to_ascii_uppercase();
        DIRECTION_CHARS
            .iter()
            .find(|(ch, _)| *ch == upper)
            .map(|(_, action)| *action)
    }

    /// Map a plain direction onto its dash-only axis bit
    pub fn to_dash_only(self) -> Actions {
        AXIS_BITS
            .iter()
            .find(|(dir, _, _)| *dir == self)
            .map_or(self, |(_, dash_only, _)| *dash_only)
    }

    /// Map a plain direction onto its move-only axis bit
    pub fn to_move_only(self) -> Actions {
        AXIS_BITS
            .iter()
            .find(|(dir, _, _)| *dir == self)
            .map_or(self, |(_, _, move_only)| *move_only)
    }

    /// Direction letters of the dash-only bits that are set, in canonical order
    pub fn dash_only_chars(self) -> impl Iterator<Item = char> {
        DIRECTION_CHARS
            .iter()
            .filter(move |(_, dir)| self.contains(dir.to_dash_only()))
            .map(|(ch, _)| *ch)
    }

    /// Direction letters of the move-only bits that are set, in canonical order
    pub fn move_only_chars(self) -> impl Iterator<Item = char> {
        DIRECTION_CHARS
            .iter()
            .filter(move |(_, dir)| self.contains(dir.to_move_only()))
            .map(|(ch, _)| *ch)
    }
}

// Stored as raw bits, same as other flag sets on the wire
impl Serialize for Actions {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Actions {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u32::deserialize(deserializer)?;
        Ok(Actions::from_bits_truncate(bits))
    }
}
