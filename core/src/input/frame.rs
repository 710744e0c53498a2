//! A single timeline entry

use std::path::Path;
use std::sync::Arc;

use tasplay_shared::{ActionLine, Actions};

/// Where a frame came from when it was expanded out of a `Repeat` block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepeatInfo {
    /// 1-based iteration, 0 outside a repeat block
    pub index: u32,
    pub count: u32,
}

impl RepeatInfo {
    pub const NONE: RepeatInfo = RepeatInfo { index: 0, count: 0 };

    pub fn new(index: u32, count: u32) -> Self {
        Self { index, count }
    }

    pub fn is_repeat(&self) -> bool {
        self.count > 0
    }
}

/// One action line placed on the timeline.
///
/// Holds `line.frames` ticks. The canonical text is cached since the
/// checksum hashes it for every entry.
#[derive(Debug, Clone, PartialEq)]
pub struct InputFrame {
    pub line: ActionLine,
    pub file_path: Arc<Path>,
    /// 1-based line in `file_path`
    pub file_line: usize,
    /// 0-based editor row; included files report the row of their `Read`
    pub studio_line: usize,
    pub repeat: RepeatInfo,
    text: String,
}

impl InputFrame {
    pub fn new(
        line: ActionLine,
        file_path: Arc<Path>,
        file_line: usize,
        studio_line: usize,
        repeat: RepeatInfo,
    ) -> Self {
        let text = line.to_string();
        Self {
            line,
            file_path,
            file_line,
            studio_line,
            repeat,
            text,
        }
    }

    pub fn frames(&self) -> u32 {
        self.line.frames
    }

    pub fn actions(&self) -> Actions {
        self.line.actions
    }

    pub fn has(&self, actions: Actions) -> bool {
        self.line.actions.contains(actions)
    }

    /// Canonical serialized form
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Digital stick direction, `(x, y)` with right and up positive
    pub fn direction(&self) -> (i32, i32) {
        axis(self.line.actions, Actions::LEFT, Actions::RIGHT, Actions::DOWN, Actions::UP)
    }

    /// Direction used only for dashes while `A` is held
    pub fn dash_only_direction(&self) -> Option<(i32, i32)> {
        self.has(Actions::DASH_ONLY).then(|| {
            axis(
                self.line.actions,
                Actions::LEFT_DASH_ONLY,
                Actions::RIGHT_DASH_ONLY,
                Actions::DOWN_DASH_ONLY,
                Actions::UP_DASH_ONLY,
            )
        })
    }

    /// Direction used only for movement while `M` is held
    pub fn move_only_direction(&self) -> Option<(i32, i32)> {
        self.has(Actions::MOVE_ONLY).then(|| {
            axis(
                self.line.actions,
                Actions::LEFT_MOVE_ONLY,
                Actions::RIGHT_MOVE_ONLY,
                Actions::DOWN_MOVE_ONLY,
                Actions::UP_MOVE_ONLY,
            )
        })
    }

    /// Analog stick position from feather data
    pub fn analog(&self) -> Option<(f32, f32)> {
        self.line.feather_vector()
    }
}

fn axis(actions: Actions, neg_x: Actions, pos_x: Actions, neg_y: Actions, pos_y: Actions) -> (i32, i32) {
    let value = |neg: Actions, pos: Actions| {
        i32::from(actions.contains(pos)) - i32::from(actions.contains(neg))
    };
    (value(neg_x, pos_x), value(neg_y, pos_y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(text: &str) -> InputFrame {
        InputFrame::new(
            ActionLine::parse(text).unwrap(),
            Arc::from(Path::new("a.tas")),
            1,
            0,
            RepeatInfo::NONE,
        )
    }

    #[test]
    fn test_text_is_canonical() {
        assert_eq!(frame("10,j,r").text(), "  10,R,J");
    }

    #[test]
    fn test_directions() {
        assert_eq!(frame("1,L,U").direction(), (-1, 1));
        assert_eq!(frame("1,L,R").direction(), (0, 0));
        assert_eq!(frame("1,X").dash_only_direction(), None);
        assert_eq!(frame("1,AR,L").dash_only_direction(), Some((1, 0)));
        assert_eq!(frame("1,AR,L").direction(), (-1, 0));
        assert_eq!(frame("1,MD").move_only_direction(), Some((0, -1)));
    }
}
