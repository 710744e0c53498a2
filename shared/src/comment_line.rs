//! Comment and label lines
//!
//! Every line starting with `#` is a comment. A comment whose text directly
//! follows the `#` (`#start`, not `# start` or `##start`) is also a label
//! that `Read`, `Play` and next-label fast-forwarding can target.

pub const PREFIX: char = '#';

pub fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with(PREFIX)
}

/// Whether the line is a navigable label
pub fn is_label(line: &str) -> bool {
    line.trim_start()
        .strip_prefix(PREFIX)
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| !c.is_whitespace() && c != PREFIX)
}

/// Comment text with the leading `#` removed and trimmed
pub fn comment_text(line: &str) -> Option<&str> {
    line.trim().strip_prefix(PREFIX).map(str::trim)
}

/// Whether the line is the label `#<label>` after trimming
pub fn matches_label(line: &str, label: &str) -> bool {
    is_label(line) && comment_text(line) == Some(label.trim())
}
