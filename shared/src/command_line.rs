//! Command line tokenizer
//!
//! A command line starts with a letter. The first separator found after the
//! name (a run of whitespace, or a comma with optional whitespace around it)
//! is used to split every remaining argument, so `Read, a b, 3` has the two
//! arguments `a b` and `3`.
//!
//! Quotes, brackets and braces group text so it may contain the separator.
//! Quotes are stripped, brackets and braces are kept. `\` escapes the next
//! character, with `\n` producing a newline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator used when a command line is formatted from scratch
pub const DEFAULT_SEPARATOR: &str = ", ";

/// Why a line could not be tokenized
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandLineError {
    #[error("not a command line")]
    NotACommand,
    #[error("unopened '{0}' at column {1}")]
    UnopenedGroup(char, usize),
    #[error("escape at end of line")]
    TrailingEscape,
}

/// A tokenized command line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandLine {
    /// Command name exactly as written
    pub command: String,
    pub arguments: Vec<String>,
    /// Separator found after the command name, empty without arguments
    pub separator: String,
    /// Trimmed source text
    pub original: String,
}

impl CommandLine {
    /// Tokenize a line
    pub fn parse(line: &str) -> Result<CommandLine, CommandLineError> {
        let trimmed = line.trim();
        if !trimmed.chars().next().is_some_and(char::is_alphabetic) {
            return Err(CommandLineError::NotACommand);
        }

        let Some((separator_start, separator)) = find_separator(trimmed) else {
            return Ok(CommandLine {
                command: trimmed.to_string(),
                arguments: Vec::new(),
                separator: String::new(),
                original: trimmed.to_string(),
            });
        };

        let arguments = split_arguments(&trimmed[separator_start + separator.len()..], separator)?;

        Ok(CommandLine {
            command: trimmed[..separator_start].to_string(),
            arguments,
            separator: separator.to_string(),
            original: trimmed.to_string(),
        })
    }

    /// Case-insensitive name comparison
    pub fn is_command(&self, name: &str) -> bool {
        self.command.eq_ignore_ascii_case(name)
    }
}

/// Locate the first separator, returning its byte offset and text
fn find_separator(text: &str) -> Option<(usize, &str)> {
    let (start, first) = text
        .char_indices()
        .find(|(_, c)| c.is_whitespace() || *c == ',')?;

    let rest = &text[start..];
    let len = if first.is_whitespace() {
        // Whitespace run wins over a comma that follows it
        rest.find(|c: char| !c.is_whitespace()).unwrap_or(rest.len())
    } else {
        let after_comma = &rest[1..];
        1 + after_comma
            .find(|c: char| !c.is_whitespace())
            .unwrap_or(after_comma.len())
    };

    Some((start, &rest[..len]))
}

fn split_arguments(text: &str, separator: &str) -> Result<Vec<String>, CommandLineError> {
    let mut arguments = Vec::new();
    let mut current = String::new();
    let mut groups: Vec<char> = Vec::new();

    let mut index = 0;
    while index < text.len() {
        let rest = &text[index..];
        if groups.is_empty() && rest.starts_with(separator) {
            arguments.push(std::mem::take(&mut current));
            index += separator.len();
            continue;
        }

        let Some(c) = rest.chars().next() else {
            break;
        };
        index += c.len_utf8();

        match c {
            '"' if groups.last().is_none_or(|open| *open == '"') => {
                if groups.last() == Some(&'"') {
                    groups.pop();
                } else {
                    groups.push('"');
                }
            }
            '[' | '{' => {
                groups.push(c);
                current.push(c);
            }
            ']' | '}' => {
                let opener = if c == ']' { '[' } else { '{' };
                if groups.last() != Some(&opener) {
                    return Err(CommandLineError::UnopenedGroup(c, index - 1));
                }
                groups.pop();
                current.push(c);
            }
            '\\' => {
                let Some(next) = text[index..].chars().next() else {
                    return Err(CommandLineError::TrailingEscape);
                };
                index += next.len_utf8();
                current.push(if next == 'n' { '\n' } else { next });
            }
            _ => current.push(c),
        }
    }

    arguments.push(current);
    Ok(arguments)
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command)?;
        for argument in &self.arguments {
            write!(f, "{}{argument}", self.separator)?;
        }
        Ok(())
    }
}
