//! `Read, file[, start[, end]]`
//!
//! Includes another script at the cursor. `file` is relative to the script
//! containing the command, `.tas` is appended, and each path component is
//! matched case-insensitively. The last component may be a unique prefix
//! (`9D_04` finds `9D_04_Curiosity.tas`).
//!
//! `start` and `end` are 1-based line numbers or labels. A label that can't
//! be found reads nothing for `start` and the rest of the file for `end`.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tasplay_shared::{AutoCompleteEntry, comment_line};
use xxhash_rust::xxh3::Xxh3;

use crate::command::{AutoComplete, AutoCompleteIter, Command, CommandSpec, ExecuteTiming, TasCommand};
use crate::error::CommandError;
use crate::input::RepeatInfo;
use crate::loader::ScriptParser;

pub const EXTENSION: &str = "tas";

pub(super) fn spec() -> CommandSpec {
    CommandSpec::new("Read", ReadCommand)
        .timing(ExecuteTiming::PARSE)
        .insert("Read, file, start label, end label")
        .auto_complete(ReadAutoComplete)
}

/// Inclusive 1-based line range of a `Read`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRange {
    pub start_line: usize,
    pub end_line: usize,
}

impl ReadRange {
    pub const ALL: ReadRange = ReadRange {
        start_line: 0,
        end_line: usize::MAX,
    };

    /// Resolve optional start/end tokens against `lines`
    pub fn resolve(lines: &[String], start: Option<&str>, end: Option<&str>) -> ReadRange {
        let start_line = start.map_or(0, |token| resolve_line(token, lines).unwrap_or(usize::MAX));
        let end_line = end.map_or(usize::MAX, |token| resolve_line(token, lines).unwrap_or(usize::MAX));
        ReadRange {
            start_line,
            end_line,
        }
    }
}

/// Line number for a token: the number itself, or the 1-based line of
/// `#<token>`
pub fn resolve_line(token: &str, lines: &[String]) -> Option<usize> {
    let token = token.trim();
    if let Ok(line) = token.parse::<usize>() {
        return Some(line);
    }
    lines
        .iter()
        .position(|line| comment_line::comment_text(line) == Some(token))
        .map(|index| index + 1)
}

struct ReadCommand;

impl TasCommand for ReadCommand {
    fn parse(&self, parser: &mut ScriptParser<'_>, command: &Command) -> Result<(), CommandError> {
        let args = command.args();
        let Some(target) = args.first() else {
            return Ok(());
        };

        let dir = script_dir(&command.file_path)?;
        let path = find_target_file(&dir, target)?;
        if is_same_file(&path, &command.file_path) {
            return Err(CommandError::SelfRead);
        }

        let lines = parser.file_lines(&path)?;
        let start = command.arg(1);
        let end = command.arg(2);
        for label in [start, end].into_iter().flatten() {
            if resolve_line(label, &lines).is_none() {
                parser.diagnostic(
                    &command.file_path,
                    command.file_line,
                    format!("Label '{label}' not found in {}", path.display()),
                );
            }
        }
        let range = ReadRange::resolve(&lines, start, end);

        let detail = format!(
            "Read, {}: line {} of {}",
            args.join(", "),
            command.file_line,
            command.file_path.display()
        );
        if parser.read_stack.contains(&detail) {
            let mut chain = parser.read_stack.clone();
            chain.push(detail);
            return Err(CommandError::ReadCycle(chain.join(" -> ")));
        }

        parser.read_stack.push(detail);
        let result = parser.read_file(
            &path,
            range.start_line,
            range.end_line,
            command.studio_line,
            RepeatInfo::NONE,
        );
        parser.read_stack.pop();

        result?;
        Ok(())
    }
}

fn script_dir(script: &Path) -> Result<PathBuf, CommandError> {
    match script.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => Ok(dir.to_path_buf()),
        _ => Ok(std::env::current_dir()?),
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn has_tas_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(EXTENSION))
}

/// Locate the script a `Read` names, relative to `dir`
pub fn find_target_file(dir: &Path, name: &str) -> Result<PathBuf, CommandError> {
    let exact = if has_tas_extension(Path::new(name)) {
        dir.join(name)
    } else {
        dir.join(format!("{name}.{EXTENSION}"))
    };
    if exact.is_file() {
        return Ok(exact);
    }

    let components: Vec<&str> = name
        .split(['/', '\\'])
        .filter(|component| !component.is_empty())
        .collect();
    let Some((file, dirs)) = components.split_last() else {
        return Err(CommandError::FileNotFound("no file name given".to_string()));
    };

    let mut real_dir = dir.to_path_buf();
    for component in dirs {
        match *component {
            "." => continue,
            ".." => {
                real_dir = real_dir
                    .parent()
                    .map(Path::to_path_buf)
                    .ok_or_else(|| CommandError::FileNotFound(format!("parent of {}", real_dir.display())))?;
            }
            _ => {
                let found = single_match(
                    entries(&real_dir, |path| path.is_dir())?,
                    |entry| entry.eq_ignore_ascii_case(component),
                    component,
                )?;
                real_dir = found;
            }
        }
    }

    let stem = Path::new(file)
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let candidates = entries(&real_dir, |path| path.is_file() && has_tas_extension(path))?;

    let stem_of = |path: &Path| {
        path.file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    };
    if let Some(exact) = candidates.iter().find(|path| stem_of(path) == stem) {
        return Ok(exact.clone());
    }
    single_match(candidates, |entry| entry.to_lowercase().starts_with(&stem), file)
}

fn entries(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>, CommandError> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if keep(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn single_match(
    candidates: Vec<PathBuf>,
    matches: impl Fn(&str) -> bool,
    name: &str,
) -> Result<PathBuf, CommandError> {
    let mut found: Vec<PathBuf> = candidates
        .into_iter()
        .filter(|path| {
            path.file_name()
                .is_some_and(|file_name| matches(&file_name.to_string_lossy()))
        })
        .collect();

    match found.len() {
        0 => Err(CommandError::FileNotFound(name.to_string())),
        1 => Ok(found.remove(0)),
        _ => Err(CommandError::AmbiguousFile {
            name: name.to_string(),
            candidates: found
                .iter()
                .filter_map(|path| path.file_name())
                .map(|file_name| file_name.to_string_lossy().into_owned())
                .collect(),
        }),
    }
}

/// Suggests files for the first argument and labels for the others
pub(crate) struct ReadAutoComplete;

impl AutoComplete for ReadAutoComplete {
    fn hash(&self, args: &[String], file_path: &Path, _file_line: usize) -> u64 {
        let mut hasher = Xxh3::new();
        hasher.update(&crate::command::hash_leading_args(args, file_path).to_le_bytes());

        // Suggestions change when the directory being completed does
        if let (Some(first), Some(dir)) = (args.first(), file_path.parent()) {
            let sub_dir = Path::new(first).parent().unwrap_or(Path::new(""));
            if let Ok(listing) = entries(&dir.join(sub_dir), |_| true) {
                for path in listing {
                    hasher.update(path.to_string_lossy().as_bytes());
                }
            }
        }
        hasher.digest()
    }

    fn entries(&self, args: &[String], file_path: &Path, _file_line: usize) -> AutoCompleteIter {
        let Some(dir) = file_path.parent().map(Path::to_path_buf) else {
            return Box::new(std::iter::empty());
        };

        match args.len() {
            1 => Box::new(file_entries(dir, args[0].clone())),
            2 | 3 => {
                let target = dir.join(format!("{}.{EXTENSION}", args[0]));
                let after = (args.len() == 3).then(|| args[1].clone());
                Box::new(label_entries(target, after, args.len() == 2))
            }
            _ => Box::new(std::iter::empty()),
        }
    }
}

/// Directories and scripts next to the partially typed path
fn file_entries(dir: PathBuf, typed: String) -> impl Iterator<Item = AutoCompleteEntry> + Send {
    // Nothing touches the filesystem until the first entry is pulled
    std::iter::once(()).flat_map(move |()| {
        let sub_dir = Path::new(&typed).parent().map(Path::to_path_buf).unwrap_or_default();
        let target = dir.join(&sub_dir);
        let mut prefix = sub_dir.to_string_lossy().replace('\\', "/");
        if !prefix.is_empty() {
            prefix.push('/');
        }

        let listing = entries(&target, |_| true).unwrap_or_default();
        let mut suggestions = vec![AutoCompleteEntry::new("../").with_prefix(prefix.clone()).not_done()];
        for path in &listing {
            let Some(name) = path.file_name().map(|name| name.to_string_lossy().into_owned()) else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            if path.is_dir() {
                suggestions.push(AutoCompleteEntry::new(format!("{name}/")).with_prefix(prefix.clone()).not_done());
            }
        }
        for path in &listing {
            if path.is_file() && has_tas_extension(path)
                && let Some(stem) = path.file_stem().map(|stem| stem.to_string_lossy().into_owned())
                && !stem.starts_with('.')
            {
                let mut entry = AutoCompleteEntry::new(stem).with_prefix(prefix.clone());
                entry.has_next = Some(true);
                suggestions.push(entry);
            }
        }
        suggestions
    })
}

/// Labels of `target` with their line numbers, streamed line by line
fn label_entries(
    target: PathBuf,
    after: Option<String>,
    has_next: bool,
) -> impl Iterator<Item = AutoCompleteEntry> + Send {
    let lines = fs::File::open(target)
        .ok()
        .map(|file| BufReader::new(file).lines().map_while(Result::ok));

    // End labels only come after the start label
    let mut past_start = after.is_none();
    lines.into_iter().flatten().zip(1..).filter_map(move |(line, file_line)| {
        if !comment_line::is_label(&line) {
            return None;
        }
        let label = comment_line::comment_text(&line)?.to_string();
        if !past_start {
            past_start = after.as_deref() == Some(label.as_str());
            return None;
        }
        let mut entry = AutoCompleteEntry::new(label).with_extra(format!("line {file_line}"));
        entry.has_next = Some(has_next);
        Some(entry)
    })
}
