//! Line-based `.qs.cfg` configuration files.
//!
//! Every non-blank, non-comment line is either an action or a variable default:
//!
//! ```text
//! # comment
//! engine := google
//! search = xdg-open https://www.${engine}.com/${0?}?q=${0}${end}
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::position::{Location, Span};
use crate::template::is_identifier_char;

/// What a config line declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// `name = template`
    Action,
    /// `name := value`
    VariableDefault,
}

impl EntryKind {
    #[must_use]
    pub fn operator(self) -> &'static str {
        match self {
            EntryKind::Action => "=",
            EntryKind::VariableDefault => ":=",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.operator())
    }
}

/// A single parsed config line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    pub key: String,
    pub kind: EntryKind,
    pub raw_value: String,
    pub source_file: PathBuf,
    pub source_line: usize,
}

/// Why a config line was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    #[error("Expected '=' or ':='")]
    MissingOperator,
    #[error("Unexpected character '{ch}' ({})", code_point(.ch))]
    UnexpectedCharacter { ch: char },
    #[error("No value after '{kind}'")]
    MissingValue { kind: EntryKind },
    #[error("Action template cannot start with '#'")]
    ActionStartsWithHash,
    #[error("Argument value cannot start with '#'")]
    ArgumentStartsWithHash,
}

fn code_point(ch: &char) -> u32 {
    u32::from(*ch)
}

/// A malformed config line. Always fatal to the invocation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Error in {path}: {reason}")]
pub struct ConfigError {
    pub path: PathBuf,
    pub line: usize,
    pub column: usize,
    pub reason: LineError,
}

/// Parse one physical line. Blank lines and comments yield `None`.
///
/// # Errors
///
/// Returns `ConfigError` if the line is neither blank, a comment, an action
/// nor a variable default.
pub fn parse_line(
    text: &str,
    file: &Path,
    line_no: usize,
) -> Result<Option<ConfigEntry>, ConfigError> {
    let content = text.trim_start();
    if content.is_empty() || content.starts_with('#') {
        return Ok(None);
    }
    let fail = |reason: LineError, span: Span| ConfigError {
        path: file.to_path_buf(),
        line: line_no,
        column: Location::locate(text, span).column,
        reason,
    };

    let Some(eq) = text.find('=') else {
        return Err(fail(LineError::MissingOperator, Span::at(text.len())));
    };
    let (op_start, kind) = if text[..eq].ends_with(':') {
        (eq - 1, EntryKind::VariableDefault)
    } else {
        (eq, EntryKind::Action)
    };

    let key = text[..op_start].trim();
    let key_start = text.len() - content.len();
    if key.is_empty() {
        let ch = if op_start == eq { '=' } else { ':' };
        return Err(fail(
            LineError::UnexpectedCharacter { ch },
            Span::at(op_start),
        ));
    }
    if let Some((offset, ch)) = key.char_indices().find(|(_, c)| !is_identifier_char(*c)) {
        let start = key_start + offset;
        return Err(fail(
            LineError::UnexpectedCharacter { ch },
            Span::new(start, start + ch.len_utf8()),
        ));
    }

    let value_start = eq + 1;
    let value = text[value_start..].trim();
    if value.is_empty() {
        return Err(fail(LineError::MissingValue { kind }, Span::at(text.len())));
    }
    if value.starts_with('#') {
        let reason = match kind {
            EntryKind::Action => LineError::ActionStartsWithHash,
            EntryKind::VariableDefault => LineError::ArgumentStartsWithHash,
        };
        let hash = value_start + text[value_start..].find('#').unwrap_or_default();
        return Err(fail(reason, Span::at(hash)));
    }

    Ok(Some(ConfigEntry {
        key: key.to_string(),
        kind,
        raw_value: value.to_string(),
        source_file: file.to_path_buf(),
        source_line: line_no,
    }))
}

/// Parse a whole config file, stopping at the first bad line.
///
/// # Errors
///
/// Returns the `ConfigError` of the first malformed line.
pub fn parse_entries(path: &Path, contents: &str) -> Result<Vec<ConfigEntry>, ConfigError> {
    contents
        .lines()
        .enumerate()
        .filter_map(|(index, line)| parse_line(line, path, index + 1).transpose())
        .collect()
}
