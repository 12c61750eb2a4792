use std::{fmt::Display, path::PathBuf};

use thiserror::Error;

/// Location of a token in the parsed document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// 1-based line number
    pub line: usize,
    /// 1-based column, counted in characters
    pub column: usize,
    /// Byte offset into the input
    pub offset: usize,
}

/// Byte offsets of the line starts of one document, so positions can be
/// looked up without rescanning the text
#[derive(Debug, Clone)]
pub(crate) struct LineIndex {
    starts: Vec<usize>,
    /// Columns equal byte distances in pure ASCII text
    ascii: bool,
}

impl LineIndex {
    pub(crate) fn new(input: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(input.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        LineIndex {
            starts,
            ascii: input.is_ascii(),
        }
    }

    pub(crate) fn position(&self, input: &str, offset: usize) -> Position {
        let offset = offset.min(input.len());
        let line = self.starts.partition_point(|&start| start <= offset);
        let line_start = self.starts[line - 1];
        let column = if self.ascii {
            offset - line_start + 1
        } else {
            input[line_start..offset].chars().count() + 1
        };
        Position {
            line,
            column,
            offset,
        }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Schematic and symbol library parse errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("{message} at {at}: '{found}'")]
    Lexical {
        message: String,
        found: String,
        at: Position,
    },
    #[error("Expected {expected} at {at}, found '{found}'")]
    Structural {
        expected: String,
        found: String,
        at: Position,
    },
    #[error("Invalid number '{found}' for {expected} at {at}")]
    NumericFormat {
        expected: String,
        found: String,
        at: Position,
    },
    #[error("Unknown {expected} '{found}' at {at}")]
    UnknownValue {
        expected: String,
        found: String,
        at: Position,
    },
    #[error("Unsupported file version {version} at {at}, oldest readable version is {minimum}")]
    UnsupportedVersion {
        version: i64,
        minimum: i64,
        at: Position,
    },
}

/// Failure to load a document from a file or other sheet source
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Cannot parse {}: {source}", .path.display())]
    Parse { path: PathBuf, source: ParseError },
    #[error("{} was written by a newer version (file version {version})", .path.display())]
    TooRecent { path: PathBuf, version: i64 },
    #[error("Sheet {} includes itself", .path.display())]
    RecursiveSheet { path: PathBuf },
    #[error("Sheet {} is nested deeper than {max_depth} levels", .path.display())]
    TooDeep { path: PathBuf, max_depth: usize },
}

impl LoadError {
    /// The file the error is about
    pub fn path(&self) -> &std::path::Path {
        match self {
            LoadError::Io { path, .. }
            | LoadError::Parse { path, .. }
            | LoadError::TooRecent { path, .. }
            | LoadError::RecursiveSheet { path }
            | LoadError::TooDeep { path, .. } => path,
        }
    }
}

/// A token that did not match a fixed keyword table
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {kind} '{found}'")]
pub struct UnknownKeyword {
    pub kind: &'static str,
    pub found: String,
}

impl UnknownKeyword {
    pub fn new(kind: &'static str, found: &str) -> Self {
        UnknownKeyword {
            kind,
            found: found.to_owned(),
        }
    }
}

impl ParseError {
    /// Where in the document the error was detected
    pub fn position(&self) -> Position {
        match self {
            ParseError::Lexical { at, .. }
            | ParseError::Structural { at, .. }
            | ParseError::NumericFormat { at, .. }
            | ParseError::UnknownValue { at, .. }
            | ParseError::UnsupportedVersion { at, .. } => *at,
        }
    }

    /// The offending raw text, if any
    pub fn found(&self) -> Option<&str> {
        match self {
            ParseError::Lexical { found, .. }
            | ParseError::Structural { found, .. }
            | ParseError::NumericFormat { found, .. }
            | ParseError::UnknownValue { found, .. } => Some(found),
            ParseError::UnsupportedVersion { .. } => None,
        }
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, ParseError::Structural { .. })
    }
}
