use std::process::ExitStatus;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid UTF-8 input: {0}")]
    InvalidEncoding(#[from] std::str::Utf8Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("substitution failed for key {key}: {source}")]
    Substitution {
        key: String,
        #[source]
        source: SubstitutionError,
    },
}

/// A malformed-input failure. The whole parse is aborted; no entries survive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at line {line}, column {column}: {kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// Byte offset of the cursor when the failure was raised.
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

impl ParseError {
    pub(crate) fn new(kind: ParseErrorKind, offset: usize, line: u32, column: u32) -> Self {
        Self {
            kind,
            offset,
            line,
            column,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("expected statement")]
    ExpectedStatement,
    #[error("expected 'export'")]
    ExpectedExport,
    #[error("expected whitespace")]
    ExpectedWhitespace,
    #[error("expected key")]
    ExpectedKey,
    #[error("expected '='")]
    ExpectedEquals,
    #[error("expected '\"'")]
    ExpectedDoubleQuote,
    #[error("expected \"'\"")]
    ExpectedSingleQuote,
    #[error("expected double quoted string contents")]
    ExpectedDoubleQuotedContents,
    #[error("expected single quoted string contents")]
    ExpectedSingleQuotedContents,
    #[error("expected newline")]
    ExpectedNewline,
}

#[derive(Debug, Error)]
pub enum SubstitutionError {
    #[error("failed to run `{command}`: {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` exited with {status}")]
    CommandFailed { command: String, status: ExitStatus },
    #[error("`{command}` produced non UTF-8 output")]
    CommandOutput { command: String },
}
