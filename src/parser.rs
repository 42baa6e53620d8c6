//! Grammar state machine for the `.env` format.
//!
//! ```text
//! file             = line ("\r"?"\n" line)*
//! line             = ws? statement? ws? comment? ws?
//! statement        = export_statement | assignment
//! export_statement = "export" ws+ assignment
//! assignment       = key "=" value
//! key              = [A-Za-z_][A-Za-z0-9_]*
//! value            = dq_value | sq_value | unquoted_value
//! dq_value         = '"' ( "\" any | !'"' any )* '"'
//! sq_value         = "'" ( "\" any | !"'" any )* "'"
//! unquoted_value   = ( "\" any | !ws any )*
//! comment          = "#" [^\r\n]*
//! ws               = (" " | "\t")+
//! ```
//!
//! Each `State` maps to one rule of the grammar. The machine only moves
//! forward through the input; every decision is made on a single anchored
//! lookahead.

use std::io::BufRead;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, ParseError, ParseErrorKind};
use crate::model::{Entry, Env, ParseMode};
use crate::scanner::Scanner;

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("grammar patterns are valid")
}

static HORIZONTAL_SPACE: Lazy<Regex> = Lazy::new(|| pattern(r"^[ \t]*"));
static HORIZONTAL_SPACE_REQUIRED: Lazy<Regex> = Lazy::new(|| pattern(r"^[ \t]+"));
static NEWLINE: Lazy<Regex> = Lazy::new(|| pattern(r"^\r?\n"));
static HASH: Lazy<Regex> = Lazy::new(|| pattern(r"^#"));
static COMMENT: Lazy<Regex> = Lazy::new(|| pattern(r"^#[^\r\n]*"));
static EXPORT_PREFIX: Lazy<Regex> = Lazy::new(|| pattern(r"^export[ \t\r\n\x0B\x0C]"));
static EXPORT: Lazy<Regex> = Lazy::new(|| pattern(r"^export\b"));
static NON_SPACE: Lazy<Regex> = Lazy::new(|| pattern(r"^[^ \t\r\n\x0B\x0C]"));
static NON_SPACE_RUN: Lazy<Regex> = Lazy::new(|| pattern(r"^[^ \t\r\n\x0B\x0C]+"));
static KEY: Lazy<Regex> = Lazy::new(|| pattern(r"^[A-Za-z_][A-Za-z0-9_]*"));
static EQUALS: Lazy<Regex> = Lazy::new(|| pattern(r"^="));
static ESCAPE: Lazy<Regex> = Lazy::new(|| pattern(r"^\\."));
static DOUBLE_QUOTE: Lazy<Regex> = Lazy::new(|| pattern(r#"^""#));
static DOUBLE_QUOTED_RUN: Lazy<Regex> = Lazy::new(|| pattern(r#"^[^"\\]+"#));
static SINGLE_QUOTE: Lazy<Regex> = Lazy::new(|| pattern(r"^'"));
static SINGLE_QUOTED_RUN: Lazy<Regex> = Lazy::new(|| pattern(r"^[^'\\]+"));

/// Parse dotenv entries from UTF-8 text.
pub fn parse_str(input: &str) -> Result<Env, Error> {
    parse_str_with_mode(input, ParseMode::Strict)
}

/// Parse dotenv entries from UTF-8 text using a specific parse mode.
pub fn parse_str_with_mode(input: &str, mode: ParseMode) -> Result<Env, Error> {
    scan(input, mode).map_err(Error::from)
}

/// Parse dotenv entries from UTF-8 bytes.
pub fn parse_bytes(input: &[u8]) -> Result<Env, Error> {
    parse_bytes_with_mode(input, ParseMode::Strict)
}

/// Parse dotenv entries from UTF-8 bytes using a specific parse mode.
pub fn parse_bytes_with_mode(input: &[u8], mode: ParseMode) -> Result<Env, Error> {
    let text = std::str::from_utf8(input)?;
    parse_str_with_mode(text, mode)
}

/// Parse dotenv entries from a buffered reader.
///
/// The reader is drained into memory before scanning starts.
pub fn parse_reader<R: BufRead>(reader: R) -> Result<Env, Error> {
    parse_reader_with_mode(reader, ParseMode::Strict)
}

/// Parse dotenv entries from a buffered reader using a specific parse mode.
pub fn parse_reader_with_mode<R: BufRead>(mut reader: R, mode: ParseMode) -> Result<Env, Error> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    parse_bytes_with_mode(&buf, mode)
}

pub(crate) fn scan(input: &str, mode: ParseMode) -> Result<Env, ParseError> {
    match Machine::new(input, mode).run() {
        Ok(env) => {
            tracing::debug!(entries = env.len(), ?mode, "parsed dotenv input");
            Ok(env)
        }
        Err(err) => {
            tracing::debug!(
                line = err.line,
                column = err.column,
                kind = %err.kind,
                "rejected dotenv input"
            );
            Err(err)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Line,
    Statement,
    ExportStatement,
    AssignmentStatement,
    Assignment,
    UnquotedValue,
    DoubleQuotedValue,
    DoubleQuotedValueContents,
    SingleQuotedValue,
    SingleQuotedValueContents,
    AssignmentEnd,
    Comment,
    Newline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
    Double,
    Single,
}

impl Quote {
    fn delimiter(self) -> &'static Regex {
        match self {
            Self::Double => &*DOUBLE_QUOTE,
            Self::Single => &*SINGLE_QUOTE,
        }
    }

    fn run(self) -> &'static Regex {
        match self {
            Self::Double => &*DOUBLE_QUOTED_RUN,
            Self::Single => &*SINGLE_QUOTED_RUN,
        }
    }

    fn contents_state(self) -> State {
        match self {
            Self::Double => State::DoubleQuotedValueContents,
            Self::Single => State::SingleQuotedValueContents,
        }
    }

    fn missing_open(self) -> ParseErrorKind {
        match self {
            Self::Double => ParseErrorKind::ExpectedDoubleQuote,
            Self::Single => ParseErrorKind::ExpectedSingleQuote,
        }
    }

    fn missing_contents(self) -> ParseErrorKind {
        match self {
            Self::Double => ParseErrorKind::ExpectedDoubleQuotedContents,
            Self::Single => ParseErrorKind::ExpectedSingleQuotedContents,
        }
    }
}

struct Machine<'a> {
    scanner: Scanner<'a>,
    mode: ParseMode,
    env: Env,
    key: &'a str,
    key_line: u32,
    value: String,
    line: u32,
    line_mark: usize,
}

impl<'a> Machine<'a> {
    fn new(input: &'a str, mode: ParseMode) -> Self {
        Self {
            scanner: Scanner::new(input),
            mode,
            env: Env::new(),
            key: "",
            key_line: 1,
            value: String::new(),
            line: 1,
            line_mark: 0,
        }
    }

    fn run(mut self) -> Result<Env, ParseError> {
        let mut state = State::Start;
        while let Some(next) = self.step(state)? {
            state = next;
        }
        Ok(self.env)
    }

    /// Evaluate one state. `None` terminates the parse successfully.
    fn step(&mut self, state: State) -> Result<Option<State>, ParseError> {
        let next = match state {
            State::Start => State::Line,
            State::Line => {
                self.scanner.skip(&HORIZONTAL_SPACE);
                if self.scanner.at_end() {
                    return Ok(None);
                } else if self.scanner.peek(&NEWLINE) {
                    State::Newline
                } else if self.scanner.peek(&HASH) {
                    State::Comment
                } else {
                    State::Statement
                }
            }
            State::Statement => {
                if self.scanner.peek(&EXPORT_PREFIX) {
                    State::ExportStatement
                } else if self.scanner.peek(&NON_SPACE) {
                    State::AssignmentStatement
                } else if self.scanner.at_end() {
                    return Ok(None);
                } else {
                    return Err(self.fail(ParseErrorKind::ExpectedStatement));
                }
            }
            State::ExportStatement => {
                self.expect(&EXPORT, ParseErrorKind::ExpectedExport)?;
                self.expect(
                    &HORIZONTAL_SPACE_REQUIRED,
                    ParseErrorKind::ExpectedWhitespace,
                )?;
                State::Assignment
            }
            State::AssignmentStatement => State::Assignment,
            State::Assignment => {
                let line = self.current_line();
                let Some(key) = self.scanner.scan(&KEY) else {
                    return Err(self.fail(ParseErrorKind::ExpectedKey));
                };
                self.key = key;
                self.key_line = line;
                self.scanner.skip(&HORIZONTAL_SPACE);
                self.expect(&EQUALS, ParseErrorKind::ExpectedEquals)?;
                self.scanner.skip(&HORIZONTAL_SPACE);
                if self.scanner.peek(&DOUBLE_QUOTE) {
                    State::DoubleQuotedValue
                } else if self.scanner.peek(&SINGLE_QUOTE) {
                    State::SingleQuotedValue
                } else {
                    State::UnquotedValue
                }
            }
            State::UnquotedValue => {
                let value = self.scanner.scan(&NON_SPACE_RUN).unwrap_or_default();
                self.scanner.skip(&HORIZONTAL_SPACE);
                self.store(value.to_owned());
                State::AssignmentEnd
            }
            State::DoubleQuotedValue => self.open_quote(Quote::Double)?,
            State::DoubleQuotedValueContents => self.quoted_contents(Quote::Double)?,
            State::SingleQuotedValue => self.open_quote(Quote::Single)?,
            State::SingleQuotedValueContents => self.quoted_contents(Quote::Single)?,
            State::AssignmentEnd => {
                if self.scanner.peek(&HASH) {
                    State::Comment
                } else {
                    State::Newline
                }
            }
            State::Comment => {
                self.scanner.skip(&COMMENT);
                State::Newline
            }
            State::Newline => {
                if self.scanner.at_end() {
                    return Ok(None);
                }
                self.expect(&NEWLINE, ParseErrorKind::ExpectedNewline)?;
                match self.mode {
                    ParseMode::Strict => State::Statement,
                    ParseMode::Relaxed => State::Line,
                }
            }
        };
        Ok(Some(next))
    }

    fn open_quote(&mut self, quote: Quote) -> Result<State, ParseError> {
        self.expect(quote.delimiter(), quote.missing_open())?;
        self.value.clear();
        Ok(quote.contents_state())
    }

    fn quoted_contents(&mut self, quote: Quote) -> Result<State, ParseError> {
        if let Some(run) = self.scanner.scan(quote.run()) {
            self.value.push_str(run);
            return Ok(quote.contents_state());
        }
        if let Some(escape) = self.scanner.scan(&ESCAPE) {
            // Drop the backslash, keep the escaped char verbatim.
            self.value.push_str(&escape[1..]);
            return Ok(quote.contents_state());
        }
        if self.scanner.skip(quote.delimiter()) {
            self.scanner.skip(&HORIZONTAL_SPACE);
            let value = std::mem::take(&mut self.value);
            self.store(value);
            return Ok(State::AssignmentEnd);
        }
        Err(self.fail(quote.missing_contents()))
    }

    fn store(&mut self, value: String) {
        self.env.insert(Entry {
            key: self.key.to_owned(),
            value,
            line: self.key_line,
        });
    }

    fn expect(&mut self, pattern: &Regex, kind: ParseErrorKind) -> Result<(), ParseError> {
        if self.scanner.skip(pattern) {
            Ok(())
        } else {
            Err(self.fail(kind))
        }
    }

    fn current_line(&mut self) -> u32 {
        let consumed = self.scanner.since(self.line_mark);
        self.line += consumed.bytes().filter(|byte| *byte == b'\n').count() as u32;
        self.line_mark = self.scanner.position();
        self.line
    }

    fn fail(&self, kind: ParseErrorKind) -> ParseError {
        let offset = self.scanner.position();
        let (line, column) = self.scanner.location(offset);
        ParseError::new(kind, offset, line, column)
    }
}
