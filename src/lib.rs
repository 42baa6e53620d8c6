//! Parse `.env` text with an explicit state machine.
//!
//! [`parse_str`] scans `KEY=value` assignments (optionally prefixed with
//! `export`, single- or double-quoted, with `#` comments) into an ordered
//! [`Env`]. Scanning never expands `$`; use [`Dotenv`] with [`Variable`] and
//! [`Command`] handlers for `$VAR`, `${VAR}` and `$(command)` substitution.
//!
//! Nothing here reads files or touches the process environment.

mod builder;
mod error;
mod model;
mod parser;
mod scanner;
pub mod ser;
mod substitution;

pub use builder::Dotenv;
pub use error::{Error, ParseError, ParseErrorKind, SubstitutionError};
pub use model::{Entry, Env, ParseMode};
pub use parser::{
    parse_bytes, parse_bytes_with_mode, parse_reader, parse_reader_with_mode, parse_str,
    parse_str_with_mode,
};
pub use substitution::{Command, Substitution, Variable, substitute};
