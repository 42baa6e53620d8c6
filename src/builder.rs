use std::fmt;
use std::io::BufRead;

use crate::error::Error;
use crate::model::{Env, ParseMode};
use crate::parser::scan;
use crate::substitution::{Substitution, substitute};

/// Builder-style parser with an explicit substitution pipeline.
///
/// Without handlers this is equivalent to [`crate::parse_str_with_mode`].
#[derive(Default)]
pub struct Dotenv {
    mode: ParseMode,
    substitutions: Vec<Box<dyn Substitution>>,
}

impl fmt::Debug for Dotenv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dotenv")
            .field("mode", &self.mode)
            .field("substitutions", &self.substitutions.len())
            .finish()
    }
}

impl Dotenv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: ParseMode) -> Self {
        self.mode = mode;
        self
    }

    /// Append a handler. Handlers run in the order they were added.
    pub fn substitution(mut self, handler: impl Substitution + 'static) -> Self {
        self.substitutions.push(Box::new(handler));
        self
    }

    pub fn substitutions<I, S>(mut self, handlers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Substitution + 'static,
    {
        self.substitutions.extend(
            handlers
                .into_iter()
                .map(|handler| Box::new(handler) as Box<dyn Substitution>),
        );
        self
    }

    pub fn parse_str(&self, input: &str) -> Result<Env, Error> {
        let env = scan(input, self.mode)?;
        let handlers = self
            .substitutions
            .iter()
            .map(|handler| handler.as_ref())
            .collect::<Vec<_>>();
        substitute(env, &handlers)
    }

    pub fn parse_bytes(&self, input: &[u8]) -> Result<Env, Error> {
        let text = std::str::from_utf8(input)?;
        self.parse_str(text)
    }

    pub fn parse_reader<R: BufRead>(&self, mut reader: R) -> Result<Env, Error> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        self.parse_bytes(&buf)
    }
}
