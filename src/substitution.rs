//! Post-processing of raw values.
//!
//! The scanner never interprets `$`. Callers that want `$VAR`, `${VAR}` or
//! `$(command)` expansion pass an ordered list of [`Substitution`] handlers to
//! [`substitute`] (or to [`crate::Dotenv`]), which threads every raw value
//! through them in insertion order.

use std::collections::BTreeMap;
use std::process;

use crate::error::{Error, SubstitutionError};
use crate::model::Env;

/// A rewrite applied to a raw value after scanning.
pub trait Substitution {
    /// Rewrite `value`, the current value of `key`. `env` holds substituted
    /// values for earlier keys and raw values for later ones.
    fn apply(&self, value: &str, key: &str, env: &Env) -> Result<String, SubstitutionError>;
}

impl<T: Substitution + ?Sized> Substitution for &T {
    fn apply(&self, value: &str, key: &str, env: &Env) -> Result<String, SubstitutionError> {
        (**self).apply(value, key, env)
    }
}

impl<T: Substitution + ?Sized> Substitution for Box<T> {
    fn apply(&self, value: &str, key: &str, env: &Env) -> Result<String, SubstitutionError> {
        (**self).apply(value, key, env)
    }
}

/// Run every entry of `env` through `handlers`, in order.
pub fn substitute(mut env: Env, handlers: &[&dyn Substitution]) -> Result<Env, Error> {
    if handlers.is_empty() {
        return Ok(env);
    }

    let keys = env.keys().map(str::to_owned).collect::<Vec<_>>();
    for key in keys {
        let Some(raw) = env.get(&key) else {
            continue;
        };
        let mut value = raw.to_owned();
        for handler in handlers {
            let next = handler
                .apply(&value, &key, &env)
                .map_err(|source| Error::Substitution {
                    key: key.clone(),
                    source,
                })?;
            if next != value {
                tracing::trace!(key = %key, "substituted value");
            }
            value = next;
        }
        env.set_value(&key, value);
    }

    Ok(env)
}

/// Expands `$NAME` and `${NAME}`.
///
/// Names resolve against the mapping being substituted, then against the
/// fallback map. Unknown names expand to an empty string. `\$` produces a
/// literal `$`.
///
/// Single-quoted values are expanded too: an [`Env`] does not record how a
/// value was quoted, so `'$HOME'` is not protected the way it is in a shell.
#[derive(Debug, Clone, Default)]
pub struct Variable {
    fallback: BTreeMap<String, String>,
}

impl Variable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve names missing from the parsed mapping against `fallback`,
    /// e.g. a snapshot of the process environment.
    pub fn with_fallback(fallback: BTreeMap<String, String>) -> Self {
        Self { fallback }
    }
}

impl Substitution for Variable {
    fn apply(&self, value: &str, _key: &str, env: &Env) -> Result<String, SubstitutionError> {
        Ok(expand_variables(value, |name| {
            env.get(name)
                .or_else(|| self.fallback.get(name).map(String::as_str))
                .unwrap_or_default()
                .to_owned()
        }))
    }
}

fn expand_variables<F>(input: &str, mut resolve: F) -> String
where
    F: FnMut(&str) -> String,
{
    let mut out = String::with_capacity(input.len());
    let mut cursor = 0usize;
    let mut idx = 0usize;
    let bytes = input.as_bytes();

    while idx < bytes.len() {
        match bytes[idx] {
            // `\$(` belongs to command substitution.
            b'\\' if bytes.get(idx + 1) == Some(&b'$') && bytes.get(idx + 2) != Some(&b'(') => {
                out.push_str(&input[cursor..idx]);
                cursor = idx + 1;
                idx += 2;
            }
            b'$' => {
                let Some((name_start, name_end, token_end)) = parse_placeholder(input, idx) else {
                    idx += 1;
                    continue;
                };
                out.push_str(&input[cursor..idx]);
                out.push_str(&resolve(&input[name_start..name_end]));
                cursor = token_end;
                idx = token_end;
            }
            _ => idx += 1,
        }
    }

    out.push_str(&input[cursor..]);
    out
}

fn parse_placeholder(input: &str, start: usize) -> Option<(usize, usize, usize)> {
    let bytes = input.as_bytes();
    let first = *bytes.get(start + 1)?;

    if first == b'{' {
        let name_start = start + 2;
        let name_end = name_start + name_len(&bytes[name_start..]);
        if name_end == name_start || bytes.get(name_end) != Some(&b'}') {
            return None;
        }
        return Some((name_start, name_end, name_end + 1));
    }

    let name_start = start + 1;
    let name_end = name_start + name_len(&bytes[name_start..]);
    if name_end == name_start {
        return None;
    }
    Some((name_start, name_end, name_end))
}

fn name_len(bytes: &[u8]) -> usize {
    match bytes.first() {
        Some(byte) if byte.is_ascii_alphabetic() || *byte == b'_' => {
            1 + bytes[1..]
                .iter()
                .take_while(|byte| byte.is_ascii_alphanumeric() || **byte == b'_')
                .count()
        }
        _ => 0,
    }
}

/// Replaces `$(command)` with the command's standard output.
///
/// Parentheses inside the command must balance. `\$(…)` is kept literally
/// without the backslash.
#[derive(Debug, Clone)]
pub struct Command {
    shell: String,
}

impl Default for Command {
    fn default() -> Self {
        Self {
            shell: "sh".to_owned(),
        }
    }
}

impl Command {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `shell` instead of `sh`. It is invoked as `<shell> -c <command>`.
    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    fn run(&self, command: &str) -> Result<String, SubstitutionError> {
        tracing::debug!(command, shell = %self.shell, "running command substitution");
        let output = process::Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .stdin(process::Stdio::null())
            .output()
            .map_err(|source| SubstitutionError::CommandSpawn {
                command: command.to_owned(),
                source,
            })?;

        if !output.status.success() {
            return Err(SubstitutionError::CommandFailed {
                command: command.to_owned(),
                status: output.status,
            });
        }

        let stdout =
            String::from_utf8(output.stdout).map_err(|_| SubstitutionError::CommandOutput {
                command: command.to_owned(),
            })?;
        Ok(stdout.trim_end_matches(['\r', '\n']).to_owned())
    }
}

impl Substitution for Command {
    fn apply(&self, value: &str, _key: &str, _env: &Env) -> Result<String, SubstitutionError> {
        let mut out = String::with_capacity(value.len());
        let mut cursor = 0usize;
        let mut idx = 0usize;
        let bytes = value.as_bytes();

        while idx + 1 < bytes.len() {
            if bytes[idx] != b'$' || bytes[idx + 1] != b'(' {
                idx += 1;
                continue;
            }
            if idx > 0 && bytes[idx - 1] == b'\\' {
                // Drop the backslash; the token, balanced or not, stays literal.
                out.push_str(&value[cursor..idx - 1]);
                cursor = idx;
                idx = closing_paren(bytes, idx + 1).map_or(idx + 2, |close| close + 1);
                continue;
            }
            let Some(close) = closing_paren(bytes, idx + 1) else {
                idx += 1;
                continue;
            };
            if close == idx + 2 {
                // `$()` names no command.
                idx = close + 1;
                continue;
            }

            out.push_str(&value[cursor..idx]);
            out.push_str(&self.run(&value[idx + 2..close])?);
            cursor = close + 1;
            idx = close + 1;
        }

        out.push_str(&value[cursor..]);
        Ok(out)
    }
}

/// Index of the `)` matching the `(` at `open`.
fn closing_paren(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, byte) in bytes.iter().enumerate().skip(open + 1) {
        match byte {
            b'(' => depth += 1,
            b')' if depth == 0 => return Some(idx),
            b')' => depth -= 1,
            _ => {}
        }
    }
    None
}
