//! Command-line construction for subprocess backends.

use super::LauncherConfig;
use crate::backend::domain::EndpointId;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Errors returned while building a launch command.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LaunchError {
    /// The executable string contains no program.
    #[error("backend executable is empty")]
    EmptyCommand,

    /// A quoted section is not closed.
    #[error("unterminated {0} quote in backend executable")]
    UnterminatedQuote(char),

    /// The executable ends with a dangling escape character.
    #[error("backend executable ends with a dangling escape")]
    DanglingEscape,
}

/// Program and arguments of a backend process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    program: String,
    args: Vec<String>,
}

impl LaunchCommand {
    /// Builds the command launching a backend.
    ///
    /// The configured placeholder in `executable` is replaced with
    /// `<provider_path> --plugin `, every argument is appended as
    /// `--key value`, and `--identifier <endpoint>` comes last.
    ///
    /// # Errors
    ///
    /// Returns a [`LaunchError`] when the executable string cannot be split
    /// into a program and its arguments.
    pub fn build(
        config: &LauncherConfig,
        executable: &str,
        arguments: &BTreeMap<String, String>,
        endpoint: &EndpointId,
    ) -> Result<Self, LaunchError> {
        let provider = format!("{} --plugin ", shell_escape(config.provider_path()));
        let expanded = executable.replace(config.placeholder(), &provider);
        let mut words = split_command_line(&expanded)?.into_iter();
        let program = words.next().ok_or(LaunchError::EmptyCommand)?;

        let mut args: Vec<String> = words.collect();
        for (key, value) in arguments {
            args.push(format!("--{key}"));
            args.push(value.clone());
        }
        args.push("--identifier".to_owned());
        args.push(endpoint.as_str().to_owned());

        Ok(Self { program, args })
    }

    /// Returns the program to execute.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Returns the program arguments.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for LaunchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&shell_escape(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", shell_escape(arg))?;
        }
        Ok(())
    }
}

/// Quotes a value for inclusion in a POSIX shell command.
#[must_use]
pub fn shell_escape(value: &str) -> String {
    let is_plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | ':' | '='));
    if is_plain {
        return value.to_owned();
    }

    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            escaped.push_str("'\\''");
        } else {
            escaped.push(ch);
        }
    }
    escaped.push('\'');
    escaped
}

/// Splits a command line into words.
///
/// Words are separated by whitespace. Single quotes preserve their content
/// literally, double quotes honour backslash escapes, and a backslash
/// outside quotes escapes the next character.
///
/// # Errors
///
/// Returns [`LaunchError::UnterminatedQuote`] for an unclosed quote and
/// [`LaunchError::DanglingEscape`] for a trailing backslash.
pub fn split_command_line(line: &str) -> Result<Vec<String>, LaunchError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(quoted) => current.push(quoted),
                        None => return Err(LaunchError::UnterminatedQuote('\'')),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(escaped) => current.push(escaped),
                            None => return Err(LaunchError::UnterminatedQuote('"')),
                        },
                        Some(quoted) => current.push(quoted),
                        None => return Err(LaunchError::UnterminatedQuote('"')),
                    }
                }
            }
            '\\' => {
                in_word = true;
                current.push(chars.next().ok_or(LaunchError::DanglingEscape)?);
            }
            space if space.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            other => {
                in_word = true;
                current.push(other);
            }
        }
    }

    if in_word {
        words.push(current);
    }
    Ok(words)
}
