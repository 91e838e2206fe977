//! Pipe detection and construction of a [`PipelineRequest`] from a raw line.

use crate::command::{ArgumentVector, PipelineRequest};
use crate::config::Limits;
use crate::error::ShellError;
use crate::lexer::split_into_tokens;
use tracing::trace;

const PIPE: char = '|';

/// A raw line cut at its pipe separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipeSplit<'a> {
    pub first: &'a str,
    pub second: Option<&'a str>,
}

impl PipeSplit<'_> {
    /// Whether a `|` was found.
    pub fn is_piped(&self) -> bool {
        self.second.is_some()
    }
}

/// Cut `line` at the first `|`.
///
/// Only two stages are honored: a second `|` ends the second stage and the text
/// after it is dropped, so `"a|b|c"` yields `"a"` and `"b"`.
pub fn split_pipe(line: &str) -> PipeSplit<'_> {
    let mut parts = line.splitn(3, PIPE);
    let first = parts.next().unwrap_or_default();
    let second = parts.next();
    if let Some(dropped) = parts.next() {
        trace!(dropped, "ignoring pipeline stages after the second");
    }
    PipeSplit { first, second }
}

/// Split and tokenize one input line.
///
/// Fails if the line is longer than `limits.max_line_len` characters, if any stage
/// has too many tokens, or if any stage is empty.
pub fn construct_request(line: &str, limits: &Limits) -> Result<PipelineRequest, ShellError> {
    let len = line.chars().count();
    if len > limits.max_line_len {
        return Err(ShellError::LineTooLong {
            len,
            limit: limits.max_line_len,
        });
    }

    let split = split_pipe(line);
    let first = parse_command(split.first, limits)?;
    let second = split
        .second
        .map(|raw| parse_command(raw, limits))
        .transpose()?;
    Ok(PipelineRequest { first, second })
}

fn parse_command(raw: &str, limits: &Limits) -> Result<ArgumentVector, ShellError> {
    ArgumentVector::new(split_into_tokens(raw, limits)?).ok_or(ShellError::EmptyCommand)
}
