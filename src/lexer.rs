//! Tokenization of one pipeline stage into command arguments.

use crate::config::Limits;
use crate::error::ShellError;

/// The only token separator. Tabs and other whitespace stay inside tokens.
const SEPARATOR: char = ' ';

/// Split `line` into its non-empty, space-separated tokens, in order.
///
/// Runs of spaces count as one separator, so no token is ever empty. There is no
/// quoting or escaping. More than `limits.max_args` tokens is an error rather than
/// a silent truncation.
pub fn split_into_tokens(line: &str, limits: &Limits) -> Result<Vec<String>, ShellError> {
    let tokens: Vec<String> = line
        .split(SEPARATOR)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect();

    if tokens.len() > limits.max_args {
        return Err(ShellError::TooManyArguments {
            count: tokens.len(),
            limit: limits.max_args,
        });
    }
    Ok(tokens)
}
