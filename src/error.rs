//! Errors raised while turning an input line into running processes.
//!
//! Every variant is reported to the user as a single line and the shell keeps
//! prompting; none of them ends the shell.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShellError {
    /// The input line exceeds the configured character limit.
    #[error("input line is {len} characters long, the limit is {limit}")]
    LineTooLong { len: usize, limit: usize },

    /// A pipeline stage has more tokens than the configured limit.
    #[error("too many arguments: {count}, the limit is {limit}")]
    TooManyArguments { count: usize, limit: usize },

    /// A pipeline stage has no tokens, as in `| wc` or `ls |`.
    #[error("empty command in pipeline")]
    EmptyCommand,

    #[error("{builtin}: missing argument")]
    MissingArgument { builtin: &'static str },

    #[error("cd: {path}: {source}", path = .path.display())]
    DirectoryChange {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("pipe initialization failed: {0}")]
    PipeCreation(#[source] nix::Error),

    /// The OS refused to create the child process.
    #[error("{program}: failed to create process: {source}")]
    ProcessCreation {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The program could not be found or could not be executed.
    #[error("{program}: command execution failed: {source}")]
    ExecFailure {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program}: failed to wait for process: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    /// Writing builtin output to the display failed.
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}
