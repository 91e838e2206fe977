//! Limits and command-line options.
//!
//! The shell reads no configuration files. Everything tunable is a flag of the
//! `mini_shell` binary, parsed with [`argh`] into [`Options`].

use argh::FromArgs;
use tracing::Level;

/// Longest accepted input line, in characters.
pub const DEFAULT_MAX_LINE_LEN: usize = 1000;

/// Largest accepted number of tokens in one pipeline stage.
pub const DEFAULT_MAX_ARGS: usize = 100;

/// Bounds applied to every input line before it is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_line_len: usize,
    pub max_args: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_line_len: DEFAULT_MAX_LINE_LEN,
            max_args: DEFAULT_MAX_ARGS,
        }
    }
}

#[derive(FromArgs, Debug)]
/// A minimal interactive shell with built-ins and two-stage pipelines.
pub struct Options {
    #[argh(option, short = 'c')]
    /// run a single command line and exit instead of starting the prompt.
    pub command: Option<String>,

    #[argh(option, default = "DEFAULT_MAX_LINE_LEN")]
    /// longest accepted input line, in characters.
    pub max_line_len: usize,

    #[argh(option, default = "DEFAULT_MAX_ARGS")]
    /// largest accepted number of arguments per command.
    pub max_args: usize,

    #[argh(option, short = 'l', default = "Level::WARN")]
    /// diagnostic log level written to stderr (error, warn, info, debug, trace).
    pub log_level: Level,

    #[argh(switch)]
    /// do not print the greeting banner.
    pub no_banner: bool,
}

impl Options {
    pub fn limits(&self) -> Limits {
        Limits {
            max_line_len: self.max_line_len,
            max_args: self.max_args,
        }
    }
}
