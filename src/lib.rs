//! A minimal interactive command shell.
//!
//! Each input line goes through the same short path: it is split at the first `|`
//! into at most two stages, every stage is tokenized on spaces, the first token of
//! the first stage is checked against the built-in commands (`exit`, `cd`, `help`,
//! `hello`), and anything else is launched as an external program, either alone or
//! as a two-stage pipeline connected by an anonymous pipe.
//!
//! The main entry point is [`Interpreter`], which owns the shell's [`Environment`]
//! (working directory and variables) and turns lines into [`DispatchDecision`]s.
//! The [`repl`] module is the interactive front end used by the `mini_shell` binary.
//!
//! [`Environment`]: env::Environment

mod builtin;
pub mod command;
pub mod config;
pub mod env;
pub mod error;
mod external;
mod interpreter;
mod lexer;
mod parser;
mod pipeline;
pub mod repl;

pub use builtin::Builtin;
pub use command::{ArgumentVector, DispatchDecision, ExitCode, PipelineRequest};
pub use error::ShellError;
pub use interpreter::{Interpreter, ProcessTerminator, Terminator};
pub use lexer::split_into_tokens;
pub use parser::{PipeSplit, construct_request, split_pipe};
