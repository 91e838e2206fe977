use crate::command::{ArgumentVector, ExitCode};
use crate::env::Environment;
use crate::error::ShellError;
use anyhow::Result;
use argh::{EarlyExit, FromArgs};
use std::fs;
use std::io::{self, Write};
use tracing::debug;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "cd" or "help".
    fn name() -> &'static str;

    /// Executes the command, writing any output to `stdout`.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode>;
}

/// The closed set of commands that run inside the shell itself.
///
/// Recognition is exact and case-sensitive, and only ever looks at the first token
/// of the first pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Exit,
    ChangeDirectory,
    Help,
    Greet,
}

impl Builtin {
    pub const ALL: [Builtin; 4] = [
        Builtin::Exit,
        Builtin::ChangeDirectory,
        Builtin::Help,
        Builtin::Greet,
    ];

    /// Find the builtin called `name`, if there is one.
    pub fn lookup(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|builtin| builtin.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Exit => Exit::name(),
            Builtin::ChangeDirectory => Cd::name(),
            Builtin::Help => Help::name(),
            Builtin::Greet => Hello::name(),
        }
    }

    /// Parse `argv` for this builtin and run it.
    ///
    /// Every token after the name is positional, so flag-like words such as
    /// `--now` or `-1` reach the builtin unchanged and words it does not use are
    /// ignored. Failures are written to `stdout` and turned into a non-zero exit
    /// code; only a failure to write that output is returned as an error.
    pub fn run(
        self,
        argv: &ArgumentVector,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode, ShellError> {
        debug!(builtin = self.name(), args = ?argv.args(), "running builtin");
        let code = match self {
            Builtin::Exit => run_parsed::<Exit>(argv, stdout, env)?,
            Builtin::ChangeDirectory => run_parsed::<Cd>(argv, stdout, env)?,
            Builtin::Help => run_parsed::<Help>(argv, stdout, env)?,
            Builtin::Greet => run_parsed::<Hello>(argv, stdout, env)?,
        };
        Ok(code)
    }
}

fn run_parsed<T: BuiltinCommand>(
    argv: &ArgumentVector,
    stdout: &mut dyn Write,
    env: &mut Environment,
) -> io::Result<ExitCode> {
    let args: Vec<&str> = std::iter::once("--")
        .chain(argv.args().iter().map(String::as_str))
        .collect();
    let cmd = match T::from_args(&[T::name()], &args) {
        Ok(cmd) => cmd,
        Err(EarlyExit { output, status }) => {
            writeln!(stdout, "{}", output.trim_end())?;
            return Ok(if status.is_err() { 1 } else { 0 });
        }
    };
    match cmd.execute(stdout, env) {
        Ok(code) => Ok(code),
        Err(e) => {
            writeln!(stdout, "{e:#}")?;
            Ok(1)
        }
    }
}

#[derive(FromArgs)]
/// Leave the shell.
pub struct Exit {
    #[argh(positional)]
    /// ignored.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        writeln!(stdout, "Goodbye")?;
        env.should_exit = true;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Change the working directory used for every command started afterwards.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to, absolute or relative to the current directory;
    /// anything after it is ignored.
    pub args: Vec<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let target = self
            .args
            .into_iter()
            .next()
            .filter(|t| !t.is_empty())
            .ok_or(ShellError::MissingArgument { builtin: "cd" })?;

        let requested = env.current_dir.join(&target);
        let canonical =
            fs::canonicalize(&requested).map_err(|source| ShellError::DirectoryChange {
                path: requested.clone(),
                source,
            })?;
        if !canonical.is_dir() {
            return Err(ShellError::DirectoryChange {
                path: requested,
                source: io::Error::from(io::ErrorKind::NotADirectory),
            }
            .into());
        }

        debug!(from = %env.current_dir.display(), to = %canonical.display(), "changing directory");
        env.set_var("PWD", canonical.to_string_lossy());
        env.current_dir = canonical;
        Ok(0)
    }
}

const HELP_TEXT: &str = "\
mini_shell help
Built-in commands:
  cd <path>   change the working directory
  exit        leave the shell
  help        show this summary
  hello       greet the current user
Any other command is run as a program found on PATH.
Two commands can be joined with '|'; only the first '|' splits the line.
There is no quoting, redirection, globbing or variable expansion.";

#[derive(FromArgs)]
/// Print a summary of what the shell supports.
pub struct Help {
    #[argh(positional)]
    /// ignored.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn execute(self, stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        writeln!(stdout, "{HELP_TEXT}")?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Greet the user named by the USER variable.
pub struct Hello {
    #[argh(positional)]
    /// ignored.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Hello {
    fn name() -> &'static str {
        "hello"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let user = env.get_var("USER").unwrap_or("unknown");
        writeln!(
            stdout,
            "Hello {user}.\nThis is not a place to play around.\nUse help to know more."
        )?;
        Ok(0)
    }
}
