//! The interactive front end: line editing, history, prompt and diagnostics.
//!
//! None of this is needed to dispatch commands; it only feeds lines to an
//! [`Interpreter`] and shows what comes back.

use crate::Interpreter;
use crate::env::Environment;
use crate::error::ShellError;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, Write};
use tracing::debug;

const PROMPT: &str = ">>> ";

/// Filter applied to every raw line before it reaches the interpreter.
///
/// Empty and whitespace-only lines are skipped; anything else is passed on with
/// surrounding whitespace removed.
pub fn accept_line(raw: &str) -> Option<&str> {
    let line = raw.trim();
    (!line.is_empty()).then_some(line)
}

pub fn banner(env: &Environment) -> String {
    let user = env.get_var("USER").unwrap_or("unknown");
    format!("mini_shell\nUSER: @{user}\nType help for the list of built-in commands.\n")
}

/// Print a failed line's diagnostic. The shell keeps running afterwards.
pub fn report(err: &ShellError) {
    debug!(error = ?err, "command failed");
    eprintln!("mini_shell: {err}");
}

/// Read lines until `exit` or end of input, handing each to `interpreter`.
pub fn run(interpreter: &mut Interpreter) -> anyhow::Result<()> {
    let mut rl = DefaultEditor::new()?;
    let mut stdout = io::stdout();

    while !interpreter.should_exit() {
        writeln!(stdout, "Dir: {}", interpreter.env().current_dir.display())?;
        match rl.readline(PROMPT) {
            Ok(raw) => {
                let Some(line) = accept_line(&raw) else {
                    continue;
                };
                rl.add_history_entry(line)?;
                if let Err(err) = interpreter.run_line(line, &mut stdout) {
                    report(&err);
                }
            }
            Err(ReadlineError::Interrupted) => {
                debug!("line abandoned");
                writeln!(stdout, "^C")?;
            }
            Err(ReadlineError::Eof) => {
                debug!("end of input");
                interpreter.run_line("exit", &mut stdout)?;
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}
