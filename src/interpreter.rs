use crate::builtin::Builtin;
use crate::command::{DispatchDecision, ExitCode};
use crate::config::Limits;
use crate::env::Environment;
use crate::error::ShellError;
use crate::external::{ExternalCommand, status_code};
use crate::parser;
use crate::pipeline::run_pipeline;
use std::io::{self, Write};
use tracing::{debug, warn};

/// Ends the shell once the `exit` builtin has run.
pub trait Terminator {
    /// Terminate with `code`. The process-level implementation never returns.
    fn terminate(&mut self, code: ExitCode);
}

/// Exits the whole process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessTerminator;

impl Terminator for ProcessTerminator {
    fn terminate(&mut self, code: ExitCode) {
        if let Err(err) = io::stdout().flush() {
            warn!(error = %err, "could not flush stdout before exiting");
        }
        std::process::exit(code)
    }
}

/// A minimal shell-like interpreter that can execute built-in and external commands.
///
/// The interpreter owns the [`Environment`], so the working directory changed by
/// `cd` is explicit state here rather than the process-wide one. Handling a line is
/// split in two steps: [`process`](Self::process) runs builtins and decides what to
/// launch, [`dispatch`](Self::dispatch) launches it and blocks until it finishes.
///
/// Example
/// ```
/// use mini_shell::{DispatchDecision, Interpreter};
/// let mut sh = Interpreter::default();
/// let decision = sh.process("echo hello world", &mut std::io::sink()).unwrap();
/// assert!(matches!(decision, DispatchDecision::RunSingle(_)));
/// ```
pub struct Interpreter {
    env: Environment,
    limits: Limits,
    terminator: Box<dyn Terminator>,
}

impl Interpreter {
    pub fn new(env: Environment, limits: Limits, terminator: Box<dyn Terminator>) -> Self {
        Self {
            env,
            limits,
            terminator,
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn should_exit(&self) -> bool {
        self.env.should_exit
    }

    /// Split, tokenize and check one non-empty line for a builtin.
    ///
    /// A builtin runs here, writing to `stdout`, and yields
    /// [`DispatchDecision::Handled`]. Only the first token of the first stage is
    /// checked, so a builtin given as the second stage is launched as a program, and
    /// a builtin piped into something runs alone. Nothing is spawned by this method.
    pub fn process(
        &mut self,
        line: &str,
        stdout: &mut dyn Write,
    ) -> Result<DispatchDecision, ShellError> {
        let request = parser::construct_request(line, &self.limits)?;
        debug!(
            first = %request.first,
            second = ?request.second.as_ref().map(ToString::to_string),
            "tokenized"
        );

        if let Some(builtin) = Builtin::lookup(request.first.program()) {
            if request.is_piped() {
                debug!(
                    builtin = builtin.name(),
                    "builtin ignores the second pipeline stage"
                );
            }
            let code = builtin.run(&request.first, stdout, &mut self.env)?;
            debug!(builtin = builtin.name(), code, "builtin finished");
            if self.env.should_exit {
                stdout.flush()?;
                self.terminator.terminate(code);
            }
            return Ok(DispatchDecision::Handled);
        }

        Ok(match request.second {
            None => DispatchDecision::RunSingle(request.first),
            Some(second) => DispatchDecision::RunPiped(request.first, second),
        })
    }

    /// Launch what [`process`](Self::process) decided and block until every
    /// spawned program has exited. Exit statuses are logged, not interpreted.
    pub fn dispatch(&mut self, decision: DispatchDecision) -> Result<(), ShellError> {
        match decision {
            DispatchDecision::Handled => {}
            DispatchDecision::RunSingle(argv) => {
                let status = ExternalCommand::new(argv).run(&self.env)?;
                debug!(code = status_code(status), "command finished");
            }
            DispatchDecision::RunPiped(first, second) => {
                run_pipeline(
                    &ExternalCommand::new(first),
                    &ExternalCommand::new(second),
                    &self.env,
                )?;
            }
        }
        Ok(())
    }

    /// Process one line and dispatch the result.
    pub fn run_line(&mut self, line: &str, stdout: &mut dyn Write) -> Result<(), ShellError> {
        let decision = self.process(line, stdout)?;
        // keep builtin output ahead of anything the children print
        stdout.flush()?;
        self.dispatch(decision)
    }
}

impl Default for Interpreter {
    /// An interpreter over the current process environment that exits the process
    /// on `exit`.
    fn default() -> Self {
        Self::new(
            Environment::new(),
            Limits::default(),
            Box::new(ProcessTerminator),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ArgumentVector;
    use std::cell::Cell;
    use std::fs;
    use std::path::Path;
    use std::rc::Rc;
    use std::time::{Duration, Instant};

    /// Records the exit code instead of ending the test process.
    struct RecordingTerminator(Rc<Cell<Option<ExitCode>>>);

    impl Terminator for RecordingTerminator {
        fn terminate(&mut self, code: ExitCode) {
            self.0.set(Some(code));
        }
    }

    fn interpreter_in(dir: &Path) -> (Interpreter, Rc<Cell<Option<ExitCode>>>) {
        let exited = Rc::new(Cell::new(None));
        let mut env = Environment::new();
        env.current_dir = dir.to_path_buf();
        env.set_var("USER", "tester");
        let sh = Interpreter::new(
            env,
            Limits::default(),
            Box::new(RecordingTerminator(exited.clone())),
        );
        (sh, exited)
    }

    fn argv(words: &[&str]) -> ArgumentVector {
        ArgumentVector::new(words.iter().map(|w| w.to_string()).collect()).unwrap()
    }

    fn process(sh: &mut Interpreter, line: &str) -> (DispatchDecision, String) {
        let mut out = Vec::new();
        let decision = sh.process(line, &mut out).unwrap();
        (decision, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_single_command_decision() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut sh, _) = interpreter_in(tmp.path());

        let (decision, out) = process(&mut sh, "echo hi");

        assert_eq!(decision, DispatchDecision::RunSingle(argv(&["echo", "hi"])));
        assert!(out.is_empty());
    }

    #[test]
    fn test_piped_decision() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut sh, _) = interpreter_in(tmp.path());

        let (decision, _) = process(&mut sh, "echo hi | wc");

        assert_eq!(
            decision,
            DispatchDecision::RunPiped(argv(&["echo", "hi"]), argv(&["wc"]))
        );
    }

    #[test]
    fn test_third_stage_is_dropped() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut sh, _) = interpreter_in(tmp.path());

        let (decision, _) = process(&mut sh, "a|b|c");

        assert_eq!(decision, DispatchDecision::RunPiped(argv(&["a"]), argv(&["b"])));
    }

    #[test]
    fn test_exit_invokes_terminator() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut sh, exited) = interpreter_in(tmp.path());

        let (decision, out) = process(&mut sh, "exit");

        assert_eq!(decision, DispatchDecision::Handled);
        assert_eq!(out, "Goodbye\n");
        assert_eq!(exited.get(), Some(0));
        assert!(sh.should_exit());
    }

    #[test]
    fn test_exit_with_flag_like_arguments_still_terminates() {
        let tmp = tempfile::tempdir().unwrap();
        for line in ["exit --now", "exit -1", "exit --help", "exit 3 | wc"] {
            let (mut sh, exited) = interpreter_in(tmp.path());

            let (decision, out) = process(&mut sh, line);

            assert_eq!(decision, DispatchDecision::Handled, "line {:?}", line);
            assert_eq!(out, "Goodbye\n", "line {:?}", line);
            assert_eq!(exited.get(), Some(0), "line {:?}", line);
        }
    }

    #[test]
    fn test_builtins_ignore_trailing_words() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut sh, exited) = interpreter_in(tmp.path());

        let (_, out) = process(&mut sh, "hello there");
        assert!(out.starts_with("Hello tester.\n"), "unexpected output {:?}", out);

        let (_, out) = process(&mut sh, "help me");
        assert!(out.contains("Built-in commands"));

        process(&mut sh, "cd /tmp extra");
        assert_eq!(sh.env().current_dir, fs::canonicalize("/tmp").unwrap());
        assert_eq!(exited.get(), None);
    }

    #[test]
    fn test_cd_changes_directory_for_later_commands() {
        let tmp = tempfile::tempdir().unwrap();
        let base = fs::canonicalize(tmp.path()).unwrap();
        fs::create_dir(base.join("work")).unwrap();
        let (mut sh, _) = interpreter_in(&base);

        let (decision, _) = process(&mut sh, "cd work");
        assert_eq!(decision, DispatchDecision::Handled);
        assert_eq!(sh.env().current_dir, base.join("work"));

        sh.run_line("touch created_here", &mut Vec::new()).unwrap();
        assert!(base.join("work").join("created_here").exists());
    }

    #[test]
    fn test_help_and_hello_do_not_spawn_or_move() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut sh, exited) = interpreter_in(tmp.path());

        let (decision, out) = process(&mut sh, "help");
        assert_eq!(decision, DispatchDecision::Handled);
        assert!(out.contains("Built-in commands"));

        let (decision, out) = process(&mut sh, "hello");
        assert_eq!(decision, DispatchDecision::Handled);
        assert!(out.starts_with("Hello tester."));

        assert_eq!(sh.env().current_dir, tmp.path());
        assert_eq!(exited.get(), None);
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_builtins_are_case_sensitive() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut sh, exited) = interpreter_in(tmp.path());

        let (decision, _) = process(&mut sh, "EXIT");

        assert_eq!(decision, DispatchDecision::RunSingle(argv(&["EXIT"])));
        assert_eq!(exited.get(), None);
    }

    #[test]
    fn test_builtin_checked_on_first_stage_only() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut sh, _) = interpreter_in(tmp.path());

        let (decision, _) = process(&mut sh, "ls | cd /");
        assert_eq!(
            decision,
            DispatchDecision::RunPiped(argv(&["ls"]), argv(&["cd", "/"]))
        );

        let (decision, out) = process(&mut sh, "help | wc -l");
        assert_eq!(decision, DispatchDecision::Handled);
        assert!(out.contains("Built-in commands"));
    }

    #[test]
    fn test_process_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut sh, _) = interpreter_in(tmp.path());

        for line in ["ls -l  /", "cat f | sort", "help", "cd ."] {
            let (first, _) = process(&mut sh, line);
            let (second, _) = process(&mut sh, line);
            assert_eq!(first, second, "line {:?}", line);
        }
    }

    #[test]
    fn test_empty_stage_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut sh, _) = interpreter_in(tmp.path());

        let err = sh.process("ls |", &mut Vec::new()).unwrap_err();

        assert!(matches!(err, ShellError::EmptyCommand));
    }

    #[test]
    fn test_limits_are_enforced() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut sh, _) = interpreter_in(tmp.path());

        let long_line = format!("echo {}", "x".repeat(1000));
        assert!(matches!(
            sh.process(&long_line, &mut Vec::new()),
            Err(ShellError::LineTooLong { .. })
        ));

        let many_args = format!("echo{}", " x".repeat(100));
        assert!(matches!(
            sh.process(&many_args, &mut Vec::new()),
            Err(ShellError::TooManyArguments { count: 101, limit: 100 })
        ));
    }

    #[test]
    fn test_run_line_single_blocks_until_done() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut sh, _) = interpreter_in(tmp.path());

        let started = Instant::now();
        sh.run_line("sleep 0.2", &mut Vec::new()).unwrap();

        assert!(started.elapsed() >= Duration::from_millis(200));
    }

    #[test]
    fn test_run_line_pipeline() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut sh, _) = interpreter_in(tmp.path());

        sh.run_line("echo hi | tee out.txt", &mut Vec::new()).unwrap();

        assert_eq!(fs::read_to_string(tmp.path().join("out.txt")).unwrap(), "hi\n");
    }

    #[test]
    fn test_failed_command_leaves_shell_usable() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut sh, _) = interpreter_in(tmp.path());

        let err = sh
            .run_line("mini_shell_no_such_command --flag", &mut Vec::new())
            .unwrap_err();
        assert!(matches!(err, ShellError::ExecFailure { .. }));

        sh.run_line("touch after", &mut Vec::new()).unwrap();
        assert!(tmp.path().join("after").exists());
    }
}
