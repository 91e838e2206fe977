//! Two-stage pipelines: `first | second`.
//!
//! Both pipe ends are owned handles. Each end moves into the child that uses it
//! and the shell's copy is closed as soon as that child is spawned, so every exit
//! path (success, a stage that fails to start, an early return) releases them.

use crate::env::Environment;
use crate::error::ShellError;
use crate::external::{ExternalCommand, status_code};
use nix::fcntl::OFlag;
use nix::unistd;
use std::os::fd::{AsRawFd, OwnedFd};
use std::process::{ExitStatus, Stdio};
use tracing::{debug, warn};

/// An anonymous pipe whose ends are not inherited across exec unless they are
/// installed as a child's stdin or stdout.
struct AnonymousPipe {
    reader: OwnedFd,
    writer: OwnedFd,
}

impl AnonymousPipe {
    fn open() -> Result<Self, ShellError> {
        let (reader, writer) =
            unistd::pipe2(OFlag::O_CLOEXEC).map_err(ShellError::PipeCreation)?;
        Ok(Self { reader, writer })
    }
}

/// Run `first` with its stdout connected to the stdin of `second`, then wait for
/// both to exit.
///
/// If `first` cannot be started nothing runs. If `second` cannot be started,
/// `first` is reaped before the error is returned; with no reader left it sees a
/// broken pipe as soon as it writes.
pub(crate) fn run_pipeline(
    first: &ExternalCommand,
    second: &ExternalCommand,
    env: &Environment,
) -> Result<(ExitStatus, ExitStatus), ShellError> {
    let AnonymousPipe { reader, writer } = AnonymousPipe::open()?;
    debug!(
        writer = writer.as_raw_fd(),
        reader = reader.as_raw_fd(),
        "pipe created"
    );

    let mut producer = first.spawn(env, Stdio::inherit(), Stdio::from(writer))?;

    let mut consumer = match second.spawn(env, Stdio::from(reader), Stdio::inherit()) {
        Ok(child) => child,
        Err(err) => {
            debug!(program = first.program(), "second stage failed to start, reaping first");
            if let Err(wait_err) = first.wait(&mut producer) {
                warn!(error = %wait_err, "could not reap first stage");
            }
            return Err(err);
        }
    };

    let first_status = first.wait(&mut producer);
    let second_status = second.wait(&mut consumer);
    let statuses = (first_status?, second_status?);
    debug!(
        first = status_code(statuses.0),
        second = status_code(statuses.1),
        "pipeline finished"
    );
    Ok(statuses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ArgumentVector;
    use std::fs;

    fn command(words: &[&str]) -> ExternalCommand {
        ExternalCommand::new(
            ArgumentVector::new(words.iter().map(|w| w.to_string()).collect()).unwrap(),
        )
    }

    fn env_in(dir: &std::path::Path) -> Environment {
        let mut env = Environment::new();
        env.current_dir = dir.to_path_buf();
        env
    }

    #[test]
    fn test_pipe_ends_close_on_exec() {
        use nix::fcntl::{FcntlArg, FdFlag, fcntl};

        let pipe = AnonymousPipe::open().unwrap();
        for end in [&pipe.reader, &pipe.writer] {
            let flags = fcntl(end.as_raw_fd(), FcntlArg::F_GETFD).unwrap();
            assert!(FdFlag::from_bits_truncate(flags).contains(FdFlag::FD_CLOEXEC));
        }
    }

    #[test]
    fn test_second_stage_reads_exactly_first_stage_output() {
        let tmp = tempfile::tempdir().unwrap();
        let env = env_in(tmp.path());

        let (first, second) = run_pipeline(
            &command(&["printf", "one\\ntwo\\n"]),
            &command(&["tee", "captured.txt"]),
            &env,
        )
        .unwrap();

        assert!(first.success());
        assert!(second.success());
        let captured = fs::read_to_string(tmp.path().join("captured.txt")).unwrap();
        assert_eq!(captured, "one\ntwo\n");
    }

    #[test]
    fn test_consumer_sees_end_of_stream() {
        // wc only finishes once every write end of the pipe is closed
        let tmp = tempfile::tempdir().unwrap();
        let env = env_in(tmp.path());

        let (_, second) = run_pipeline(
            &command(&["echo", "hi"]),
            &command(&["sh", "-c", "wc -c > count.txt"]),
            &env,
        )
        .unwrap();

        assert!(second.success());
        let count = fs::read_to_string(tmp.path().join("count.txt")).unwrap();
        assert_eq!(count.trim(), "3");
    }

    #[test]
    fn test_early_exit_of_consumer_does_not_hang() {
        let tmp = tempfile::tempdir().unwrap();
        let env = env_in(tmp.path());

        let (_, second) = run_pipeline(
            &command(&["yes"]),
            &command(&["sh", "-c", "head -n 2 > head.txt"]),
            &env,
        )
        .unwrap();

        assert!(second.success());
        let head = fs::read_to_string(tmp.path().join("head.txt")).unwrap();
        assert_eq!(head, "y\ny\n");
    }

    #[test]
    fn test_unknown_first_stage_starts_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let env = env_in(tmp.path());

        let err = run_pipeline(
            &command(&["mini_shell_no_such_command"]),
            &command(&["touch", "should_not_exist"]),
            &env,
        )
        .unwrap_err();

        assert!(matches!(err, ShellError::ExecFailure { .. }));
        assert!(!tmp.path().join("should_not_exist").exists());
    }

    #[test]
    fn test_unknown_second_stage_reaps_first() {
        let tmp = tempfile::tempdir().unwrap();
        let env = env_in(tmp.path());

        let err = run_pipeline(
            &command(&["touch", "first_ran"]),
            &command(&["mini_shell_no_such_command"]),
            &env,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ShellError::ExecFailure { ref program, .. } if program == "mini_shell_no_such_command"
        ));
        // reaped, so its effect is complete
        assert!(tmp.path().join("first_ran").exists());
    }
}
