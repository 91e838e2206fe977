use crate::command::{ArgumentVector, ExitCode};
use crate::env::Environment;
use crate::error::ShellError;
use nix::libc;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use tracing::debug;

/// Command that is not a builtin.
#[derive(Debug, Clone)]
pub(crate) struct ExternalCommand {
    argv: ArgumentVector,
}

impl ExternalCommand {
    pub fn new(argv: ArgumentVector) -> Self {
        Self { argv }
    }

    pub fn program(&self) -> &str {
        self.argv.program()
    }

    /// Run the program with the shell's own stdin and stdout and wait for it.
    pub fn run(&self, env: &Environment) -> Result<ExitStatus, ShellError> {
        let mut child = self.spawn(env, Stdio::inherit(), Stdio::inherit())?;
        self.wait(&mut child)
    }

    /// Start the program without waiting for it.
    ///
    /// The program is resolved through the environment's `PATH` and started in the
    /// environment's working directory with exactly the environment's variables.
    /// `argv[0]` stays the name the user typed. Nothing is spawned when the program
    /// cannot be resolved.
    pub fn spawn(
        &self,
        env: &Environment,
        stdin: Stdio,
        stdout: Stdio,
    ) -> Result<Child, ShellError> {
        let program = self.program();
        let path = find_command_path(env, program).ok_or_else(|| {
            debug!(program, "command not found");
            ShellError::ExecFailure {
                program: program.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "command not found"),
            }
        })?;

        debug!(program, path = %path.display(), args = ?self.argv.args(), "spawning");
        Command::new(&path)
            .arg0(program)
            .args(self.argv.args())
            .env_clear()
            .envs(&env.vars)
            .current_dir(&env.current_dir)
            .stdin(stdin)
            .stdout(stdout)
            .spawn()
            .map_err(|source| {
                debug!(program, error = %source, "spawn failed");
                classify_spawn_error(program, source)
            })
    }

    pub fn wait(&self, child: &mut Child) -> Result<ExitStatus, ShellError> {
        let status = child.wait().map_err(|source| ShellError::Wait {
            program: self.program().to_string(),
            source,
        })?;
        debug!(
            program = self.program(),
            pid = child.id(),
            code = status_code(status),
            "exited"
        );
        Ok(status)
    }
}

/// Spawn errors caused by the program image itself are exec failures; anything
/// else means the OS could not create the process.
fn classify_spawn_error(program: &str, source: io::Error) -> ShellError {
    let program = program.to_string();
    let exec_failure = matches!(
        source.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
    ) || source.raw_os_error() == Some(libc::ENOEXEC);
    if exec_failure {
        ShellError::ExecFailure { program, source }
    } else {
        ShellError::ProcessCreation { program, source }
    }
}

/// Collapse an exit status into a shell-style code, `128 + signal` for signals.
pub(crate) fn status_code(status: ExitStatus) -> ExitCode {
    if let Some(code) = status.code() {
        code
    } else if let Some(signal) = status.signal() {
        128 + signal
    } else if status.core_dumped() {
        255
    } else {
        -1
    }
}

/// Resolve a command name the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it is an executable file.
/// - Any path with more than one component (`./foo`, `bin/sh`): resolved against
///   the environment's working directory, not the shell process's.
/// - Single component: search each directory of the environment's `PATH` in order;
///   relative and empty `PATH` entries are taken relative to the working directory.
/// - Empty name: `None`.
pub(crate) fn find_command_path(env: &Environment, name: &str) -> Option<PathBuf> {
    let path = Path::new(name);
    if path.is_absolute() {
        return is_executable(path).then(|| path.to_path_buf());
    }

    let mut components = path.components();
    match (components.next(), components.next()) {
        (None, _) => None,
        (Some(_), None) => {
            let search_paths = env.get_var("PATH")?;
            std::env::split_paths(search_paths)
                .map(|dir| env.current_dir.join(dir).join(path))
                .find(|candidate| is_executable(candidate))
        }
        _ => {
            let candidate = env.current_dir.join(path);
            is_executable(&candidate).then_some(candidate)
        }
    }
}

fn is_executable(path: &Path) -> bool {
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}
