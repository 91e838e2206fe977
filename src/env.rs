use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;

/// The shell's view of the process environment.
///
/// The environment contains:
/// - `vars`: the variables handed to every spawned program.
/// - `current_dir`: the working directory every spawned program starts in.
/// - `should_exit`: set by the `exit` builtin; the input loop stops once it is true.
///
/// The shell never changes its own process working directory. `cd` only updates
/// `current_dir`, and the launchers pass it explicitly to each child.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Key-value store of environment variables (e.g., PATH, HOME, USER).
    pub vars: HashMap<String, String>,
    /// The working directory for command execution.
    pub current_dir: PathBuf,
    /// When set to true, the interactive loop should end.
    pub should_exit: bool,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    ///
    /// Variables are copied from `std::env::vars()` once; later changes to the
    /// process environment are not observed.
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars,
            current_dir,
            should_exit: false,
        }
    }

    pub fn get_var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
