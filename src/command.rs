use std::fmt;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
pub type ExitCode = i32;

/// The arguments of one command: the program name followed by its arguments.
///
/// An `ArgumentVector` is never empty and never holds an empty token. Its length
/// marks its end; the terminator the OS expects is added when the program is spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentVector(Vec<String>);

impl ArgumentVector {
    /// Wrap `tokens`, or return `None` if they are empty or contain an empty token.
    pub fn new(tokens: Vec<String>) -> Option<Self> {
        if tokens.is_empty() || tokens.iter().any(String::is_empty) {
            None
        } else {
            Some(Self(tokens))
        }
    }

    /// The command name, used both for lookup and as `argv[0]`.
    pub fn program(&self) -> &str {
        &self.0[0]
    }

    /// Everything after the command name.
    pub fn args(&self) -> &[String] {
        &self.0[1..]
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for ArgumentVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" "))
    }
}

/// One or two commands produced from a single input line.
///
/// When `second` is present, the standard output of `first` feeds its standard input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineRequest {
    pub first: ArgumentVector,
    pub second: Option<ArgumentVector>,
}

impl PipelineRequest {
    pub fn is_piped(&self) -> bool {
        self.second.is_some()
    }
}

/// What the shell decided to do with one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchDecision {
    /// A built-in command already ran inside the shell.
    Handled,
    /// Launch one external program.
    RunSingle(ArgumentVector),
    /// Launch two external programs connected by a pipe.
    RunPiped(ArgumentVector, ArgumentVector),
}
