//! Remote command construction.

use std::fmt;

/// Remote directory the working tree is mirrored into, relative to the
/// login shell's home.
pub const REMOTE_WORK_DIR: &str = "experiment";

/// The user-supplied program and its parameters, as typed on the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    /// Program handed to the remote interpreter.
    pub program: String,

    /// Positional parameters following the program.
    pub params: Vec<String>,
}

impl CommandLine {
    /// Create a new CommandLine.
    pub fn new(program: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            program: program.into(),
            params,
        }
    }

    /// The program and parameters space-joined, exactly as typed.
    pub fn joined(&self) -> String {
        let mut line = self.program.clone();
        for param in &self.params {
            line.push(' ');
            line.push_str(param);
        }
        line
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.joined())
    }
}

/// Build the shell line launched on every host.
///
/// Parameters are pasted verbatim with no quoting or escaping; values
/// containing shell metacharacters reach the remote shell as-is.
pub fn remote_command(interpreter: &str, line: &CommandLine) -> String {
    format!(
        "source ~/.bash_profile; cd {REMOTE_WORK_DIR}; {interpreter} {}",
        line.joined()
    )
}
