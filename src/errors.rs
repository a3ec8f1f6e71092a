use std::io;
use thiserror::Error;

/// Failures surfaced by the shell's library components.
///
/// Soft per-keystroke conditions (buffer overflow, malformed escape
/// sequences) are absorbed by the editor and never reach this type; these
/// variants cover the per-command and per-session failure paths.
#[derive(Error, Debug)]
pub enum ShellError {
    /// The command name could not be resolved to a builtin or an executable.
    #[error("unknown command '{0}'")]
    CommandNotFound(String),

    /// Setting up stdout redirection failed; the command was not executed.
    #[error("cannot redirect output to '{file}': {source}")]
    Redirection {
        file: String,
        #[source]
        source: io::Error,
    },

    /// Fork or wait failed while running an external command.
    #[error("failed to run external command: {0}")]
    Runner(#[source] nix::Error),

    /// Configuring terminal attributes or signal handlers failed.
    #[error("terminal configuration failed: {0}")]
    Terminal(#[source] nix::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type ShellResult<T> = Result<T, ShellError>;
