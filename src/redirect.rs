//! Scoped redirection of the process's standard output to a file.
//!
//! Entering duplicates the current stdout descriptor, opens the target
//! file, and substitutes it as fd 1. The returned guard restores the
//! original descriptor on drop, so restoration happens on every exit path
//! of command execution. A failed enter unwinds whatever it had already
//! done and the command must not be executed.

use crate::errors::{ShellError, ShellResult};
use crate::lexer::RedirectSpec;
use nix::libc::STDOUT_FILENO;
use nix::unistd::{dup, dup2};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

/// Live redirection state for one command. Dropping it restores stdout;
/// dropping an inert guard is a no-op.
#[derive(Debug)]
pub struct RedirectGuard {
    active: Option<ActiveRedirect>,
}

#[derive(Debug)]
struct ActiveRedirect {
    saved_stdout: OwnedFd,
    // Keeps the target file open for the duration of the command; closed on
    // drop after stdout is restored.
    _file: File,
}

impl RedirectGuard {
    /// Whether stdout is currently swapped out.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }
}

impl Drop for RedirectGuard {
    fn drop(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        // Flush whatever the command buffered before the descriptor swap
        // back.
        let _ = std::io::stdout().flush();
        if let Err(e) = dup2(active.saved_stdout.as_raw_fd(), STDOUT_FILENO) {
            log::error!("failed to restore stdout: {}", e);
        }
        // saved_stdout and the file close here.
    }
}

/// Begin redirecting stdout according to `spec`.
///
/// With no spec this returns an inert guard. Otherwise: `dup` the current
/// stdout, open the target in truncate or append mode, and `dup2` it onto
/// fd 1. Any failing step unwinds the earlier ones and returns an error;
/// the caller must skip command execution and report it.
pub fn enter(spec: Option<&RedirectSpec>) -> ShellResult<RedirectGuard> {
    let Some(spec) = spec else {
        return Ok(RedirectGuard { active: None });
    };

    let saved_raw = dup(STDOUT_FILENO).map_err(|e| ShellError::Redirection {
        file: spec.filename.clone(),
        source: std::io::Error::from_raw_os_error(e as i32),
    })?;
    // Owning the duplicate means an early return below closes it.
    let saved_stdout = unsafe { OwnedFd::from_raw_fd(saved_raw) };

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(!spec.append)
        .append(spec.append)
        .open(&spec.filename)
        .map_err(|e| ShellError::Redirection {
            file: spec.filename.clone(),
            source: e,
        })?;

    // Flush anything already buffered for the terminal before fd 1 starts
    // pointing at the file.
    let _ = std::io::stdout().flush();
    dup2(file.as_raw_fd(), STDOUT_FILENO).map_err(|e| ShellError::Redirection {
        file: spec.filename.clone(),
        source: std::io::Error::from_raw_os_error(e as i32),
    })?;

    log::debug!(
        "redirecting output to: {} ({} mode)",
        spec.filename,
        if spec.append { "append" } else { "truncate" }
    );
    Ok(RedirectGuard {
        active: Some(ActiveRedirect {
            saved_stdout,
            _file: file,
        }),
    })
}
