//! Resolution and execution of external commands.
//!
//! Resolution order, first match wins:
//! 1. a name containing a path separator is taken as a literal path;
//! 2. `./name` in the current working directory;
//! 3. each entry of the colon-separated `BINPATH` search list, in order.
//!
//! A candidate matches only if it carries execute permission. Execution is
//! fork/exec: the child replaces its image with the resolved binary; exec
//! failure terminates the child with status 127 and never affects the
//! parent.

use crate::errors::{ShellError, ShellResult};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{access, execv, fork, AccessFlags, ForkResult};
use std::ffi::CString;
use std::path::{Path, PathBuf};

/// Environment variable naming the external-command search list.
pub const SEARCH_PATH_VAR: &str = "BINPATH";

/// How an external command invocation ended, as seen by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Child exited normally with this code.
    Exited(i32),
    /// Child was terminated by this signal.
    Signaled(i32),
    /// The command name resolved to no executable; nothing was spawned.
    CommandNotFound,
}

impl ExitOutcome {
    /// Shell-visible status code: the exit code, or `128 + signal` for a
    /// signal death.
    pub fn code(&self) -> Option<i32> {
        match self {
            ExitOutcome::Exited(code) => Some(*code),
            ExitOutcome::Signaled(sig) => Some(128 + sig),
            ExitOutcome::CommandNotFound => None,
        }
    }
}

/// Resolve `command` to an executable path.
///
/// The search list is passed explicitly so callers (and tests) control it;
/// the production call site hands in the value of [`SEARCH_PATH_VAR`].
pub fn resolve_binary(command: &str, search_list: Option<&str>) -> Option<PathBuf> {
    if command.is_empty() {
        return None;
    }
    log::debug!("resolving binary path for: {}", command);

    // 1. Literal path (absolute or relative) when a separator is present.
    if command.contains('/') {
        let path = Path::new(command);
        if is_executable(path) {
            if let Ok(resolved) = std::fs::canonicalize(path) {
                log::debug!("resolved literal path to: {}", resolved.display());
                return Some(resolved);
            }
        }
        return None;
    }

    // 2. The current working directory.
    let cwd_candidate = Path::new(".").join(command);
    if is_executable(&cwd_candidate) {
        if let Ok(resolved) = std::fs::canonicalize(&cwd_candidate) {
            log::debug!("found in CWD: {}", resolved.display());
            return Some(resolved);
        }
    }

    // 3. The colon-separated search list, in listed order.
    let search_list = search_list?;
    for dir in search_list.split(':').filter(|d| !d.is_empty()) {
        let candidate = Path::new(dir).join(command);
        if is_executable(&candidate) {
            log::debug!("found in search path: {}", candidate.display());
            return Some(candidate);
        }
    }
    log::debug!("binary not found: {}", command);
    None
}

fn is_executable(path: &Path) -> bool {
    access(path, AccessFlags::X_OK).is_ok()
}

/// Resolve `argv[0]` and run it as a child process, blocking until it
/// terminates.
///
/// `CommandNotFound` short-circuits before any fork. Fork or wait failure
/// is a [`ShellError::Runner`]; exec failure is scoped to the child, which
/// exits with the conventional status 127.
pub fn run_external(argv: &[String]) -> ShellResult<ExitOutcome> {
    let Some(command) = argv.first() else {
        return Ok(ExitOutcome::CommandNotFound);
    };
    let search_list = std::env::var(SEARCH_PATH_VAR).ok();
    let Some(resolved) = resolve_binary(command, search_list.as_deref()) else {
        return Ok(ExitOutcome::CommandNotFound);
    };
    log::debug!("executing external command: {}", resolved.display());

    let path_c = to_cstring(&resolved.to_string_lossy())?;
    let argv_c: Vec<CString> = argv
        .iter()
        .map(|arg| to_cstring(arg))
        .collect::<ShellResult<_>>()?;

    match unsafe { fork() }.map_err(ShellError::Runner)? {
        ForkResult::Child => {
            let argv_refs: Vec<&std::ffi::CStr> =
                argv_c.iter().map(CString::as_c_str).collect();
            let _ = execv(&path_c, &argv_refs);
            // exec returned: report through the conventional status and die
            // without touching parent state.
            eprintln!("rawsh: exec failed: {}", resolved.display());
            std::process::exit(127);
        }
        ForkResult::Parent { child } => loop {
            match waitpid(child, None).map_err(ShellError::Runner)? {
                WaitStatus::Exited(_, code) => {
                    log::debug!("command exited with code: {}", code);
                    return Ok(ExitOutcome::Exited(code));
                }
                WaitStatus::Signaled(_, signal, _) => {
                    println!("Command terminated by signal {}", signal as i32);
                    log::debug!("command terminated by signal: {}", signal as i32);
                    return Ok(ExitOutcome::Signaled(signal as i32));
                }
                // Stopped/continued children are not job-controlled here;
                // keep waiting for termination.
                _ => continue,
            }
        },
    }
}

fn to_cstring(s: &str) -> ShellResult<CString> {
    CString::new(s).map_err(|_| {
        ShellError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "argument contains an interior NUL byte",
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::os::unix::fs::PermissionsExt;

    fn make_executable(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        File::create(&path).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn literal_path_resolves_when_executable() {
        let found = resolve_binary("/bin/sh", None).expect("expected /bin/sh to resolve");
        assert!(found.is_absolute());
    }

    #[test]
    fn literal_path_fails_without_execute_permission() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("data");
        File::create(&plain).unwrap();
        let literal = plain.to_string_lossy().to_string();
        assert!(resolve_binary(&literal, None).is_none());
    }

    #[test]
    fn search_list_probed_in_listed_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        make_executable(first.path(), "tool");
        make_executable(second.path(), "tool");
        let list = format!("{}:{}", first.path().display(), second.path().display());
        let found = resolve_binary("tool", Some(&list)).unwrap();
        assert!(found.starts_with(first.path()));
    }

    #[test]
    fn missing_name_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().to_string_lossy().to_string();
        assert!(resolve_binary("no-such-binary-here", Some(&list)).is_none());
    }

    #[test]
    fn cwd_takes_priority_over_search_list() {
        // Same save/restore-cwd pattern as the resolver tests this module
        // is modeled on.
        let cwd_before = std::env::current_dir().expect("cwd");
        let cwd_dir = tempfile::tempdir().unwrap();
        let path_dir = tempfile::tempdir().unwrap();
        make_executable(cwd_dir.path(), "run");
        make_executable(path_dir.path(), "run");

        std::env::set_current_dir(cwd_dir.path()).expect("set cwd");
        let list = path_dir.path().to_string_lossy().to_string();
        let found = resolve_binary("run", Some(&list));
        std::env::set_current_dir(&cwd_before).ok();

        let found = found.expect("expected CWD candidate to win");
        assert_eq!(
            found,
            std::fs::canonicalize(cwd_dir.path().join("run")).unwrap()
        );
    }

    #[test]
    fn run_reports_child_exit_code() {
        let argv: Vec<String> = ["/bin/sh", "-c", "exit 7"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let outcome = run_external(&argv).unwrap();
        assert_eq!(outcome, ExitOutcome::Exited(7));
        assert_eq!(outcome.code(), Some(7));
    }

    #[test]
    fn run_unknown_command_short_circuits() {
        let argv = vec!["definitely-not-a-command-xyz".to_string()];
        let outcome = run_external(&argv).unwrap();
        assert_eq!(outcome, ExitOutcome::CommandNotFound);
        assert_eq!(outcome.code(), None);
    }

    #[test]
    fn signal_death_maps_to_128_plus_signal() {
        assert_eq!(ExitOutcome::Signaled(9).code(), Some(137));
    }
}
