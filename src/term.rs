//! Terminal control and session signals: raw input mode, async-signal-safe
//! signal recording, and prompt/banner rendering.

use crate::errors::{ShellError, ShellResult};
use nix::libc::c_int;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::sys::termios::{self, LocalFlags, SetArg, Termios};
use std::io::Write;
use std::os::fd::AsFd;
use std::sync::atomic::{AtomicI32, Ordering};

/// Startup banner, printed once before the first prompt.
pub const BANNER: &str = "rawsh - Simple Shell with Raw Input\n\
    Commands: 'exit' or 'quit' to exit, Ctrl+D to exit, Ctrl+C to clear input\n";

/// Puts the controlling terminal into raw input mode (no line buffering, no
/// echo) and restores the saved settings on drop.
pub struct RawModeGuard {
    original: Termios,
}

impl RawModeGuard {
    pub fn enable() -> ShellResult<Self> {
        let stdin = std::io::stdin();
        let original = termios::tcgetattr(stdin.as_fd()).map_err(ShellError::Terminal)?;
        let mut raw = original.clone();
        raw.local_flags
            .remove(LocalFlags::ICANON | LocalFlags::ECHO);
        termios::tcsetattr(stdin.as_fd(), SetArg::TCSANOW, &raw).map_err(ShellError::Terminal)?;
        log::debug!("terminal switched to raw input mode");
        Ok(Self { original })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let stdin = std::io::stdin();
        if let Err(e) = termios::tcsetattr(stdin.as_fd(), SetArg::TCSANOW, &self.original) {
            log::error!("failed to restore terminal settings: {}", e);
        }
    }
}

// Most recent signal delivered since the last poll; 0 means none.
static PENDING_SIGNAL: AtomicI32 = AtomicI32::new(0);

extern "C" fn record_signal(signal: c_int) {
    // Only this store is allowed here; all reactions happen in the main
    // loop between keystrokes.
    PENDING_SIGNAL.store(signal, Ordering::Relaxed);
}

/// Route session signals through the pending-signal flag.
///
/// SIGINT, SIGTERM, SIGQUIT and SIGTSTP are recorded without `SA_RESTART`:
/// delivery must make the blocking keystroke read fail with `EINTR`, which
/// is what sends the main loop back to its signal poll. SIGPIPE is ignored;
/// a write to a closed pipe surfaces as an I/O error instead.
pub fn install_signal_handlers() -> ShellResult<()> {
    let record = SigAction::new(
        SigHandler::Handler(record_signal),
        SaFlags::empty(),
        SigSet::empty(),
    );
    for signal in [
        Signal::SIGINT,
        Signal::SIGTERM,
        Signal::SIGQUIT,
        Signal::SIGTSTP,
    ] {
        unsafe { sigaction(signal, &record) }.map_err(ShellError::Terminal)?;
    }
    let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
    unsafe { sigaction(Signal::SIGPIPE, &ignore) }.map_err(ShellError::Terminal)?;
    log::debug!("signal handlers installed");
    Ok(())
}

/// Take the pending signal, if any, clearing the flag.
pub fn take_signal() -> Option<Signal> {
    let raw = PENDING_SIGNAL.swap(0, Ordering::Relaxed);
    if raw == 0 {
        return None;
    }
    Signal::try_from(raw).ok()
}

/// The working directory with a `$HOME` prefix abbreviated to `~`.
pub fn home_shortened_cwd() -> String {
    let cwd = match std::env::current_dir() {
        Ok(path) => path.display().to_string(),
        Err(_) => return String::from("?"),
    };
    let home = std::env::var("HOME").ok();
    shorten_home(&cwd, home.as_deref())
}

fn shorten_home(cwd: &str, home: Option<&str>) -> String {
    if let Some(home) = home.filter(|h| !h.is_empty()) {
        if let Some(rest) = cwd.strip_prefix(home) {
            return format!("~{}", rest);
        }
    }
    cwd.to_string()
}

/// Print the prompt: the abbreviated working directory followed by `> `.
///
/// `leading_newline` separates the prompt from whatever the previous
/// command left on the current line.
pub fn show_prompt(term: &mut dyn Write, leading_newline: bool) -> std::io::Result<()> {
    if leading_newline {
        term.write_all(b"\n")?;
    }
    write!(term, "{} > ", home_shortened_cwd())?;
    term.flush()
}

pub fn show_banner(term: &mut dyn Write) -> std::io::Result<()> {
    term.write_all(BANNER.as_bytes())?;
    term.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_prefix_is_abbreviated() {
        assert_eq!(
            shorten_home("/home/user/projects", Some("/home/user")),
            "~/projects"
        );
        assert_eq!(shorten_home("/home/user", Some("/home/user")), "~");
    }

    #[test]
    fn paths_outside_home_are_untouched() {
        assert_eq!(shorten_home("/var/log", Some("/home/user")), "/var/log");
        assert_eq!(shorten_home("/var/log", None), "/var/log");
        assert_eq!(shorten_home("/var/log", Some("")), "/var/log");
    }

    #[test]
    fn take_signal_clears_the_flag() {
        record_signal(Signal::SIGINT as c_int);
        assert_eq!(take_signal(), Some(Signal::SIGINT));
        assert_eq!(take_signal(), None);
    }

    #[test]
    fn recorded_signals_interrupt_blocked_reads() {
        install_signal_handlers().unwrap();
        // Read back the installed disposition: without SA_RESTART a
        // delivery makes the blocking keystroke read fail with EINTR
        // instead of resuming, so the main loop notices immediately.
        let probe = SigAction::new(
            SigHandler::Handler(record_signal),
            SaFlags::empty(),
            SigSet::empty(),
        );
        let installed = unsafe { sigaction(Signal::SIGINT, &probe) }.unwrap();
        assert!(!installed.flags().contains(SaFlags::SA_RESTART));
        // Put the recording handler back.
        unsafe { sigaction(Signal::SIGINT, &installed) }.unwrap();
    }

    #[test]
    fn terminal_setup_errors_name_the_terminal() {
        let e = ShellError::Terminal(nix::errno::Errno::EINVAL);
        assert!(e.to_string().starts_with("terminal configuration failed"));
    }

    #[test]
    fn prompt_ends_with_the_prompt_symbol() {
        let mut out = Vec::new();
        show_prompt(&mut out, false).unwrap();
        let rendered = String::from_utf8(out).unwrap();
        assert!(rendered.ends_with("> "));
        assert!(!rendered.starts_with('\n'));

        let mut out = Vec::new();
        show_prompt(&mut out, true).unwrap();
        assert!(String::from_utf8(out).unwrap().starts_with('\n'));
    }
}
