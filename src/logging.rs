//! Leveled logging for the shell, wired to the [`log`] facade.
//!
//! The shell logs either to stderr (console mode) or to a file, selected on
//! the command line at startup. Core modules only ever use the `log`
//! macros; this module owns the sink.

use log::{LevelFilter, Metadata, Record};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

enum Sink {
    Stderr,
    File(Mutex<std::fs::File>),
}

struct ShellLogger {
    sink: Sink,
}

impl log::Log for ShellLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match &self.sink {
            Sink::Stderr => {
                eprintln!("[{}] {}", record.level(), record.args());
            }
            Sink::File(file) => {
                if let Ok(mut f) = file.lock() {
                    // A failed write degrades to silence; logging must never
                    // take down the shell.
                    let _ = writeln!(f, "[{}] {}", record.level(), record.args());
                }
            }
        }
    }

    fn flush(&self) {
        if let Sink::File(file) = &self.sink {
            if let Ok(mut f) = file.lock() {
                let _ = f.flush();
            }
        }
    }
}

/// Install a logger that writes leveled lines to stderr.
pub fn init_console(level: LevelFilter) -> anyhow::Result<()> {
    install(ShellLogger { sink: Sink::Stderr }, level)
}

/// Install a logger that appends leveled lines to `path`.
pub fn init_file(path: &Path, level: LevelFilter) -> anyhow::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    install(
        ShellLogger {
            sink: Sink::File(Mutex::new(file)),
        },
        level,
    )
}

fn install(logger: ShellLogger, level: LevelFilter) -> anyhow::Result<()> {
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(level);
    Ok(())
}
