//! Entry point: argument parsing, logging setup, and the keystroke-driven
//! prompt loop.

use anyhow::{bail, Context};
use argh::FromArgs;
use log::LevelFilter;
use nix::sys::signal::Signal;
use rawsh::{logging, term, EditOutcome, RunOutcome, ShellContext};
use std::io::{Read, Write};
use std::path::PathBuf;

/// A simple shell with raw terminal input processing.
#[derive(FromArgs)]
struct Args {
    /// log destination: CONSOLE or FILE
    #[argh(option, short = 'v')]
    log_output: Option<String>,

    /// log file path, required with '-v FILE'
    #[argh(option, short = 'f')]
    log_file: Option<PathBuf>,

    /// print the version and exit
    #[argh(switch)]
    version: bool,
}

fn main() -> anyhow::Result<()> {
    let args: Args = argh::from_env();
    if args.version {
        println!("rawsh {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }
    init_logging(&args)?;
    term::install_signal_handlers().context("installing signal handlers")?;

    let mut ctx = ShellContext::new().context("building the builtin registry")?;
    let history_file = ShellContext::history_file();
    if let Some(ref path) = history_file {
        if let Err(e) = ctx.history.load(path) {
            log::warn!("could not load history from {}: {}", path.display(), e);
        }
    }

    let raw_mode = term::RawModeGuard::enable().context("enabling raw terminal mode")?;
    let outcome = run(&mut ctx);
    // Line discipline comes back before anything else happens on the
    // terminal, including error reporting.
    drop(raw_mode);

    if let Some(ref path) = history_file {
        if let Err(e) = ctx.history.save(path) {
            log::warn!("could not save history to {}: {}", path.display(), e);
        }
    }
    std::process::exit(outcome?);
}

fn init_logging(args: &Args) -> anyhow::Result<()> {
    match args.log_output.as_deref() {
        None => Ok(()),
        Some("CONSOLE") => logging::init_console(LevelFilter::Debug),
        Some("FILE") => {
            let path = args
                .log_file
                .as_ref()
                .context("'-v FILE' requires a log file path via -f")?;
            logging::init_file(path, LevelFilter::Debug)
                .with_context(|| format!("opening log file {}", path.display()))
        }
        Some(other) => bail!(
            "unknown log destination '{}', expected CONSOLE or FILE",
            other
        ),
    }
}

/// The prompt loop: one keystroke per iteration, with pending signals
/// handled between reads. Returns the session's exit code.
fn run(ctx: &mut ShellContext) -> anyhow::Result<i32> {
    let mut stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    term::show_banner(&mut stdout)?;
    term::show_prompt(&mut stdout, false)?;

    let mut byte = [0u8; 1];
    loop {
        if let Some(code) = react_to_signal(ctx, &mut stdout)? {
            return Ok(code);
        }
        let read = match stdin.read(&mut byte) {
            Ok(n) => n,
            // Signal delivery interrupts the read; loop back to the poll
            // above.
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).context("reading keystroke"),
        };
        if read == 0 {
            // The input stream closed under us.
            stdout.write_all(b"\n")?;
            return Ok(0);
        }
        match ctx
            .editor
            .process_byte(byte[0], &mut stdout, &mut ctx.history)
            .context("writing echo output")?
        {
            EditOutcome::Pending => {}
            EditOutcome::Submitted(line) if line.is_empty() => {
                term::show_prompt(&mut stdout, true)?;
            }
            EditOutcome::Submitted(line) => match ctx.interpreter.run_line(&line) {
                RunOutcome::Continue => term::show_prompt(&mut stdout, true)?,
                RunOutcome::Exit(code) => return Ok(code),
            },
            EditOutcome::EndOfInput => {
                stdout.write_all(b"\n")?;
                return Ok(0);
            }
        }
    }
}

fn react_to_signal(ctx: &mut ShellContext, stdout: &mut impl Write) -> anyhow::Result<Option<i32>> {
    let Some(signal) = term::take_signal() else {
        return Ok(None);
    };
    log::debug!("reacting to signal {}", signal);
    match signal {
        Signal::SIGINT => {
            // Throw away the line under edit and start fresh.
            ctx.editor.abandon_line(&mut ctx.history);
            stdout.write_all(b"\n[SIGINT received - input cleared, use Ctrl+D or 'exit' to quit]\n")?;
            term::show_prompt(stdout, false)?;
            Ok(None)
        }
        Signal::SIGTERM => {
            stdout.write_all(b"\n[SIGTERM received - cleaning up]\n")?;
            Ok(Some(0))
        }
        Signal::SIGTSTP => {
            stdout.write_all(b"\n[SIGTSTP received - shell cannot be suspended in raw mode]\n")?;
            term::show_prompt(stdout, false)?;
            Ok(None)
        }
        _ => {
            // SIGQUIT carries no job-control meaning here.
            stdout.write_all(b"\n[SIGQUIT received - ignored]\n")?;
            term::show_prompt(stdout, false)?;
            Ok(None)
        }
    }
}
