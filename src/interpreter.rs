//! Command dispatch: from a committed line to a builtin or an external
//! process, with output redirection scoped around the execution.

use crate::builtin::{BuiltinAction, CommandRegistry, DuplicateCommand};
use crate::errors::ShellError;
use crate::external::{run_external, ExitOutcome};
use crate::lexer::tokenize;
use crate::redirect;

/// What the main loop should do after a line ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Keep reading input.
    Continue,
    /// A builtin requested shutdown with this exit code.
    Exit(i32),
}

/// Executes committed command lines against the builtin registry and the
/// external-command resolver.
pub struct Interpreter {
    registry: CommandRegistry,
}

impl Interpreter {
    pub fn new() -> Result<Self, DuplicateCommand> {
        Ok(Self {
            registry: CommandRegistry::with_default_commands()?,
        })
    }

    /// Run one committed line.
    ///
    /// Order of operations: tokenize, enter redirection, dispatch. A failed
    /// redirection setup reports the error and skips execution entirely.
    /// Builtins take precedence over external commands of the same name.
    pub fn run_line(&self, line: &str) -> RunOutcome {
        let parsed = tokenize(line);
        if parsed.tokens.is_empty() {
            return RunOutcome::Continue;
        }

        let guard = match redirect::enter(parsed.redirect.as_ref()) {
            Ok(guard) => guard,
            Err(e) => {
                eprintln!("Error: {}", e);
                log::error!("redirection setup failed: {}", e);
                return RunOutcome::Continue;
            }
        };

        if let Some(handler) = self.registry.lookup(&parsed.tokens[0]) {
            let action = handler(&parsed.tokens);
            drop(guard);
            return match action {
                BuiltinAction::Continue => RunOutcome::Continue,
                BuiltinAction::Exit(code) => RunOutcome::Exit(code),
            };
        }

        match run_external(&parsed.tokens) {
            Ok(ExitOutcome::CommandNotFound) => {
                // Restore stdout before reporting; the message belongs to
                // the terminal, not the redirection target.
                drop(guard);
                let e = ShellError::CommandNotFound(parsed.tokens[0].clone());
                eprintln!("Error: {}", e);
            }
            Ok(outcome) => {
                if let Some(code) = outcome.code() {
                    log::debug!("command finished with status {}", code);
                }
            }
            Err(e) => {
                drop(guard);
                eprintln!("Error: {}", e);
                log::error!("external command failed: {}", e);
            }
        }
        RunOutcome::Continue
    }
}
