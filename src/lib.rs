//! An interactive shell built on raw terminal input.
//!
//! Keystrokes are read one byte at a time with line discipline disabled;
//! the shell does its own echo, cursor movement, history browsing, and
//! escape-sequence decoding. Committed lines are tokenized and dispatched
//! to builtin commands or to external binaries resolved through the
//! `BINPATH` search list, with optional `>`/`>>` stdout redirection.
//!
//! Module map:
//! - [`editor`]: the edit buffer and per-byte input state machine;
//! - [`history`]: the fixed-capacity command history ring;
//! - [`lexer`]: quote-aware tokenization and redirection extraction;
//! - [`builtin`]: the builtin command set and its registry;
//! - [`external`]: binary resolution and fork/exec execution;
//! - [`redirect`]: scoped stdout redirection;
//! - [`interpreter`]: dispatch of committed lines;
//! - [`term`]: raw mode, signals, prompt rendering;
//! - [`logging`]: the log sink.

pub mod builtin;
pub mod editor;
pub mod errors;
pub mod external;
pub mod history;
pub mod interpreter;
pub mod lexer;
pub mod logging;
pub mod redirect;
pub mod term;

pub use builtin::DuplicateCommand;
pub use editor::{EditOutcome, LineEditor};
pub use errors::{ShellError, ShellResult};
pub use history::HistoryStore;
pub use interpreter::{Interpreter, RunOutcome};

use std::path::PathBuf;

/// Name of the history file kept in the user's home directory.
pub const HISTORY_FILE_NAME: &str = ".rawsh_history";

/// The mutable state of one interactive session.
pub struct ShellContext {
    pub editor: LineEditor,
    pub history: HistoryStore,
    pub interpreter: Interpreter,
}

impl ShellContext {
    pub fn new() -> Result<Self, DuplicateCommand> {
        Ok(Self {
            editor: LineEditor::new(),
            history: HistoryStore::new(),
            interpreter: Interpreter::new()?,
        })
    }

    /// Where history is persisted, or `None` when `$HOME` is unset.
    pub fn history_file() -> Option<PathBuf> {
        let home = std::env::var("HOME").ok()?;
        if home.is_empty() {
            return None;
        }
        Some(PathBuf::from(home).join(HISTORY_FILE_NAME))
    }
}
