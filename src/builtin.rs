//! Builtin commands and the name → handler registry.
//!
//! Each builtin is a plain function from the token list (`argv[0]` is the
//! command name) to console output; handlers report their own errors to the
//! user. The only thing a handler can ask of the shell is to terminate,
//! via [`BuiltinAction::Exit`].
//!
//! The registry is built once at startup from a static table and is
//! immutable afterwards. Registration of a duplicate name is an error
//! rather than a silent overwrite.

use std::collections::HashMap;
use std::io::Write;
use thiserror::Error;

/// What the main loop should do after a builtin ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinAction {
    /// Keep reading input.
    Continue,
    /// Shut down the shell with this exit code.
    Exit(i32),
}

/// Signature shared by every builtin handler.
pub type BuiltinHandler = fn(&[String]) -> BuiltinAction;

/// The builtin command set: name, handler, one-line description.
const BUILTINS: &[(&str, BuiltinHandler, &str)] = &[
    ("help", cmd_help, "Show this help message"),
    ("echo", cmd_echo, "Echo arguments to stdout"),
    ("version", cmd_version, "Show version information"),
    ("clear", cmd_clear, "Clear the screen"),
    ("exit", cmd_exit, "Exit the shell"),
    ("quit", cmd_exit, "Exit the shell"),
    ("cd", cmd_cd, "Change directory"),
    ("pwd", cmd_pwd, "Print working directory"),
    ("set", cmd_set, "Set environment variable"),
    ("unset", cmd_unset, "Unset environment variable"),
    ("env", cmd_env, "List environment variables"),
    ("ls", cmd_ls, "List directory contents"),
    ("cat", cmd_cat, "Concatenate and display file contents"),
    ("touch", cmd_touch, "Create an empty file or update timestamp"),
];

#[derive(Debug, Error, PartialEq, Eq)]
#[error("builtin '{0}' is already registered")]
pub struct DuplicateCommand(pub &'static str);

/// Immutable mapping from command name to handler.
pub struct CommandRegistry {
    commands: HashMap<&'static str, BuiltinHandler>,
}

impl CommandRegistry {
    /// Build a registry holding the full builtin set.
    pub fn with_default_commands() -> Result<Self, DuplicateCommand> {
        let mut registry = Self {
            commands: HashMap::new(),
        };
        for (name, handler, _) in BUILTINS {
            registry.register(name, *handler)?;
        }
        Ok(registry)
    }

    fn register(
        &mut self,
        name: &'static str,
        handler: BuiltinHandler,
    ) -> Result<(), DuplicateCommand> {
        if self.commands.insert(name, handler).is_some() {
            return Err(DuplicateCommand(name));
        }
        Ok(())
    }

    /// Look up a builtin by exact name.
    pub fn lookup(&self, name: &str) -> Option<BuiltinHandler> {
        self.commands.get(name).copied()
    }
}

fn cmd_help(_args: &[String]) -> BuiltinAction {
    println!("Available commands:");
    for (name, _, description) in BUILTINS {
        println!("  {:<8} - {}", name, description);
    }
    BuiltinAction::Continue
}

fn cmd_echo(args: &[String]) -> BuiltinAction {
    println!("{}", args[1..].join(" "));
    BuiltinAction::Continue
}

fn cmd_version(_args: &[String]) -> BuiltinAction {
    println!("rawsh version {}", env!("CARGO_PKG_VERSION"));
    println!("A simple shell with raw terminal input processing");
    BuiltinAction::Continue
}

fn cmd_clear(_args: &[String]) -> BuiltinAction {
    // Clear screen and home the cursor.
    print!("\x1b[2J\x1b[H");
    let _ = std::io::stdout().flush();
    BuiltinAction::Continue
}

fn cmd_exit(args: &[String]) -> BuiltinAction {
    match args.get(1) {
        Some(arg) => {
            // Mirrors atoi: a non-numeric argument exits with 0.
            let code = arg.parse::<i32>().unwrap_or(0);
            println!("Exiting with code {}", code);
            BuiltinAction::Exit(code)
        }
        None => {
            println!("Goodbye!");
            BuiltinAction::Exit(0)
        }
    }
}

fn cmd_cd(args: &[String]) -> BuiltinAction {
    match args.get(1) {
        Some(target) => {
            if let Err(e) = std::env::set_current_dir(target) {
                eprintln!("cd: {}: {}", target, e);
            } else {
                log::debug!("changed directory to: {}", target);
            }
        }
        None => eprintln!("cd: missing operand"),
    }
    BuiltinAction::Continue
}

fn cmd_pwd(_args: &[String]) -> BuiltinAction {
    match std::env::current_dir() {
        Ok(cwd) => println!("{}", cwd.display()),
        Err(e) => eprintln!("pwd: {}", e),
    }
    BuiltinAction::Continue
}

fn cmd_set(args: &[String]) -> BuiltinAction {
    let Some(assignment) = args.get(1) else {
        println!("Usage: set VARIABLE=value");
        return BuiltinAction::Continue;
    };
    match assignment.split_once('=') {
        Some((variable, value)) if !variable.is_empty() => {
            std::env::set_var(variable, value);
        }
        _ => println!("set: Invalid format. Use VARIABLE=value"),
    }
    BuiltinAction::Continue
}

fn cmd_unset(args: &[String]) -> BuiltinAction {
    match args.get(1) {
        Some(variable) => std::env::remove_var(variable),
        None => println!("Usage: unset VARIABLE"),
    }
    BuiltinAction::Continue
}

fn cmd_env(_args: &[String]) -> BuiltinAction {
    for (key, value) in std::env::vars() {
        println!("{}={}", key, value);
    }
    BuiltinAction::Continue
}

fn cmd_ls(args: &[String]) -> BuiltinAction {
    let path = args.get(1).map(String::as_str).unwrap_or(".");
    let entries = match std::fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("ls: {}: {}", path, e);
            return BuiltinAction::Continue;
        }
    };
    println!("Contents of {}:", path);
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') {
            continue;
        }
        // Trailing marker by file type: '/' for directories, '*' for
        // anything that is neither a directory nor a regular file.
        match std::fs::metadata(entry.path()) {
            Ok(meta) if meta.is_dir() => println!("  {}/", name),
            Ok(meta) if meta.is_file() => println!("  {}", name),
            Ok(_) => println!("  {}*", name),
            Err(_) => println!("  {}", name),
        }
    }
    BuiltinAction::Continue
}

fn cmd_cat(args: &[String]) -> BuiltinAction {
    let Some(filename) = args.get(1) else {
        println!("Usage: cat filename");
        return BuiltinAction::Continue;
    };
    match std::fs::read_to_string(filename) {
        Ok(contents) => print!("{}", contents),
        Err(e) => eprintln!("cat: {}: {}", filename, e),
    }
    BuiltinAction::Continue
}

fn cmd_touch(args: &[String]) -> BuiltinAction {
    let Some(filename) = args.get(1) else {
        println!("Usage: touch filename");
        return BuiltinAction::Continue;
    };
    if let Err(e) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(filename)
    {
        eprintln!("touch: {}: {}", filename, e);
    }
    BuiltinAction::Continue
}
