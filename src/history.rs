//! Command history: a fixed-capacity ring of past lines plus a browsing
//! cursor and a saved-draft slot.
//!
//! The store never touches the terminal. Navigation calls return the owned
//! line that should become the new edit-buffer content; the editor owns all
//! screen updates.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Default number of retained entries.
pub const HISTORY_CAPACITY: usize = 100;

/// Fixed-capacity command history with two-mode navigation.
///
/// `count` is monotonic and may exceed the capacity; the physical slot of
/// logical entry `i` is `i % capacity`, so inserting past capacity
/// overwrites the oldest entry. While the user browses, `cursor` holds the
/// logical index of the displayed entry and `draft` holds the live input
/// that browsing displaced.
pub struct HistoryStore {
    entries: Vec<Option<String>>,
    capacity: usize,
    count: usize,
    cursor: Option<usize>,
    draft: Option<String>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "history capacity must be non-zero");
        Self {
            entries: vec![None; capacity],
            capacity,
            count: 0,
            cursor: None,
            draft: None,
        }
    }

    /// Number of lines ever added (monotonic, may exceed capacity).
    pub fn count(&self) -> usize {
        self.count
    }

    /// True while the user is browsing history rather than editing live
    /// input.
    pub fn browsing(&self) -> bool {
        self.cursor.is_some()
    }

    /// Logical index of the displayed entry while browsing.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Record a committed line.
    ///
    /// Empty lines and consecutive duplicates are ignored.
    pub fn add(&mut self, line: &str) {
        if line.is_empty() {
            return;
        }
        if self.count > 0 {
            let last = (self.count - 1) % self.capacity;
            if self.entries[last].as_deref() == Some(line) {
                log::debug!("skipping duplicate history entry");
                return;
            }
        }
        self.insert_raw(line);
        log::debug!("added history entry [{}]: {}", self.count - 1, line);
    }

    fn insert_raw(&mut self, line: &str) {
        let slot = self.count % self.capacity;
        self.entries[slot] = Some(line.to_string());
        self.count += 1;
    }

    /// Logical index of the oldest entry still held by the ring.
    fn oldest_available(&self) -> usize {
        self.count.saturating_sub(self.capacity)
    }

    fn entry(&self, logical: usize) -> Option<&str> {
        self.entries[logical % self.capacity].as_deref()
    }

    /// Move toward older entries.
    ///
    /// On the first call of a browsing session the live input is
    /// snapshotted into the draft slot and the newest entry is selected;
    /// subsequent calls step back until the oldest retained entry, where
    /// navigation clamps. Returns the line to display, or `None` if there
    /// was no movement.
    pub fn navigate_up(&mut self, live_input: &str) -> Option<String> {
        if self.count == 0 {
            return None;
        }
        match self.cursor {
            None => {
                self.draft = Some(live_input.to_string());
                self.cursor = Some(self.count - 1);
            }
            Some(index) => {
                if index > self.oldest_available() {
                    self.cursor = Some(index - 1);
                } else {
                    // Already at the oldest retained entry.
                    return None;
                }
            }
        }
        let line = self.entry(self.cursor.unwrap()).map(str::to_string);
        if let Some(ref l) = line {
            log::debug!("history up -> [{}]: {}", self.cursor.unwrap(), l);
        }
        line
    }

    /// Move toward newer entries.
    ///
    /// Stepping past the newest entry ends browsing and yields the saved
    /// draft (an empty string when there was none). Returns `None` when not
    /// browsing.
    pub fn navigate_down(&mut self) -> Option<String> {
        let index = self.cursor? + 1;
        if index >= self.count {
            self.cursor = None;
            let restored = self.draft.take().unwrap_or_default();
            log::debug!("history down -> restored draft: {}", restored);
            return Some(restored);
        }
        self.cursor = Some(index);
        let line = self.entry(index).map(str::to_string);
        if let Some(ref l) = line {
            log::debug!("history down -> [{}]: {}", index, l);
        }
        line
    }

    /// Leave browsing mode and discard any saved draft.
    ///
    /// Called whenever the user types, submits a line, or the pending
    /// command is otherwise abandoned.
    pub fn reset_navigation(&mut self) {
        self.cursor = None;
        self.draft = None;
    }

    /// Write the retained entries to `path`, oldest to newest, one per
    /// line.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let mut file = File::create(path)?;
        let start = self.oldest_available();
        for logical in start..self.count {
            if let Some(line) = self.entry(logical) {
                writeln!(file, "{}", line)?;
            }
        }
        log::debug!(
            "saved {} history entries to {}",
            self.count - start,
            path.display()
        );
        Ok(())
    }

    /// Replay a history file through ring insertion.
    ///
    /// Unlike [`add`](Self::add), consecutive duplicates are kept — the
    /// file is replayed verbatim. A missing file is not an error.
    pub fn load(&mut self, path: &Path) -> std::io::Result<()> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no history file at {}", path.display());
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let mut loaded = 0usize;
        for line in BufReader::new(file).lines() {
            let line = line?;
            if !line.is_empty() {
                self.insert_raw(&line);
                loaded += 1;
            }
        }
        log::debug!("loaded {} history entries from {}", loaded, path.display());
        Ok(())
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}
