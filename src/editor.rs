//! Character-level line editing: the live edit buffer, cursor movement,
//! escape-sequence decoding, and screen echo.
//!
//! [`LineEditor::process_byte`] consumes exactly one input byte per call
//! and never blocks on further reads; a pending escape sequence is held as
//! explicit state across calls. All echo goes through the caller-provided
//! [`Write`] sink, so tests drive the editor with an in-memory buffer.

use crate::history::HistoryStore;
use std::io::Write;

/// Maximum number of bytes a single input line may hold.
pub const MAX_INPUT_LEN: usize = 1023;

const ESC: u8 = 0x1b;
const EOT: u8 = 0x04;
const TAB: u8 = 0x09;
const BS: u8 = 0x08;
const DEL: u8 = 0x7f;

/// The editable command line: content plus insertion point.
///
/// Invariant: `0 <= cursor <= len < capacity + 1`. Only printable ASCII
/// ever enters the buffer (typed input is range-checked and
/// [`set_content`](Self::set_content) filters history lines), so byte
/// arithmetic, character arithmetic, and screen columns all coincide.
pub struct EditBuffer {
    content: String,
    cursor: usize,
    capacity: usize,
}

impl EditBuffer {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            content: String::new(),
            cursor: 0,
            capacity,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn is_full(&self) -> bool {
        self.content.len() >= self.capacity
    }

    /// Insert `ch` at the cursor, shifting the tail right. Returns `false`
    /// when the buffer is at capacity.
    fn insert_at_cursor(&mut self, ch: char) -> bool {
        if self.is_full() {
            return false;
        }
        debug_assert!(self.cursor <= self.content.len());
        self.content.insert(self.cursor, ch);
        self.cursor += 1;
        true
    }

    /// Remove the character before the cursor, shifting the tail left.
    /// Returns `false` when the cursor is at column zero.
    fn delete_before_cursor(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.content.remove(self.cursor - 1);
        self.cursor -= 1;
        true
    }

    fn cursor_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    /// Move right, returning the character stepped over (needed for echo).
    fn cursor_right(&mut self) -> Option<char> {
        let ch = self.content[self.cursor..].chars().next()?;
        self.cursor += 1;
        Some(ch)
    }

    /// Replace the whole content (history load); the cursor moves to the
    /// end.
    ///
    /// History files are user-editable and may hold arbitrary text;
    /// anything outside printable ASCII is dropped so the single-column
    /// cursor arithmetic stays valid, and the result is truncated to
    /// capacity.
    fn set_content(&mut self, line: &str) {
        self.content.clear();
        self.content.extend(
            line.chars()
                .filter(|c| (' '..='~').contains(c))
                .take(self.capacity),
        );
        self.cursor = self.content.len();
    }

    fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }
}

/// Escape-sequence decoding state, advanced one byte per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EscapeState {
    Normal,
    /// Saw ESC; the next byte should be the CSI introducer.
    Intro,
    /// Saw ESC plus one byte; the next byte completes the sequence.
    Csi { intro: u8 },
}

/// What the caller should do after feeding one byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Keep reading input.
    Pending,
    /// A line was committed; an empty string means the user hit Enter on an
    /// empty buffer (redraw the prompt, run nothing).
    Submitted(String),
    /// End of input (Ctrl+D on an empty line); shut the session down.
    EndOfInput,
}

/// The interactive line editor state machine.
pub struct LineEditor {
    buffer: EditBuffer,
    escape: EscapeState,
}

impl LineEditor {
    pub fn new() -> Self {
        Self::with_capacity(MAX_INPUT_LEN)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: EditBuffer::with_capacity(capacity),
            escape: EscapeState::Normal,
        }
    }

    pub fn buffer(&self) -> &EditBuffer {
        &self.buffer
    }

    /// Discard the current line without committing it (used when a signal
    /// interrupts editing).
    pub fn abandon_line(&mut self, history: &mut HistoryStore) {
        history.reset_navigation();
        self.buffer.clear();
        self.escape = EscapeState::Normal;
    }

    /// Consume one input byte.
    ///
    /// Side effects are confined to the edit buffer, the history store's
    /// navigation state, and echo written to `term`.
    pub fn process_byte(
        &mut self,
        byte: u8,
        term: &mut dyn Write,
        history: &mut HistoryStore,
    ) -> std::io::Result<EditOutcome> {
        match self.escape {
            EscapeState::Intro => {
                self.escape = EscapeState::Csi { intro: byte };
                return Ok(EditOutcome::Pending);
            }
            EscapeState::Csi { intro } => {
                self.escape = EscapeState::Normal;
                if intro == b'[' {
                    self.handle_csi_final(byte, term, history)?;
                }
                // Any other two-byte tail is consumed and discarded.
                return Ok(EditOutcome::Pending);
            }
            EscapeState::Normal => {}
        }

        // Typing while browsing history hands the displayed entry back to
        // live editing.
        if byte != ESC && history.browsing() {
            history.reset_navigation();
        }

        match byte {
            b'\n' | b'\r' => {
                if self.buffer.is_empty() {
                    return Ok(EditOutcome::Submitted(String::new()));
                }
                term.write_all(b"\n")?;
                term.flush()?;
                let line = self.buffer.as_str().to_string();
                history.add(&line);
                history.reset_navigation();
                self.buffer.clear();
                Ok(EditOutcome::Submitted(line))
            }
            DEL | BS => {
                self.handle_backspace(term)?;
                Ok(EditOutcome::Pending)
            }
            ESC => {
                self.escape = EscapeState::Intro;
                Ok(EditOutcome::Pending)
            }
            TAB => {
                // No completion; emit a visible placeholder.
                term.write_all(b"[TAB]")?;
                term.flush()?;
                Ok(EditOutcome::Pending)
            }
            0 => Ok(EditOutcome::Pending),
            EOT => {
                if self.buffer.is_empty() {
                    Ok(EditOutcome::EndOfInput)
                } else {
                    Ok(EditOutcome::Pending)
                }
            }
            0x20..=0x7e => {
                self.handle_printable(byte as char, term)?;
                Ok(EditOutcome::Pending)
            }
            _ => Ok(EditOutcome::Pending),
        }
    }

    fn handle_printable(&mut self, ch: char, term: &mut dyn Write) -> std::io::Result<()> {
        if self.buffer.is_full() {
            // Soft overflow: drop the character, echo it in red as a visual
            // warning.
            write!(term, "\x1b[31m{}\x1b[0m", ch)?;
            term.flush()?;
            return Ok(());
        }
        let at_end = self.buffer.cursor() == self.buffer.len();
        self.buffer.insert_at_cursor(ch);
        if at_end {
            write!(term, "{}", ch)?;
        } else {
            // Redraw the inserted character and the shifted tail, then walk
            // the terminal cursor back to the edit point.
            let cursor = self.buffer.cursor();
            write!(term, "{}", &self.buffer.as_str()[cursor - 1..])?;
            let chars_after = self.buffer.len() - cursor;
            for _ in 0..chars_after {
                term.write_all(b"\x08")?;
            }
        }
        term.flush()
    }

    fn handle_backspace(&mut self, term: &mut dyn Write) -> std::io::Result<()> {
        if self.buffer.cursor() == 0 {
            return Ok(());
        }
        let at_end = self.buffer.cursor() == self.buffer.len();
        if at_end {
            self.buffer.delete_before_cursor();
            term.write_all(b"\x08 \x08")?;
        } else {
            term.write_all(b"\x08")?;
            self.buffer.delete_before_cursor();
            // Redraw the tail plus a space to erase the stale last column,
            // then reposition.
            let cursor = self.buffer.cursor();
            write!(term, "{} ", &self.buffer.as_str()[cursor..])?;
            let chars_after = self.buffer.len() - cursor;
            for _ in 0..=chars_after {
                term.write_all(b"\x08")?;
            }
        }
        term.flush()
    }

    fn handle_csi_final(
        &mut self,
        byte: u8,
        term: &mut dyn Write,
        history: &mut HistoryStore,
    ) -> std::io::Result<()> {
        match byte {
            b'D' => {
                if self.buffer.cursor_left() {
                    term.write_all(b"\x08")?;
                    term.flush()?;
                }
            }
            b'C' => {
                if let Some(ch) = self.buffer.cursor_right() {
                    write!(term, "{}", ch)?;
                    term.flush()?;
                }
            }
            b'A' => {
                if let Some(line) = history.navigate_up(self.buffer.as_str()) {
                    self.replace_displayed_line(&line, term)?;
                }
            }
            b'B' => {
                if let Some(line) = history.navigate_down() {
                    self.replace_displayed_line(&line, term)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Erase the current line on screen and show `line` in its place.
    fn replace_displayed_line(&mut self, line: &str, term: &mut dyn Write) -> std::io::Result<()> {
        // Walk back to column zero, blank the old content, walk back again.
        for _ in 0..self.buffer.cursor() {
            term.write_all(b"\x08")?;
        }
        for _ in 0..self.buffer.len() {
            term.write_all(b" ")?;
        }
        for _ in 0..self.buffer.len() {
            term.write_all(b"\x08")?;
        }
        self.buffer.set_content(line);
        term.write_all(self.buffer.as_str().as_bytes())?;
        term.flush()
    }
}

impl Default for LineEditor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(
        editor: &mut LineEditor,
        history: &mut HistoryStore,
        bytes: &[u8],
    ) -> Vec<EditOutcome> {
        let mut term = Vec::new();
        bytes
            .iter()
            .map(|&b| editor.process_byte(b, &mut term, history).unwrap())
            .collect()
    }

    fn feed_capture(
        editor: &mut LineEditor,
        history: &mut HistoryStore,
        bytes: &[u8],
    ) -> String {
        let mut term = Vec::new();
        for &b in bytes {
            editor.process_byte(b, &mut term, history).unwrap();
        }
        String::from_utf8(term).unwrap()
    }

    #[test]
    fn printable_bytes_append_and_echo() {
        let mut ed = LineEditor::new();
        let mut h = HistoryStore::new();
        let echoed = feed_capture(&mut ed, &mut h, b"ls -l");
        assert_eq!(ed.buffer().as_str(), "ls -l");
        assert_eq!(ed.buffer().cursor(), 5);
        assert_eq!(echoed, "ls -l");
    }

    #[test]
    fn enter_submits_clears_and_records_history() {
        let mut ed = LineEditor::new();
        let mut h = HistoryStore::new();
        let outcomes = feed(&mut ed, &mut h, b"pwd\n");
        assert_eq!(
            outcomes.last(),
            Some(&EditOutcome::Submitted("pwd".to_string()))
        );
        assert!(ed.buffer().is_empty());
        assert_eq!(ed.buffer().cursor(), 0);
        assert_eq!(h.count(), 1);
    }

    #[test]
    fn enter_on_empty_buffer_submits_empty_line() {
        let mut ed = LineEditor::new();
        let mut h = HistoryStore::new();
        let outcomes = feed(&mut ed, &mut h, b"\n");
        assert_eq!(outcomes, vec![EditOutcome::Submitted(String::new())]);
        assert_eq!(h.count(), 0);
    }

    #[test]
    fn carriage_return_submits_like_newline() {
        let mut ed = LineEditor::new();
        let mut h = HistoryStore::new();
        let outcomes = feed(&mut ed, &mut h, b"ls\r");
        assert_eq!(
            outcomes.last(),
            Some(&EditOutcome::Submitted("ls".to_string()))
        );
    }

    #[test]
    fn backspace_at_end_of_line() {
        let mut ed = LineEditor::new();
        let mut h = HistoryStore::new();
        let echoed = feed_capture(&mut ed, &mut h, b"abc\x7f");
        assert_eq!(ed.buffer().as_str(), "ab");
        assert_eq!(ed.buffer().cursor(), 2);
        assert!(echoed.ends_with("\x08 \x08"));
    }

    #[test]
    fn backspace_at_column_zero_is_noop() {
        let mut ed = LineEditor::new();
        let mut h = HistoryStore::new();
        feed(&mut ed, &mut h, b"\x7f\x08");
        assert!(ed.buffer().is_empty());
    }

    #[test]
    fn midline_backspace_shifts_tail_left() {
        let mut ed = LineEditor::new();
        let mut h = HistoryStore::new();
        // "abc", cursor left over 'c', delete 'b'.
        feed(&mut ed, &mut h, b"abc\x1b[D\x7f");
        assert_eq!(ed.buffer().as_str(), "ac");
        assert_eq!(ed.buffer().cursor(), 1);
    }

    #[test]
    fn midline_insert_shifts_tail_right() {
        let mut ed = LineEditor::new();
        let mut h = HistoryStore::new();
        // "ac", cursor left over 'c', insert 'b'.
        feed(&mut ed, &mut h, b"ac\x1b[Db");
        assert_eq!(ed.buffer().as_str(), "abc");
        assert_eq!(ed.buffer().cursor(), 2);
    }

    #[test]
    fn insert_then_delete_restores_buffer_at_every_position() {
        for offset in 0..=6 {
            let mut ed = LineEditor::new();
            let mut h = HistoryStore::new();
            feed(&mut ed, &mut h, b"abcdef");
            for _ in 0..offset {
                feed(&mut ed, &mut h, b"\x1b[D");
            }
            let cursor_before = ed.buffer().cursor();
            feed(&mut ed, &mut h, b"x\x7f");
            assert_eq!(ed.buffer().as_str(), "abcdef", "offset {}", offset);
            assert_eq!(ed.buffer().cursor(), cursor_before, "offset {}", offset);
        }
    }

    #[test]
    fn buffer_at_capacity_rejects_with_red_echo() {
        let mut ed = LineEditor::with_capacity(4);
        let mut h = HistoryStore::new();
        feed(&mut ed, &mut h, b"abcd");
        let echoed = feed_capture(&mut ed, &mut h, b"e");
        assert_eq!(ed.buffer().as_str(), "abcd");
        assert_eq!(ed.buffer().len(), 4);
        assert_eq!(echoed, "\x1b[31me\x1b[0m");
    }

    #[test]
    fn cursor_cannot_move_past_line_ends() {
        let mut ed = LineEditor::new();
        let mut h = HistoryStore::new();
        feed(&mut ed, &mut h, b"ab");
        // Three lefts against two characters, then three rights.
        feed(&mut ed, &mut h, b"\x1b[D\x1b[D\x1b[D");
        assert_eq!(ed.buffer().cursor(), 0);
        feed(&mut ed, &mut h, b"\x1b[C\x1b[C\x1b[C");
        assert_eq!(ed.buffer().cursor(), 2);
    }

    #[test]
    fn unknown_escape_tail_is_consumed_without_buffer_effect() {
        let mut ed = LineEditor::new();
        let mut h = HistoryStore::new();
        // ESC O P (a non-CSI sequence): both trailing bytes swallowed.
        feed(&mut ed, &mut h, b"a\x1bOPb");
        assert_eq!(ed.buffer().as_str(), "ab");
    }

    #[test]
    fn unknown_csi_final_byte_is_discarded() {
        let mut ed = LineEditor::new();
        let mut h = HistoryStore::new();
        feed(&mut ed, &mut h, b"a\x1b[Zb");
        assert_eq!(ed.buffer().as_str(), "ab");
    }

    #[test]
    fn tab_emits_placeholder_without_touching_buffer() {
        let mut ed = LineEditor::new();
        let mut h = HistoryStore::new();
        let echoed = feed_capture(&mut ed, &mut h, b"\t");
        assert_eq!(echoed, "[TAB]");
        assert!(ed.buffer().is_empty());
    }

    #[test]
    fn nul_byte_is_ignored() {
        let mut ed = LineEditor::new();
        let mut h = HistoryStore::new();
        feed(&mut ed, &mut h, b"a\x00b");
        assert_eq!(ed.buffer().as_str(), "ab");
    }

    #[test]
    fn ctrl_d_on_empty_buffer_ends_input() {
        let mut ed = LineEditor::new();
        let mut h = HistoryStore::new();
        let outcomes = feed(&mut ed, &mut h, b"\x04");
        assert_eq!(outcomes, vec![EditOutcome::EndOfInput]);
    }

    #[test]
    fn ctrl_d_on_nonempty_buffer_is_ignored() {
        let mut ed = LineEditor::new();
        let mut h = HistoryStore::new();
        let outcomes = feed(&mut ed, &mut h, b"ls\x04");
        assert_eq!(outcomes.last(), Some(&EditOutcome::Pending));
        assert_eq!(ed.buffer().as_str(), "ls");
    }

    #[test]
    fn arrow_up_loads_previous_commands() {
        let mut ed = LineEditor::new();
        let mut h = HistoryStore::new();
        feed(&mut ed, &mut h, b"one\ntwo\n");
        feed(&mut ed, &mut h, b"\x1b[A");
        assert_eq!(ed.buffer().as_str(), "two");
        feed(&mut ed, &mut h, b"\x1b[A");
        assert_eq!(ed.buffer().as_str(), "one");
        // Clamped at the oldest entry.
        feed(&mut ed, &mut h, b"\x1b[A");
        assert_eq!(ed.buffer().as_str(), "one");
    }

    #[test]
    fn arrow_down_returns_to_the_displaced_draft() {
        let mut ed = LineEditor::new();
        let mut h = HistoryStore::new();
        feed(&mut ed, &mut h, b"old\n");
        feed(&mut ed, &mut h, b"dra");
        feed(&mut ed, &mut h, b"\x1b[A");
        assert_eq!(ed.buffer().as_str(), "old");
        feed(&mut ed, &mut h, b"\x1b[B");
        assert_eq!(ed.buffer().as_str(), "dra");
        assert!(!h.browsing());
    }

    #[test]
    fn typing_cancels_history_browsing() {
        let mut ed = LineEditor::new();
        let mut h = HistoryStore::new();
        feed(&mut ed, &mut h, b"old\n");
        feed(&mut ed, &mut h, b"\x1b[A");
        assert!(h.browsing());
        feed(&mut ed, &mut h, b"x");
        assert!(!h.browsing());
        // The displayed entry stays editable.
        assert_eq!(ed.buffer().as_str(), "oldx");
    }

    #[test]
    fn submitting_a_browsed_entry_resets_navigation() {
        let mut ed = LineEditor::new();
        let mut h = HistoryStore::new();
        feed(&mut ed, &mut h, b"first\nsecond\n");
        feed(&mut ed, &mut h, b"\x1b[A\x1b[A");
        assert_eq!(ed.buffer().as_str(), "first");
        let outcomes = feed(&mut ed, &mut h, b"\n");
        assert_eq!(
            outcomes.last(),
            Some(&EditOutcome::Submitted("first".to_string()))
        );
        assert!(!h.browsing());
    }

    #[test]
    fn non_ascii_history_lines_are_sanitized_before_editing() {
        let mut ed = LineEditor::new();
        let mut h = HistoryStore::new();
        h.add("héllo");
        feed(&mut ed, &mut h, b"\x1b[A");
        // The multi-byte character is dropped on load.
        assert_eq!(ed.buffer().as_str(), "hllo");
        // Walking across the whole line and editing at column zero must
        // not leave the cursor off a character boundary.
        feed(&mut ed, &mut h, b"\x1b[D\x1b[D\x1b[D\x1b[D");
        feed(&mut ed, &mut h, b"x");
        assert_eq!(ed.buffer().as_str(), "xhllo");
        assert_eq!(ed.buffer().cursor(), 1);
    }

    #[test]
    fn abandon_line_clears_buffer_and_navigation() {
        let mut ed = LineEditor::new();
        let mut h = HistoryStore::new();
        feed(&mut ed, &mut h, b"half a comm");
        feed(&mut ed, &mut h, b"\x1b[A");
        ed.abandon_line(&mut h);
        assert!(ed.buffer().is_empty());
        assert!(!h.browsing());
    }
}
