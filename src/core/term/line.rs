//! Editable input line
//!
//! Holds the command being typed and its edit cursor. Every edit writes the
//! minimal redraw sequence that brings the remote display back in sync with
//! the buffer; the caller decides whether those bytes are actually sent.

/// Cursor one column left
pub const MOVE_LEFT: &[u8] = b"\x1b[D";
/// Cursor one column right
pub const MOVE_RIGHT: &[u8] = b"\x1b[C";
/// Backspace (moves the cursor left without erasing)
pub const BACKSPACE: u8 = 0x08;

/// Line buffer with edit cursor.
///
/// Text is restricted to printable ASCII, so byte offsets and columns coincide.
#[derive(Debug, Clone, Default)]
pub struct LineBuffer {
    text: String,
    cursor: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Text after the cursor
    fn suffix(&self) -> &str {
        &self.text[self.cursor..]
    }

    /// Insert `ch` at the cursor and redraw the shifted tail
    pub fn insert_char(&mut self, ch: char, out: &mut Vec<u8>) {
        debug_assert!(ch.is_ascii() && !ch.is_ascii_control());
        if self.cursor == self.text.len() {
            self.text.push(ch);
        } else {
            self.text.insert(self.cursor, ch);
        }
        self.cursor += 1;

        out.push(ch as u8);
        let tail = self.suffix().len();
        out.extend_from_slice(self.suffix().as_bytes());
        push_backspaces(out, tail);
    }

    /// Remove the character left of the cursor
    pub fn delete_backward(&mut self, out: &mut Vec<u8>) {
        if self.cursor == 0 {
            return;
        }
        self.text.remove(self.cursor - 1);
        self.cursor -= 1;

        out.push(BACKSPACE);
        self.erase_tail(out);
    }

    /// Remove the character under the cursor
    pub fn delete_forward(&mut self, out: &mut Vec<u8>) {
        if self.cursor >= self.text.len() {
            return;
        }
        self.text.remove(self.cursor);
        self.erase_tail(out);
    }

    /// Redraw the suffix, blank the stale last column and come back
    fn erase_tail(&self, out: &mut Vec<u8>) {
        let tail = self.suffix().len();
        out.extend_from_slice(self.suffix().as_bytes());
        out.push(b' ');
        push_backspaces(out, tail + 1);
    }

    pub fn move_left(&mut self, out: &mut Vec<u8>) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        out.extend_from_slice(MOVE_LEFT);
    }

    pub fn move_right(&mut self, out: &mut Vec<u8>) {
        if self.cursor >= self.text.len() {
            return;
        }
        self.cursor += 1;
        out.extend_from_slice(MOVE_RIGHT);
    }

    /// Jump to column 0, one step at a time
    pub fn move_home(&mut self, out: &mut Vec<u8>) {
        while self.cursor > 0 {
            self.move_left(out);
        }
    }

    /// Jump past the last character, one step at a time
    pub fn move_end(&mut self, out: &mut Vec<u8>) {
        while self.cursor < self.text.len() {
            self.move_right(out);
        }
    }

    /// Erase the displayed line in place and show `new_text` instead
    pub fn replace_all(&mut self, new_text: &str, out: &mut Vec<u8>) {
        self.move_end(out);
        for _ in 0..self.text.len() {
            out.extend_from_slice(b"\x08 \x08");
        }

        self.text.clear();
        self.text.extend(new_text.chars().filter(|c| c.is_ascii() && !c.is_ascii_control()));
        self.cursor = self.text.len();
        out.extend_from_slice(self.text.as_bytes());
    }

    /// Write the whole line and put the cursor back where it belongs.
    ///
    /// Assumes the terminal cursor sits at the start of the input area.
    pub fn redraw(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.text.as_bytes());
        for _ in self.cursor..self.text.len() {
            out.extend_from_slice(MOVE_LEFT);
        }
    }

    /// Forget the line without touching the display
    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }
}

fn push_backspaces(out: &mut Vec<u8>, count: usize) {
    out.extend(std::iter::repeat(BACKSPACE).take(count));
}
