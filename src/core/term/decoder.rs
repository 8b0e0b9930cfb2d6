//! Input key decoder
//!
//! Turns the raw byte stream of a session into discrete key events,
//! absorbing ANSI escape sequences along the way.

/// Longest escape sequence we are willing to buffer (ESC included)
pub const MAX_SEQUENCE_LEN: usize = 8;

/// A decoded key event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Printable ASCII character
    Char(char),
    Backspace,
    Tab,
    Enter,
    MoveLeft,
    MoveRight,
    /// History: older entry
    MoveUp,
    /// History: newer entry
    MoveDown,
    Home,
    End,
    /// Delete the character under the cursor
    DeleteForward,
}

/// Decoder state machine
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DecoderState {
    #[default]
    Idle,
    /// ESC received
    Escape,
    /// ESC [ received, collecting digits
    Csi,
    /// ESC O received
    Ss3,
}

/// Byte-at-a-time key decoder
#[derive(Debug, Default)]
pub struct KeyDecoder {
    state: DecoderState,
    pending: [u8; MAX_SEQUENCE_LEN],
    pending_len: usize,
    /// Last byte was CR; swallow a following LF or NUL
    after_cr: bool,
}

impl KeyDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state (Idle between sequences)
    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Decode a whole chunk of input
    pub fn decode(&mut self, bytes: &[u8]) -> Vec<Key> {
        bytes.iter().filter_map(|&b| self.feed(b)).collect()
    }

    /// Feed a single byte, returning a key once one is complete
    pub fn feed(&mut self, byte: u8) -> Option<Key> {
        let after_cr = std::mem::take(&mut self.after_cr);

        // ESC always starts over, whatever was pending
        if byte == 0x1B {
            if self.state != DecoderState::Idle {
                self.discard();
            }
            self.state = DecoderState::Escape;
            self.push(byte);
            return None;
        }

        match self.state {
            DecoderState::Idle => self.idle(byte, after_cr),
            DecoderState::Escape => self.escape(byte),
            DecoderState::Csi => self.csi(byte),
            DecoderState::Ss3 => self.ss3(byte),
        }
    }

    fn idle(&mut self, byte: u8, after_cr: bool) -> Option<Key> {
        match byte {
            0x0D => {
                self.after_cr = true;
                Some(Key::Enter)
            }
            0x0A | 0x00 if after_cr => None,
            0x0A => Some(Key::Enter),
            0x08 | 0x7F => Some(Key::Backspace),
            0x09 => Some(Key::Tab),
            // Emacs-style control aliases
            0x01 => Some(Key::Home),
            0x05 => Some(Key::End),
            0x02 => Some(Key::MoveLeft),
            0x06 => Some(Key::MoveRight),
            0x10 => Some(Key::MoveUp),
            0x0E => Some(Key::MoveDown),
            0x04 => Some(Key::DeleteForward),
            0x20..=0x7E => Some(Key::Char(byte as char)),
            _ => None,
        }
    }

    fn escape(&mut self, byte: u8) -> Option<Key> {
        match byte {
            b'[' => {
                self.push(byte);
                self.state = DecoderState::Csi;
            }
            b'O' => {
                self.push(byte);
                self.state = DecoderState::Ss3;
            }
            _ => self.reject(byte),
        }
        None
    }

    fn csi(&mut self, byte: u8) -> Option<Key> {
        match byte {
            b'0'..=b'9' => {
                if self.pending_len >= MAX_SEQUENCE_LEN - 1 {
                    // No room left for the terminator
                    self.reject(byte);
                } else {
                    self.push(byte);
                }
                None
            }
            b'~' => {
                let key = match self.params() {
                    b"1" | b"7" => Some(Key::Home),
                    b"4" | b"8" => Some(Key::End),
                    b"3" => Some(Key::DeleteForward),
                    b"" => None,
                    other => {
                        tracing::debug!("Ignoring tilde key {:?}", String::from_utf8_lossy(other));
                        None
                    }
                };
                self.reset();
                key
            }
            _ if self.params().is_empty() => match Self::cursor_key(byte) {
                Some(key) => {
                    self.reset();
                    Some(key)
                }
                None => {
                    self.reject(byte);
                    None
                }
            },
            _ => {
                self.reject(byte);
                None
            }
        }
    }

    fn ss3(&mut self, byte: u8) -> Option<Key> {
        let key = Self::cursor_key(byte);
        if key.is_some() {
            self.reset();
        } else {
            self.reject(byte);
        }
        key
    }

    fn cursor_key(byte: u8) -> Option<Key> {
        match byte {
            b'A' => Some(Key::MoveUp),
            b'B' => Some(Key::MoveDown),
            b'C' => Some(Key::MoveRight),
            b'D' => Some(Key::MoveLeft),
            b'H' => Some(Key::Home),
            b'F' => Some(Key::End),
            _ => None,
        }
    }

    /// Digits collected after `ESC [`
    fn params(&self) -> &[u8] {
        self.pending.get(2..self.pending_len).unwrap_or(&[])
    }

    fn push(&mut self, byte: u8) {
        if self.pending_len < MAX_SEQUENCE_LEN {
            self.pending[self.pending_len] = byte;
            self.pending_len += 1;
        }
    }

    fn reject(&mut self, byte: u8) {
        tracing::debug!(
            "Discarding escape sequence {:?} + {:#04x}",
            &self.pending[..self.pending_len],
            byte
        );
        self.reset();
    }

    fn discard(&mut self) {
        tracing::debug!("Discarding unterminated sequence {:?}", &self.pending[..self.pending_len]);
        self.reset();
    }

    fn reset(&mut self) {
        self.state = DecoderState::Idle;
        self.pending_len = 0;
    }
}
