//! Key mapping for console sessions
//!
//! Converts crossterm key events into the bytes a vty client would send,
//! so a local console session goes through the same decoder as a remote one.

use bitflags::bitflags;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

bitflags! {
    /// Modifier keys that change what a character key sends
    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    pub struct Modifiers: u8 {
        const CTRL = 0b01;
        const ALT  = 0b10;
    }
}

impl From<KeyModifiers> for Modifiers {
    fn from(mods: KeyModifiers) -> Self {
        let mut result = Modifiers::empty();
        if mods.contains(KeyModifiers::CONTROL) {
            result |= Modifiers::CTRL;
        }
        if mods.contains(KeyModifiers::ALT) {
            result |= Modifiers::ALT;
        }
        result
    }
}

/// What the console loop should do with a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    /// Forward these bytes to the session
    Bytes(Vec<u8>),
    /// Ctrl+C / Ctrl+\: leave the console
    Interrupt,
    /// Nothing to send
    Ignore,
}

/// Key mapper for converting key events to bytes
pub struct KeyMapper;

impl KeyMapper {
    pub fn map(event: &KeyEvent) -> ConsoleInput {
        if event.kind == KeyEventKind::Release {
            return ConsoleInput::Ignore;
        }
        let mods = Modifiers::from(event.modifiers);

        let bytes: &[u8] = match event.code {
            KeyCode::Char(ch) => return Self::map_char(ch, mods),
            KeyCode::Enter => b"\r",
            KeyCode::Backspace => b"\x7f",
            KeyCode::Tab => b"\t",
            KeyCode::Up => b"\x1b[A",
            KeyCode::Down => b"\x1b[B",
            KeyCode::Right => b"\x1b[C",
            KeyCode::Left => b"\x1b[D",
            KeyCode::Home => b"\x1b[H",
            KeyCode::End => b"\x1b[F",
            KeyCode::Delete => b"\x1b[3~",
            _ => return ConsoleInput::Ignore,
        };
        ConsoleInput::Bytes(bytes.to_vec())
    }

    fn map_char(ch: char, mods: Modifiers) -> ConsoleInput {
        if mods.contains(Modifiers::CTRL) {
            return match ch.to_ascii_lowercase() {
                'c' | '\\' => ConsoleInput::Interrupt,
                // Ctrl + letter = control character
                letter @ 'a'..='z' => ConsoleInput::Bytes(vec![letter as u8 - b'a' + 1]),
                _ => ConsoleInput::Ignore,
            };
        }
        if mods.contains(Modifiers::ALT) || !ch.is_ascii() {
            return ConsoleInput::Ignore;
        }
        ConsoleInput::Bytes(vec![ch as u8])
    }
}
