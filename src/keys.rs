// src/keys.rs

//! Key vocabulary shared by the display drivers and the loops.
//!
//! Drivers translate raw input into a `KeyInput`; the loops only ever see the
//! `ControlSignal` it maps to.

use bitflags::bitflags;

const ESC: u8 = 0x1b;

bitflags! {
    /// Represents a keyboard modifier.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const CONTROL = 1 << 0;
        const ALT = 1 << 1;
    }
}

/// Represents a key symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeySymbol {
    Char(char),
    Escape,
    /// Anything without a meaning here: arrows, function keys, stray bytes.
    #[default]
    Unknown,
}

/// One key press as reported by a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeyInput {
    pub symbol: KeySymbol,
    pub modifiers: Modifiers,
}

impl KeyInput {
    pub fn new(symbol: KeySymbol, modifiers: Modifiers) -> Self {
        KeyInput { symbol, modifiers }
    }

    pub fn char(ch: char) -> Self {
        KeyInput::new(KeySymbol::Char(ch), Modifiers::empty())
    }

    pub fn escape() -> Self {
        KeyInput::new(KeySymbol::Escape, Modifiers::empty())
    }

    pub fn ctrl(ch: char) -> Self {
        KeyInput::new(KeySymbol::Char(ch), Modifiers::CONTROL)
    }

    /// Decodes one byte read from a raw-mode terminal.
    ///
    /// Control bytes 0x01..=0x1a come back as Ctrl plus the matching
    /// lowercase letter, so Ctrl-C is `ctrl('c')`.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            ESC => KeyInput::escape(),
            0x20..=0x7e => KeyInput::char(byte as char),
            0x01..=0x1a => KeyInput::ctrl((b'a' + byte - 1) as char),
            _ => KeyInput::default(),
        }
    }

    /// Decodes everything one terminal read returned.
    ///
    /// `ESC [` and `ESC O` start CSI and SS3 sequences (arrows, function
    /// keys, Home/End); each whole sequence becomes one `Unknown` key. ESC
    /// before any other byte is an Alt chord. Only a lone ESC is `Escape`.
    pub fn decode(bytes: &[u8]) -> Vec<KeyInput> {
        let mut keys = Vec::with_capacity(bytes.len());
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] != ESC {
                keys.push(KeyInput::from_byte(bytes[i]));
                i += 1;
                continue;
            }
            i += match bytes.get(i + 1) {
                None | Some(&ESC) => {
                    keys.push(KeyInput::escape());
                    1
                }
                Some(&b'[') => {
                    keys.push(KeyInput::default());
                    // Parameter and intermediate bytes, then one final byte.
                    bytes[i + 2..]
                        .iter()
                        .position(|b| (0x40..=0x7e).contains(b))
                        .map_or(bytes.len() - i, |end| end + 3)
                }
                Some(&b'O') => {
                    keys.push(KeyInput::default());
                    (bytes.len() - i).min(3)
                }
                Some(&byte) => {
                    let mut key = KeyInput::from_byte(byte);
                    key.modifiers |= Modifiers::ALT;
                    keys.push(key);
                    2
                }
            };
        }
        keys
    }
}

/// What a key press asks the display loop to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ControlSignal {
    #[default]
    None,
    Quit,
    Pause,
    Save,
    ToggleMode,
}

impl From<KeyInput> for ControlSignal {
    fn from(key: KeyInput) -> Self {
        let ctrl = key.modifiers.contains(Modifiers::CONTROL);
        if key.modifiers.contains(Modifiers::ALT) {
            return ControlSignal::None;
        }
        match key.symbol {
            KeySymbol::Escape => ControlSignal::Quit,
            KeySymbol::Char('c') if ctrl => ControlSignal::Quit,
            KeySymbol::Char(_) if ctrl => ControlSignal::None,
            KeySymbol::Char('q') | KeySymbol::Char('Q') => ControlSignal::Quit,
            KeySymbol::Char(' ') => ControlSignal::Pause,
            KeySymbol::Char('s') | KeySymbol::Char('S') => ControlSignal::Save,
            KeySymbol::Char('m') | KeySymbol::Char('M') => ControlSignal::ToggleMode,
            _ => ControlSignal::None,
        }
    }
}

impl From<Option<KeyInput>> for ControlSignal {
    fn from(key: Option<KeyInput>) -> Self {
        key.map_or(ControlSignal::None, ControlSignal::from)
    }
}
