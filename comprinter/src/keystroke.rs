//! Synthetic keystroke mapping.
//!
//! Only a small character subset can be replayed as key presses: letters
//! (case-folded to the key they sit on), digits, space, comma, period,
//! backspace, tab and newline. Everything else is dropped without error.

use std::fmt;

use log::debug;

/// A key the emitter knows how to press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keystroke {
    /// Letter key, always upper case (`'A'..='Z'`).
    Letter(char),
    /// Digit key (`'0'..='9'`).
    Digit(char),
    /// Space bar.
    Space,
    /// Comma key.
    Comma,
    /// Period key.
    Period,
    /// Backspace.
    Backspace,
    /// Tab.
    Tab,
    /// Enter/Return, produced by `\n`.
    Enter,
}

impl Keystroke {
    /// Map a received byte to a key, or `None` if it is outside the subset.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' => Some(Self::Letter(char::from(byte.to_ascii_uppercase()))),
            b'0'..=b'9' => Some(Self::Digit(char::from(byte))),
            b' ' => Some(Self::Space),
            b',' => Some(Self::Comma),
            b'.' => Some(Self::Period),
            0x08 => Some(Self::Backspace),
            b'\t' => Some(Self::Tab),
            b'\n' => Some(Self::Enter),
            _ => None,
        }
    }
}

/// Receives every forwarded byte when keystroke simulation is enabled.
///
/// Emission is best effort: implementations swallow their own failures.
pub trait KeystrokeEmitter {
    /// Replay one byte as a key press and release.
    fn emit(&mut self, byte: u8);
}

/// OS-level key injection backend.
pub trait KeyBackend {
    /// Backend failure type.
    type Error: fmt::Display;

    /// Press and release a key.
    fn click(&mut self, key: Keystroke) -> Result<(), Self::Error>;
}

/// [`KeystrokeEmitter`] that filters bytes through [`Keystroke::from_byte`]
/// and forwards the survivors to a [`KeyBackend`].
pub struct MappedEmitter<B: KeyBackend> {
    backend: B,
}

impl<B: KeyBackend> MappedEmitter<B> {
    /// Wrap a backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Get the wrapped backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: KeyBackend> KeystrokeEmitter for MappedEmitter<B> {
    fn emit(&mut self, byte: u8) {
        let Some(key) = Keystroke::from_byte(byte) else {
            return;
        };
        if let Err(e) = self.backend.click(key) {
            debug!("Keystroke {key:?} failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingBackend {
        keys: Vec<Keystroke>,
        fail: bool,
    }

    impl KeyBackend for RecordingBackend {
        type Error = String;

        fn click(&mut self, key: Keystroke) -> Result<(), String> {
            if self.fail {
                return Err("no display".to_string());
            }
            self.keys.push(key);
            Ok(())
        }
    }

    #[test]
    fn test_letters_fold_to_upper_case() {
        assert_eq!(Keystroke::from_byte(b'a'), Some(Keystroke::Letter('A')));
        assert_eq!(Keystroke::from_byte(b'Z'), Some(Keystroke::Letter('Z')));
    }

    #[test]
    fn test_digits_and_punctuation() {
        assert_eq!(Keystroke::from_byte(b'7'), Some(Keystroke::Digit('7')));
        assert_eq!(Keystroke::from_byte(b' '), Some(Keystroke::Space));
        assert_eq!(Keystroke::from_byte(b','), Some(Keystroke::Comma));
        assert_eq!(Keystroke::from_byte(b'.'), Some(Keystroke::Period));
        assert_eq!(Keystroke::from_byte(0x08), Some(Keystroke::Backspace));
        assert_eq!(Keystroke::from_byte(b'\t'), Some(Keystroke::Tab));
        assert_eq!(Keystroke::from_byte(b'\n'), Some(Keystroke::Enter));
    }

    #[test]
    fn test_unsupported_bytes_are_none() {
        for byte in [b'\r', b'!', b'-', 0x00, 0x7F, 0xFF] {
            assert_eq!(Keystroke::from_byte(byte), None, "byte {byte:#04x}");
        }
    }

    #[test]
    fn test_mapped_emitter_drops_unsupported() {
        let mut emitter = MappedEmitter::new(RecordingBackend::default());
        for &byte in b"Hi!\r\n" {
            emitter.emit(byte);
        }
        assert_eq!(
            emitter.backend().keys,
            vec![
                Keystroke::Letter('H'),
                Keystroke::Letter('I'),
                Keystroke::Enter
            ]
        );
    }

    #[test]
    fn test_mapped_emitter_swallows_backend_errors() {
        let mut emitter = MappedEmitter::new(RecordingBackend {
            fail: true,
            ..Default::default()
        });
        emitter.emit(b'x');
        assert!(emitter.backend().keys.is_empty());
    }
}
