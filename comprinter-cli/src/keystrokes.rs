//! OS keystroke backend for `--keystrokes`.
//!
//! Injection goes through `enigo` when the `keystrokes` feature is enabled.
//! Without it, or without a usable desktop session, the flag degrades to a
//! warning and the run continues with console output only.

use comprinter::KeystrokeEmitter;
use log::warn;

#[cfg(feature = "keystrokes")]
mod backend {
    use comprinter::{KeyBackend, Keystroke};
    use enigo::{Direction, Enigo, Key, Keyboard, Settings};

    /// Presses keys through the platform input API.
    pub(crate) struct EnigoBackend {
        enigo: Enigo,
    }

    impl EnigoBackend {
        pub(crate) fn new() -> Result<Self, enigo::NewConError> {
            Ok(Self {
                enigo: Enigo::new(&Settings::default())?,
            })
        }
    }

    pub(crate) fn key_for(key: Keystroke) -> Key {
        match key {
            // Letter keys type lower case unless shift is held
            Keystroke::Letter(c) => Key::Unicode(c.to_ascii_lowercase()),
            Keystroke::Digit(c) => Key::Unicode(c),
            Keystroke::Space => Key::Space,
            Keystroke::Comma => Key::Unicode(','),
            Keystroke::Period => Key::Unicode('.'),
            Keystroke::Backspace => Key::Backspace,
            Keystroke::Tab => Key::Tab,
            Keystroke::Enter => Key::Return,
        }
    }

    impl KeyBackend for EnigoBackend {
        type Error = enigo::InputError;

        fn click(&mut self, key: Keystroke) -> Result<(), Self::Error> {
            self.enigo.key(key_for(key), Direction::Click)
        }
    }
}

/// Create the keystroke emitter, or `None` if keystrokes cannot be sent.
pub(crate) fn emitter() -> Option<Box<dyn KeystrokeEmitter>> {
    #[cfg(feature = "keystrokes")]
    {
        match backend::EnigoBackend::new() {
            Ok(backend) => Some(Box::new(comprinter::MappedEmitter::new(backend))),
            Err(e) => {
                warn!("Keystroke simulation unavailable: {e}");
                None
            },
        }
    }

    #[cfg(not(feature = "keystrokes"))]
    {
        warn!("Keystroke simulation not compiled in (build with --features keystrokes)");
        None
    }
}

#[cfg(all(test, feature = "keystrokes"))]
mod tests {
    use super::backend::key_for;
    use comprinter::Keystroke;
    use enigo::Key;

    #[test]
    fn test_key_mapping() {
        assert_eq!(key_for(Keystroke::Letter('A')), Key::Unicode('a'));
        assert_eq!(key_for(Keystroke::Digit('4')), Key::Unicode('4'));
        assert_eq!(key_for(Keystroke::Comma), Key::Unicode(','));
        assert_eq!(key_for(Keystroke::Enter), Key::Return);
        assert_eq!(key_for(Keystroke::Backspace), Key::Backspace);
    }
}
