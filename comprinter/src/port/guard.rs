//! Scoped ownership of an open port.

use std::io;
use std::ops::{Deref, DerefMut};

use log::{error, info};

use crate::error::Result;
use crate::port::{ByteSource, Port};

/// Owns an open [`Port`] and closes it exactly once.
///
/// The port is released by [`PortGuard::release`] or, failing that, when the
/// guard is dropped. Both paths report the outcome through the logger and
/// never panic.
pub struct PortGuard<P: Port> {
    port: P,
    released: bool,
}

impl<P: Port> PortGuard<P> {
    /// Take ownership of a freshly opened port.
    pub fn new(port: P) -> Self {
        Self {
            port,
            released: false,
        }
    }

    /// Whether the port has already been closed.
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Close the port now. Later calls (and the drop) are no-ops.
    pub fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        let result = self.port.close();
        match &result {
            Ok(()) => info!("Closing serial port {}... OK", self.port.name()),
            Err(e) => error!("Closing serial port {}... Error: {e}", self.port.name()),
        }
        result
    }
}

impl<P: Port> Deref for PortGuard<P> {
    type Target = P;

    fn deref(&self) -> &P {
        &self.port
    }
}

impl<P: Port> DerefMut for PortGuard<P> {
    fn deref_mut(&mut self) -> &mut P {
        &mut self.port
    }
}

impl<P: Port> ByteSource for PortGuard<P> {
    fn read_one_byte(&mut self) -> io::Result<Option<u8>> {
        if self.released {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "port released"));
        }
        self.port.read_one_byte()
    }
}

impl<P: Port> Drop for PortGuard<P> {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePort;

    #[test]
    fn test_drop_closes_once() {
        let port = FakePort::new("COM4", b"");
        let closes = port.close_counter();
        {
            let _guard = PortGuard::new(port);
        }
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn test_explicit_release_then_drop_closes_once() {
        let port = FakePort::new("COM4", b"");
        let closes = port.close_counter();
        let mut guard = PortGuard::new(port);

        guard.release().unwrap();
        assert!(guard.is_released());
        guard.release().unwrap();
        drop(guard);

        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn test_failed_close_is_reported_not_retried() {
        let port = FakePort::new("COM4", b"").failing_close();
        let closes = port.close_counter();
        let mut guard = PortGuard::new(port);

        assert!(guard.release().is_err());
        drop(guard);

        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn test_read_after_release_is_error() {
        let mut guard = PortGuard::new(FakePort::new("COM4", b"abc"));
        assert_eq!(guard.read_one_byte().unwrap(), Some(b'a'));

        guard.release().unwrap();
        assert!(guard.read_one_byte().is_err());
    }

    #[test]
    fn test_deref_exposes_port_name() {
        let guard = PortGuard::new(FakePort::new("COM9", b""));
        assert_eq!(guard.name(), "COM9");
    }
}
