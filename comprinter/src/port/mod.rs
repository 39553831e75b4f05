//! Port abstraction for serial communication.
//!
//! The Monitor only ever pulls one byte at a time, so the abstraction is
//! deliberately narrow:
//!
//! - [`ByteSource`]: `read_one_byte() -> byte | none | error`, implemented by
//!   real ports and by in-memory test doubles.
//! - [`Port`]: a [`ByteSource`] that can be configured and closed.
//! - [`PortOpener`]: turns a numeric device index into an open [`Port`].
//!
//! ```text
//! +------------------+
//! |  Stream Monitor  |  read_one_byte()
//! +--------+---------+
//!          |
//!          v
//! +--------+---------+     +------------------+
//! |   PortGuard<P>   |<----|   Port Locator   |  PortOpener::open(index)
//! +--------+---------+     +------------------+
//!          |
//!          v
//! +--------+---------+
//! | Native SerialPort|
//! |   (serialport)   |
//! +------------------+
//! ```
//!
//! ## Example
//!
//! ```rust
//! use comprinter::port::ByteSource;
//!
//! fn drain<S: ByteSource>(source: &mut S) -> Vec<u8> {
//!     let mut out = Vec::new();
//!     while let Ok(Some(byte)) = source.read_one_byte() {
//!         out.push(byte);
//!     }
//!     out
//! }
//! ```

pub mod guard;
#[cfg(feature = "native")]
pub mod native;

use std::io;
use std::time::Duration;

use crate::error::Result;

pub use guard::PortGuard;
#[cfg(feature = "native")]
pub use native::{NativeOpener, NativePort};

/// Default baud rate when none is given.
pub const DEFAULT_BAUD_RATE: u32 = 2400;

/// Serial line configuration.
///
/// Only the device index and baud rate vary between runs; the framing is
/// always 8-N-1 without flow control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortConfig {
    /// Device index to open (e.g. `3` for `COM3`). `None` scans the range.
    pub device_index: Option<u32>,
    /// Baud rate.
    pub baud_rate: u32,
    /// Per-call read timeouts.
    pub timeouts: TimeoutPolicy,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            device_index: None,
            baud_rate: DEFAULT_BAUD_RATE,
            timeouts: TimeoutPolicy::default(),
        }
    }
}

impl PortConfig {
    /// Create a configuration with the given baud rate and 8-N-1 framing.
    pub fn new(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            ..Default::default()
        }
    }

    /// Restrict the locator to a single device index.
    #[must_use]
    pub fn with_device_index(mut self, index: u32) -> Self {
        self.device_index = Some(index);
        self
    }
}

/// Read timeout settings applied to an opened handle.
///
/// Modeled on the classic COM timeout triple: an inter-byte interval plus a
/// total budget of `constant + multiplier * bytes` per read call. Native
/// backends only expose one timeout, so [`TimeoutPolicy::per_call`] folds the
/// three into a single duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    /// Maximum gap between two bytes of one read call.
    pub read_interval: Duration,
    /// Fixed part of the per-call budget.
    pub read_total_constant: Duration,
    /// Per-byte part of the per-call budget.
    pub read_total_multiplier: Duration,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            read_interval: Duration::from_millis(50),
            read_total_constant: Duration::from_millis(50),
            read_total_multiplier: Duration::from_millis(10),
        }
    }
}

impl TimeoutPolicy {
    /// Total budget for a read call requesting `bytes` bytes.
    pub fn read_call_timeout(&self, bytes: u32) -> Duration {
        self.read_total_constant + self.read_total_multiplier * bytes
    }

    /// Timeout for a single-byte read, which is also the monitor's polling
    /// interval.
    pub fn per_call(&self) -> Duration {
        self.read_interval.max(self.read_call_timeout(1))
    }
}

/// Synchronous single-byte pull interface.
pub trait ByteSource {
    /// Read at most one byte, blocking for no longer than the per-call
    /// timeout.
    ///
    /// Returns `Ok(None)` when the call timed out without data.
    fn read_one_byte(&mut self) -> io::Result<Option<u8>>;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_one_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).read_one_byte()
    }
}

/// An open serial device.
pub trait Port: ByteSource + Send {
    /// Get the port name/path.
    fn name(&self) -> &str;

    /// Apply line parameters and timeouts.
    fn configure(&mut self, config: &PortConfig) -> Result<()>;

    /// Close the port and release the OS handle.
    ///
    /// After calling this method, the port cannot be used for further I/O.
    fn close(&mut self) -> Result<()>;
}

/// Opens devices by numeric index.
pub trait PortOpener {
    /// Port type produced by this opener.
    type Port: Port;

    /// OS device name for an index, used in messages.
    fn device_name(&self, index: u32) -> String;

    /// Open the device with the given index, without configuring it.
    fn open(&self, index: u32) -> Result<Self::Port>;
}

/// Map a `Read::read` outcome for a one-byte buffer to the pull interface.
///
/// Timeouts and zero-length reads become `Ok(None)`.
pub(crate) fn single_byte_result(result: io::Result<usize>, buf: [u8; 1]) -> io::Result<Option<u8>> {
    match result {
        Ok(0) => Ok(None),
        Ok(_) => Ok(Some(buf[0])),
        Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => Ok(None),
        Err(e) => Err(e),
    }
}
