//! Error types for comprinter.

use std::io;
use thiserror::Error;

/// Result type for comprinter operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for comprinter operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (console sink, serial read/write).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serial port error.
    #[cfg(feature = "native")]
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// The explicitly requested device could not be opened.
    #[error("could not open serial port {port}: {reason}")]
    PortUnavailable {
        /// Device name that was tried.
        port: String,
        /// Why the open failed.
        reason: String,
    },

    /// Every device in the scan range failed to open.
    #[error("could not open serial port (scanned device {max} down to {min})")]
    NoPortFound {
        /// First (highest) index tried.
        max: u32,
        /// Last (lowest) index tried.
        min: u32,
    },

    /// The OS rejected the line or timeout parameters.
    #[error("error setting device parameters on {port}: {reason}")]
    ConfigurationFailed {
        /// Device name being configured.
        port: String,
        /// Which parameter failed and why.
        reason: String,
    },

    /// Malformed or missing argument value.
    #[error("{0}")]
    Argument(String),
}
