//! # comprinter
//!
//! Read the byte stream of a serial port and forward it to a console.
//!
//! This crate provides the two pieces with real decision logic:
//!
//! - [`Locator`]: opens an explicitly numbered device, or scans a range of
//!   device indices from the highest down and keeps the first that opens.
//! - [`Monitor`]: pulls one byte at a time and stops on a byte limit, an idle
//!   timeout, a terminator byte or an interrupt flag.
//!
//! Ports are wrapped in a [`PortGuard`] that closes them exactly once, on
//! every exit path.
//!
//! ## Features
//!
//! - `native` (default): Native serial port support via the `serialport` crate
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use comprinter::{Locator, Monitor, PortConfig, TerminationPolicy};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     #[cfg(feature = "native")]
//!     {
//!         let config = PortConfig::new(38400);
//!         let locator = Locator::new(comprinter::NativeOpener::new(config.baud_rate));
//!         let mut port = locator.locate(&config)?;
//!
//!         let policy = TerminationPolicy::new()
//!             .with_idle_timeout(Duration::from_secs(3))
//!             .with_terminator(b'\n');
//!         let reason = Monitor::new(policy).run(&mut port, &mut std::io::stdout())?;
//!         println!("\nstopped: {reason}");
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod keystroke;
pub mod locator;
pub mod monitor;
pub mod port;

#[cfg(test)]
mod testing;

// Re-exports for convenience
#[cfg(feature = "native")]
pub use port::{NativeOpener, NativePort};
pub use {
    error::{Error, Result},
    keystroke::{KeyBackend, Keystroke, KeystrokeEmitter, MappedEmitter},
    locator::{Locator, ScanRange},
    monitor::{
        Clock, Monitor, MonitorState, MonotonicClock, TerminationPolicy, TerminationReason, run,
    },
    port::{
        ByteSource, DEFAULT_BAUD_RATE, Port, PortConfig, PortGuard, PortOpener, TimeoutPolicy,
    },
};
