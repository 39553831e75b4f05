//! Serial port discovery.
//!
//! With an explicit device index the locator opens exactly that device.
//! Without one it walks the scan range from the highest index down and keeps
//! the first device that opens: freshly attached and virtual adapters tend to
//! receive the highest numbers.

use log::{debug, info};

use crate::error::{Error, Result};
use crate::port::{Port, PortConfig, PortGuard, PortOpener};

/// Inclusive range of device indices to scan, walked from `max` down to `min`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanRange {
    /// First index tried.
    pub max: u32,
    /// Last index tried.
    pub min: u32,
}

impl Default for ScanRange {
    fn default() -> Self {
        Self { max: 30, min: 1 }
    }
}

impl ScanRange {
    /// Create a range. An inverted range (`min > max`) is empty.
    pub fn new(max: u32, min: u32) -> Self {
        Self { max, min }
    }

    /// Indices in scan order (descending).
    pub fn indices(&self) -> impl Iterator<Item = u32> {
        (self.min..=self.max).rev()
    }
}

/// Finds, opens and configures a serial port.
pub struct Locator<O: PortOpener> {
    opener: O,
    range: ScanRange,
}

impl<O: PortOpener> Locator<O> {
    /// Create a locator with the default scan range.
    pub fn new(opener: O) -> Self {
        Self {
            opener,
            range: ScanRange::default(),
        }
    }

    /// Override the scan range.
    #[must_use]
    pub fn with_range(mut self, range: ScanRange) -> Self {
        self.range = range;
        self
    }

    /// Scan range in use.
    pub fn range(&self) -> ScanRange {
        self.range
    }

    /// Open and configure a port according to `config`.
    ///
    /// The returned guard closes the port when dropped. If configuration
    /// fails, the just-opened port is closed before the error is returned.
    pub fn locate(&self, config: &PortConfig) -> Result<PortGuard<O::Port>> {
        let port = match config.device_index {
            Some(index) => self.open_exact(index)?,
            None => self.scan()?,
        };

        info!("Opening {} at {} baud", port.name(), config.baud_rate);

        let mut guard = PortGuard::new(port);
        if let Err(e) = guard.configure(config) {
            let port = guard.name().to_string();
            return Err(match e {
                Error::ConfigurationFailed { .. } => e,
                other => Error::ConfigurationFailed {
                    port,
                    reason: other.to_string(),
                },
            });
        }

        Ok(guard)
    }

    fn open_exact(&self, index: u32) -> Result<O::Port> {
        let name = self.opener.device_name(index);
        debug!("Trying {name}...");
        self.opener.open(index).map_err(|e| {
            debug!("Trying {name}... FAILED ({e})");
            Error::PortUnavailable {
                port: name.clone(),
                reason: e.to_string(),
            }
        })
    }

    fn scan(&self) -> Result<O::Port> {
        for index in self.range.indices() {
            let name = self.opener.device_name(index);
            match self.opener.open(index) {
                Ok(port) => {
                    debug!("Trying {name}... OK");
                    return Ok(port);
                },
                Err(e) => debug!("Trying {name}... FAILED ({e})"),
            }
        }

        Err(Error::NoPortFound {
            max: self.range.max,
            min: self.range.min,
        })
    }
}
