//! Native serial port implementation using the `serialport` crate.
//!
//! This module provides the serial port implementation for native platforms
//! (Linux, macOS, Windows, FreeBSD, etc.).

use {
    crate::{
        error::{Error, Result},
        port::{
            ByteSource, Port, PortConfig, PortOpener, single_byte_result,
        },
    },
    log::trace,
    std::io::{self, Read},
};

/// Default device name template for this platform. `{n}` is replaced by the
/// device index.
#[cfg(windows)]
pub const DEFAULT_NAME_TEMPLATE: &str = "COM{n}";

/// Default device name template for this platform. `{n}` is replaced by the
/// device index.
#[cfg(not(windows))]
pub const DEFAULT_NAME_TEMPLATE: &str = "/dev/ttyS{n}";

// Framing is fixed at 8-N-1 without flow control
const DATA_BITS: serialport::DataBits = serialport::DataBits::Eight;
const PARITY: serialport::Parity = serialport::Parity::None;
const STOP_BITS: serialport::StopBits = serialport::StopBits::One;
const FLOW_CONTROL: serialport::FlowControl = serialport::FlowControl::None;

/// Native serial port implementation.
pub struct NativePort {
    port: Option<Box<dyn serialport::SerialPort>>,
    name: String,
}

impl NativePort {
    /// Open a serial port by name without applying any configuration beyond
    /// the initial baud rate.
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(port_name, baud_rate).open()?;

        Ok(Self {
            port: Some(port),
            name: port_name.to_string(),
        })
    }

    fn inner_mut(&mut self) -> io::Result<&mut Box<dyn serialport::SerialPort>> {
        self.port
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "port closed"))
    }
}

impl ByteSource for NativePort {
    fn read_one_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        let result = self.inner_mut()?.read(&mut buf);
        single_byte_result(result, buf)
    }
}

impl Port for NativePort {
    fn name(&self) -> &str {
        &self.name
    }

    fn configure(&mut self, config: &PortConfig) -> Result<()> {
        let name = self.name.clone();
        let failed = |what: &str, e: serialport::Error| Error::ConfigurationFailed {
            port: name.clone(),
            reason: format!("{what}: {e}"),
        };

        let port = self.inner_mut()?;
        port.set_baud_rate(config.baud_rate)
            .map_err(|e| failed("baud rate", e))?;
        port.set_data_bits(DATA_BITS)
            .map_err(|e| failed("data bits", e))?;
        port.set_parity(PARITY)
            .map_err(|e| failed("parity", e))?;
        port.set_stop_bits(STOP_BITS)
            .map_err(|e| failed("stop bits", e))?;
        port.set_flow_control(FLOW_CONTROL)
            .map_err(|e| failed("flow control", e))?;

        let per_call = config.timeouts.per_call();
        trace!("Setting {} read timeout to {per_call:?}", self.name);
        self.inner_mut()?
            .set_timeout(per_call)
            .map_err(|e| failed("timeouts", e))?;

        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        // Dropping the boxed port closes the OS handle
        match self.port.take() {
            Some(port) => {
                drop(port);
                Ok(())
            },
            None => Err(Error::Io(io::Error::new(
                io::ErrorKind::NotConnected,
                "port already closed",
            ))),
        }
    }
}

/// Opens native devices by index through a name template.
#[derive(Debug, Clone)]
pub struct NativeOpener {
    name_template: String,
    baud_rate: u32,
}

impl NativeOpener {
    /// Create an opener for the platform's default device names.
    pub fn new(baud_rate: u32) -> Self {
        Self::with_template(DEFAULT_NAME_TEMPLATE, baud_rate)
    }

    /// Create an opener with a custom template such as `/dev/ttyUSB{n}`.
    ///
    /// A template without `{n}` gets the index appended.
    pub fn with_template(template: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            name_template: template.into(),
            baud_rate,
        }
    }
}

impl PortOpener for NativeOpener {
    type Port = NativePort;

    fn device_name(&self, index: u32) -> String {
        expand_template(&self.name_template, index)
    }

    fn open(&self, index: u32) -> Result<NativePort> {
        NativePort::open(&self.device_name(index), self.baud_rate)
    }
}

fn expand_template(template: &str, index: u32) -> String {
    if template.contains("{n}") {
        template.replace("{n}", &index.to_string())
    } else {
        format!("{template}{index}")
    }
}
