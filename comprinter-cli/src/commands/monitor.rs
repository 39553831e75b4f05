//! Serial monitor command implementation.
//!
//! Locates the port, then forwards its bytes to stdout until the termination
//! policy, or Ctrl-C, stops the run.

use anyhow::Result;
use comprinter::{Locator, Monitor, NativeOpener, TerminationReason, port::native};
use log::{debug, info};
use std::io::{self, Write as _};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::Cli;
use crate::config::Config;
use crate::keystrokes;

/// Run the monitor and return why it stopped.
///
/// The port is released before returning on success; on error the guard
/// closes it on drop.
pub(crate) fn cmd_monitor(
    cli: &Cli,
    config: &Config,
    interrupted: Arc<AtomicBool>,
) -> Result<TerminationReason> {
    let port_config = cli.port_config(config);
    debug!(
        "Device number: {}",
        port_config
            .device_index
            .map_or_else(|| "auto".to_string(), |n| n.to_string())
    );
    debug!("Baud rate: {}", port_config.baud_rate);

    let template = config
        .name_template()
        .unwrap_or(native::DEFAULT_NAME_TEMPLATE);
    let opener = NativeOpener::with_template(template, port_config.baud_rate);
    let locator = Locator::new(opener).with_range(config.scan_range());
    let mut port = locator.locate(&port_config)?;

    let policy = cli.termination_policy();
    if policy.is_unbounded() {
        info!("No stop condition set. Press Ctrl-C to stop");
    }

    let mut emitter = if cli.keystrokes || config.monitor.keystrokes {
        keystrokes::emitter()
    } else {
        None
    };

    let mut monitor = Monitor::new(policy).with_interrupt(interrupted);
    if let Some(emitter) = emitter.as_deref_mut() {
        monitor = monitor.with_keystrokes(emitter);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let reason = monitor.run(&mut port, &mut out)?;
    out.flush()?;
    drop(out);

    info!("{reason} after {} bytes", monitor.state().bytes_read);

    // The close outcome is logged by the guard and never changes the exit code
    let _ = port.release();

    Ok(reason)
}
