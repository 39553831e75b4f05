//! comprinter CLI - print the byte stream of a serial port to the console.
//!
//! ## Features
//!
//! - Automatic port discovery (highest device index first)
//! - Stop on byte count, idle timeout or terminator byte
//! - Optional keystroke replay of received characters
//! - Classic slash-style flags (`/devnum 3`) alongside `--devnum 3`
//! - Configuration file and environment variable support

use anyhow::Result;
use clap::Parser;
use clap::error::ErrorKind;
use comprinter::{DEFAULT_BAUD_RATE, PortConfig, TerminationPolicy};
use console::style;
use env_logger::Env;
use log::{debug, info, warn};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

mod args;
mod commands;
mod config;
mod keystrokes;

use config::Config;

/// comprinter - print everything a serial port sends to the console.
///
/// Every flag may also be written in slash form (`/devnum 3`). Without a
/// stop condition the program runs until Ctrl-C.
///
/// Environment variables:
///   COMPRINTER_DEVNUM   - Default device number
///   COMPRINTER_BAUD     - Default baud rate (default: 2400)
#[derive(Parser, Debug)]
#[command(name = "comprinter")]
#[command(author, version, about, long_about = None)]
#[command(args_override_self = true)]
#[command(
    after_help = "Examples:\n  comprinter /devnum 22 /baudrate 38400\n  comprinter /charcount 5\n  comprinter /timeout 3000\n  comprinter /endhex 0A /keystrokes"
)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct Cli {
    /// Only try this device number (e.g. 3 for COM3).
    #[arg(long, value_name = "N", env = "COMPRINTER_DEVNUM")]
    pub(crate) devnum: Option<u32>,

    /// Baud rate [default: 2400].
    #[arg(long, value_name = "N", env = "COMPRINTER_BAUD")]
    pub(crate) baudrate: Option<u32>,

    /// Stop after this many bytes (0 or negative: no limit).
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub(crate) charcount: Option<i64>,

    /// Stop after this many milliseconds without data (0 or negative: never).
    #[arg(long, value_name = "MS", allow_negative_numbers = true)]
    pub(crate) timeout: Option<i64>,

    /// Stop when this character is received (first byte is used).
    #[arg(long, value_name = "C", value_parser = args::parse_end_char, overrides_with = "endhex")]
    pub(crate) endchar: Option<u8>,

    /// Stop when this byte, given in hex, is received.
    #[arg(long, value_name = "HH", value_parser = args::parse_hex_byte, overrides_with = "endchar")]
    pub(crate) endhex: Option<u8>,

    /// Replay received characters as keystrokes.
    #[arg(long)]
    pub(crate) keystrokes: bool,

    /// Verbose diagnostic output.
    #[arg(long, overrides_with = "quiet")]
    pub(crate) debug: bool,

    /// Suppress diagnostic output.
    #[arg(long, overrides_with = "debug")]
    pub(crate) quiet: bool,

    /// Path to a configuration file.
    #[arg(long = "config", value_name = "PATH")]
    pub(crate) config_path: Option<PathBuf>,
}

impl Cli {
    /// Terminator byte from `--endchar` or `--endhex`, whichever came last.
    pub(crate) fn terminator(&self) -> Option<u8> {
        self.endchar.or(self.endhex)
    }

    /// Build the termination policy. Non-positive counts and timeouts are unset.
    pub(crate) fn termination_policy(&self) -> TerminationPolicy {
        let mut policy = TerminationPolicy::new();
        if let Some(count) = self.charcount.and_then(|n| u64::try_from(n).ok()) {
            policy = policy.with_byte_limit(count);
        }
        if let Some(ms) = self.timeout.and_then(|ms| u64::try_from(ms).ok()) {
            policy = policy.with_idle_timeout(Duration::from_millis(ms));
        }
        if let Some(byte) = self.terminator() {
            policy = policy.with_terminator(byte);
        }
        policy
    }

    /// Line configuration: command line, then config file, then defaults.
    pub(crate) fn port_config(&self, config: &Config) -> PortConfig {
        let baud_rate = self
            .baudrate
            .or(config.port.baud)
            .unwrap_or(DEFAULT_BAUD_RATE);
        let mut port = PortConfig::new(baud_rate);
        port.device_index = self.devnum;
        port
    }
}

fn main() {
    // --- NO_COLOR and TTY detection ---
    let stderr_is_tty = console::Term::stderr().is_term();
    if env::var("NO_COLOR").is_ok() || !stderr_is_tty {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    if let Err(err) = run() {
        eprintln!("{} {err:#}", style("Error:").red().bold());
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let raw_args = env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned());
    let normalized = args::normalize(raw_args)?;

    let cli = match Cli::try_parse_from(
        std::iter::once("comprinter".to_string()).chain(normalized.args),
    ) {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => return Err(comprinter::Error::Argument(args::clap_message(&e)).into()),
    };

    // Setup logging based on verbosity
    let log_level = if cli.quiet {
        "error"
    } else if cli.debug {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_target(cli.debug)
        .format_timestamp(if cli.debug {
            Some(env_logger::TimestampPrecision::Millis)
        } else {
            None
        })
        .init();

    for token in &normalized.unrecognized {
        warn!("Unrecognised option: {token}");
    }

    info!("comprinter v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = if let Some(ref path) = cli.config_path {
        Config::load_from_path(path)
    } else {
        Config::load()
    };

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
        warn!("Could not install Ctrl-C handler: {e}");
    }

    let reason = commands::monitor::cmd_monitor(&cli, &config, interrupted)?;
    debug!("Exiting after {reason}");

    Ok(())
}
