//! Configuration file support for comprinter.
//!
//! Configuration is loaded from multiple sources with the following priority (highest first):
//! 1. Command-line arguments
//! 2. Environment variables (COMPRINTER_*)
//! 3. Local config file (./comprinter.toml)
//! 4. Global config file (~/.config/comprinter/config.toml)
//!
//! `--config PATH` replaces both files.

use comprinter::ScanRange;
use directories::ProjectDirs;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Local configuration file name.
const LOCAL_CONFIG: &str = "comprinter.toml";

/// Port discovery and line settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortSection {
    /// Default baud rate.
    pub baud: Option<u32>,
    /// Device name template, `{n}` is replaced by the device number.
    pub name_template: Option<String>,
    /// Highest device number to scan.
    pub scan_max: Option<u32>,
    /// Lowest device number to scan.
    pub scan_min: Option<u32>,
}

/// Monitor settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorSection {
    /// Replay received characters as keystrokes by default.
    #[serde(default)]
    pub keystrokes: bool,
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Port configuration.
    #[serde(default)]
    pub port: PortSection,
    /// Monitor configuration.
    #[serde(default)]
    pub monitor: MonitorSection,
}

impl Config {
    /// Load configuration from all available sources.
    pub fn load() -> Self {
        let mut config = Self::default();

        // Load global config
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global_config) = Self::load_from_file(&global_path) {
                debug!("Loaded global config from {}", global_path.display());
                config.merge(global_config);
            }
        }

        // Load local config (overrides global)
        if let Some(local_config) = Self::load_from_file(Path::new(LOCAL_CONFIG)) {
            debug!("Loaded local config from {LOCAL_CONFIG}");
            config.merge(local_config);
        }

        config
    }

    /// Load configuration from a specific file path (--config flag).
    pub fn load_from_path(path: &Path) -> Self {
        if let Some(config) = Self::load_from_file(path) {
            debug!("Loaded config from {}", path.display());
            config
        } else {
            warn!(
                "Could not load config from {}, using defaults",
                path.display()
            );
            Self::default()
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => Some(config),
                Err(e) => {
                    warn!("Failed to parse config file {}: {}", path.display(), e);
                    None
                },
            },
            Err(e) => {
                warn!("Failed to read config file {}: {}", path.display(), e);
                None
            },
        }
    }

    /// Get the global configuration directory.
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "comprinter").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the global configuration file path.
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Merge another config into this one.
    fn merge(&mut self, other: Self) {
        if other.port.baud.is_some() {
            self.port.baud = other.port.baud;
        }
        if other.port.name_template.is_some() {
            self.port.name_template = other.port.name_template;
        }
        if other.port.scan_max.is_some() {
            self.port.scan_max = other.port.scan_max;
        }
        if other.port.scan_min.is_some() {
            self.port.scan_min = other.port.scan_min;
        }
        if other.monitor.keystrokes {
            self.monitor.keystrokes = true;
        }
    }

    /// Scan range with configured bounds over the defaults.
    pub fn scan_range(&self) -> ScanRange {
        let default = ScanRange::default();
        ScanRange::new(
            self.port.scan_max.unwrap_or(default.max),
            self.port.scan_min.unwrap_or(default.min),
        )
    }

    /// Device name template, if one is configured.
    pub fn name_template(&self) -> Option<&str> {
        self.port.name_template.as_deref()
    }
}
