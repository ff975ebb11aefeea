//! Configuration and color palette management for rcon-console.
//!
//! This module provides:
//! - TOML configuration file loading from `~/.rcon-console/config.toml`
//! - Built-in palettes mapping `§` format markers to terminal colors
//! - Render mode selection
//!
//! # Configuration File
//!
//! ```toml
//! host = "mc.example.net"
//! port = 25575
//!
//! # Render mode: auto, plain, color
//! render_mode = "color"
//!
//! # Palette: ansi, truecolor
//! palette = "truecolor"
//!
//! # Connect and login timeout
//! timeout_secs = 10
//!
//! # Per-command timeout; unset or 0 waits for the server indefinitely
//! command_timeout_secs = 120
//!
//! [history]
//! enabled = true
//! limit = 1000
//! ```
//!
//! Every key is optional. Command-line flags override the file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use crossterm::style::Color;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::core::Timeouts;

/// Default RCON host
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default RCON port
pub const DEFAULT_PORT: u16 = 25575;

const CONFIG_DIR: &str = ".rcon-console";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// How server responses are turned into terminal output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Color when stdout is a terminal, plain otherwise
    #[default]
    Auto,
    /// Leave markers alone, split `help` listings one command per line
    Plain,
    /// Translate `§` markers into terminal colors
    Color,
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// RCON password; prompted for when absent
    pub password: Option<String>,
    pub render_mode: RenderMode,
    /// Palette name
    pub palette: String,
    /// Connect and login timeout
    pub timeout_secs: u64,
    /// Command round-trip timeout, none by default
    pub command_timeout_secs: Option<u64>,
    pub history: HistoryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            password: None,
            render_mode: RenderMode::Auto,
            palette: "ansi".to_string(),
            timeout_secs: 10,
            command_timeout_secs: None,
            history: HistoryConfig::default(),
        }
    }
}

/// Command history settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub enabled: bool,
    pub limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            limit: 1000,
        }
    }
}

impl Config {
    /// Load configuration
    ///
    /// An explicitly named file must exist and parse. The default file is
    /// optional, and a broken one only earns a warning.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path).or_else(|e| {
                warn!("Ignoring config file: {}", e);
                Ok(Self::default())
            }),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Get config file path
    pub fn default_path() -> Option<PathBuf> {
        home_dir().map(|home| home.join(CONFIG_DIR).join("config.toml"))
    }

    /// Directory for history and log files, created on demand
    pub fn data_dir() -> Option<PathBuf> {
        let dir = home_dir()?.join(CONFIG_DIR);
        if !dir.exists() {
            let _ = fs::create_dir_all(&dir);
        }
        Some(dir)
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            connect: Duration::from_secs(self.timeout_secs.max(1)),
            command: self
                .command_timeout_secs
                .filter(|&secs| secs > 0)
                .map(Duration::from_secs),
        }
    }

    /// Get the palette
    pub fn get_palette(&self) -> Palette {
        Palette::by_name(&self.palette)
    }
}

/// Terminal colors for the sixteen markers `§0`..`§9`, `§a`..`§f`, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub name: &'static str,
    pub colors: [Color; 16],
}

impl Default for Palette {
    fn default() -> Self {
        Self::ansi()
    }
}

impl Palette {
    /// The sixteen standard terminal colors
    pub const fn ansi() -> Self {
        Self {
            name: "ansi",
            colors: [
                Color::Black,       // §0 black
                Color::DarkBlue,    // §1 dark_blue
                Color::DarkGreen,   // §2 dark_green
                Color::DarkCyan,    // §3 dark_aqua
                Color::DarkRed,     // §4 dark_red
                Color::DarkMagenta, // §5 dark_purple
                Color::DarkYellow,  // §6 gold
                Color::Grey,        // §7 gray
                Color::DarkGrey,    // §8 dark_gray
                Color::Blue,        // §9 blue
                Color::Green,       // §a green
                Color::Cyan,        // §b aqua
                Color::Red,         // §c red
                Color::Magenta,     // §d light_purple
                Color::Yellow,      // §e yellow
                Color::White,       // §f white
            ],
        }
    }

    /// Exact 24-bit chat colors
    pub const fn truecolor() -> Self {
        Self {
            name: "truecolor",
            colors: [
                rgb(0x00, 0x00, 0x00),
                rgb(0x00, 0x00, 0xAA),
                rgb(0x00, 0xAA, 0x00),
                rgb(0x00, 0xAA, 0xAA),
                rgb(0xAA, 0x00, 0x00),
                rgb(0xAA, 0x00, 0xAA),
                rgb(0xFF, 0xAA, 0x00),
                rgb(0xAA, 0xAA, 0xAA),
                rgb(0x55, 0x55, 0x55),
                rgb(0x55, 0x55, 0xFF),
                rgb(0x55, 0xFF, 0x55),
                rgb(0x55, 0xFF, 0xFF),
                rgb(0xFF, 0x55, 0x55),
                rgb(0xFF, 0x55, 0xFF),
                rgb(0xFF, 0xFF, 0x55),
                rgb(0xFF, 0xFF, 0xFF),
            ],
        }
    }

    /// Get palette by name, falling back to `ansi`
    pub fn by_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "ansi" | "default" => Self::ansi(),
            "truecolor" | "true-color" | "rgb" => Self::truecolor(),
            other => {
                warn!(
                    "Unknown palette '{}', using ansi (available: {})",
                    other,
                    Self::list().join(", ")
                );
                Self::ansi()
            }
        }
    }

    /// List available palettes
    pub fn list() -> Vec<&'static str> {
        vec!["ansi", "truecolor"]
    }
}

const fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb { r, g, b }
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE")
        .or_else(|| std::env::var_os("HOME"))
        .map(PathBuf::from)
}
