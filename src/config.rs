//! Configuration file support for rec-grid.
//!
//! This module provides functionality for loading and saving user preferences
//! from a TOML configuration file.

use crate::error::Result;
use crate::filter::FilterConfig;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;

/// User configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Access key sent with every feed request
    #[serde(default)]
    pub access_key: Option<String>,

    /// Issue the page requests of one batch concurrently instead of one
    /// after another. Faster, but the feed returns more duplicates.
    #[serde(default)]
    pub parallel_requests: bool,

    /// Width of a single card in terminal columns
    #[serde(default = "default_card_width")]
    pub card_width: u16,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub pagination: PaginationConfig,

    #[serde(default)]
    pub filter: FilterConfig,

    #[serde(default)]
    pub keybindings: Keybindings,
}

/// Retry behavior for a single feed request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts
    #[serde(default = "default_retry_times")]
    pub times: u32,

    /// Per-attempt timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Pause between attempts in milliseconds
    #[serde(default)]
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            times: default_retry_times(),
            timeout_ms: default_timeout_ms(),
            delay_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaginationConfig {
    /// Pages requested per acquisition round
    #[serde(default = "default_batch_pages")]
    pub batch_pages: usize,

    /// Upper bound on acquisition rounds within one fetch
    #[serde(default = "default_max_fetch_iterations")]
    pub max_fetch_iterations: usize,

    /// Items moved per left/right key press
    #[serde(default = "default_scroll_step")]
    pub scroll_step: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            batch_pages: default_batch_pages(),
            max_fetch_iterations: default_max_fetch_iterations(),
            scroll_step: default_scroll_step(),
        }
    }
}

/// Key names per action, e.g. `["j", "Down"]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Keybindings {
    pub up: Vec<String>,
    pub down: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub open: Vec<String>,
    pub clear: Vec<String>,
    pub refresh: Vec<String>,
    pub help: Vec<String>,
    pub quit: Vec<String>,
}

impl Default for Keybindings {
    fn default() -> Self {
        fn keys(names: &[&str]) -> Vec<String> {
            names.iter().map(|s| s.to_string()).collect()
        }

        Self {
            up: keys(&["k", "Up"]),
            down: keys(&["j", "Down"]),
            left: keys(&["h", "Left"]),
            right: keys(&["l", "Right"]),
            open: keys(&["Enter"]),
            clear: keys(&["Esc"]),
            refresh: keys(&["r"]),
            help: keys(&["?"]),
            quit: keys(&["q"]),
        }
    }
}

impl Keybindings {
    /// Check whether a key event matches any of the bound key names.
    ///
    /// Events carrying Ctrl or Alt never match so they stay free for
    /// global shortcuts.
    pub fn matches(&self, bound: &[String], key: &KeyEvent) -> bool {
        if key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        {
            return false;
        }
        bound.iter().any(|name| key_name_matches(name, key.code))
    }
}

fn key_name_matches(name: &str, code: KeyCode) -> bool {
    match (name, code) {
        ("Up", KeyCode::Up)
        | ("Down", KeyCode::Down)
        | ("Left", KeyCode::Left)
        | ("Right", KeyCode::Right)
        | ("Enter", KeyCode::Enter)
        | ("Esc", KeyCode::Esc)
        | ("Tab", KeyCode::Tab)
        | ("Backspace", KeyCode::Backspace)
        | ("PageUp", KeyCode::PageUp)
        | ("PageDown", KeyCode::PageDown)
        | ("Home", KeyCode::Home)
        | ("End", KeyCode::End) => true,
        ("Space", KeyCode::Char(' ')) => true,
        (name, KeyCode::Char(c)) => {
            let mut chars = name.chars();
            chars.next() == Some(c) && chars.next().is_none()
        }
        _ => false,
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn default_card_width() -> u16 {
    32
}

fn default_retry_times() -> u32 {
    5
}

fn default_timeout_ms() -> u64 {
    2000
}

fn default_batch_pages() -> usize {
    2
}

fn default_max_fetch_iterations() -> usize {
    10
}

fn default_scroll_step() -> usize {
    1
}

impl Config {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self {
            access_key: None,
            parallel_requests: false,
            card_width: default_card_width(),
            retry: RetryConfig::default(),
            pagination: PaginationConfig::default(),
            filter: FilterConfig::default(),
            keybindings: Keybindings::default(),
        }
    }

    /// Get the path to the config file.
    ///
    /// Returns ~/.config/rec-grid/config.toml on Linux,
    /// or a platform-appropriate location on other systems.
    pub fn get_config_path() -> std::result::Result<PathBuf, io::Error> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, "Could not find config directory")
            })?
            .join("rec-grid");

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from disk.
    ///
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::get_config_path()?;

        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> Result<()> {
        let path = Self::get_config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Create a default config file if one doesn't exist.
    ///
    /// Returns the path to the config file.
    pub fn create_default_if_missing() -> Result<PathBuf> {
        let path = Self::get_config_path()?;

        if !path.exists() {
            let config = Self::new();
            config.save()?;
        }

        Ok(path)
    }
}
