//! Configuration file support for the METAR decoder CLI.
//!
//! Loads settings from `~/.config/metar-decoder/config.toml` on Linux
//! (or platform-appropriate location on other OSes).

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::filter::ReportFilter;
use crate::parser::{DecodeMode, DecodeOptions};

/// Output format for decoded reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Normalized report text
    #[default]
    Text,
    /// One JSON object per line
    Json,
    /// Plain-language description
    Describe,
}

/// Application configuration loaded from TOML file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Lenient or strict decoding.
    pub mode: DecodeMode,

    /// How decoded reports are printed.
    pub output: OutputFormat,

    /// Print a statistics summary after the input is exhausted.
    pub stats: bool,

    /// Report filters for selective output. Empty means print everything.
    pub filters: Vec<ReportFilter>,
}

impl Config {
    /// Load configuration from the default config file location.
    ///
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but is malformed.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Config::default()),
        }
    }

    /// Load configuration from an explicit path, which must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid TOML in config file: {}", path.display()))
    }

    /// Returns the path to the config file.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("metar-decoder/config.toml"))
    }

    /// Validate all configuration settings.
    ///
    /// Returns an error if any filters have invalid patterns.
    pub fn validate(&self) -> Result<()> {
        for (i, filter) in self.filters.iter().enumerate() {
            filter
                .validate()
                .map_err(|e| anyhow::anyhow!("Invalid filter [{}]: {}", i, e))?;
        }
        Ok(())
    }

    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions { mode: self.mode }
    }
}
