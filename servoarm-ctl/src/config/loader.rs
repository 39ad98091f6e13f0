//! Configuration loading
//!
//! Loads the controller configuration from a TOML file given on the command
//! line, or falls back to the `arm.toml` compiled into the binary.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::LevelFilter;
use serde::Deserialize;

use servoarm_core::config::{ArmConfig, ConfigError};

/// Embedded default configuration
///
/// Edit arm.toml and rebuild to change the defaults.
pub const EMBEDDED_CONFIG: &str = include_str!("../../arm.toml");

/// Default I2C adapter
pub const DEFAULT_I2C_DEVICE: &str = "/dev/i2c-1";

/// Bus settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// I2C adapter device node
    pub device: PathBuf,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from(DEFAULT_I2C_DEVICE),
        }
    }
}

/// Complete controller configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CtlConfig {
    /// Log level name
    pub log_level: String,
    pub bus: BusConfig,
    pub arm: ArmConfig,
}

impl Default for CtlConfig {
    fn default() -> Self {
        Self {
            log_level: String::from("info"),
            bus: BusConfig::default(),
            arm: ArmConfig::default(),
        }
    }
}

impl CtlConfig {
    /// Parsed log level
    pub fn level(&self) -> Result<LevelFilter, LoadError> {
        LevelFilter::from_str(&self.log_level)
            .map_err(|_| LoadError::LogLevel(self.log_level.clone()))
    }
}

/// Where the configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Embedded,
    File(PathBuf),
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Embedded => f.write_str("embedded arm.toml"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum LoadError {
    /// File could not be read
    Read { path: PathBuf, source: io::Error },
    /// TOML syntax or schema error
    Parse(toml::de::Error),
    /// Arm configuration is inconsistent
    Invalid(ConfigError),
    /// Unknown log level name
    LogLevel(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, source } => write!(f, "cannot read {}: {}", path.display(), source),
            Self::Parse(e) => write!(f, "invalid configuration: {}", e),
            Self::Invalid(e) => write!(f, "invalid arm configuration: {}", e),
            Self::LogLevel(level) => write!(f, "unknown log level '{}'", level),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for LoadError {
    fn from(e: toml::de::Error) -> Self {
        LoadError::Parse(e)
    }
}

impl From<ConfigError> for LoadError {
    fn from(e: ConfigError) -> Self {
        LoadError::Invalid(e)
    }
}

/// Parse and validate a configuration
pub fn parse_config(text: &str) -> Result<CtlConfig, LoadError> {
    let config: CtlConfig = toml::from_str(text)?;
    config.arm.validate()?;
    config.level()?;
    Ok(config)
}

/// Load the configuration from `path`, or the embedded default
pub fn load(path: Option<&Path>) -> Result<(CtlConfig, ConfigSource), LoadError> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|source| LoadError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            Ok((parse_config(&text)?, ConfigSource::File(path.to_path_buf())))
        }
        None => Ok((parse_config(EMBEDDED_CONFIG)?, ConfigSource::Embedded)),
    }
}
