//! Configuration loading and parsing
//!
//! Loads configuration from a TOML file or the embedded defaults.

pub mod loader;

pub use loader::{load, CtlConfig};
