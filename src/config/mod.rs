//! Configuration module for Scrapyard
//!
//! This module handles loading, parsing, and validating TOML configuration files
//! that describe scrap tasks for the command-line runner.
//!
//! # Example
//!
//! ```no_run
//! use scrapyard::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scrapyard.toml")).unwrap();
//! println!("{} scrap(s) configured", config.scraps.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserConfig, Config, EngineConfig, FieldConfig, HttpConfig, OutputConfig, ScrapConfig,
    TransportKind,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
