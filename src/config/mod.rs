//! Configuration module for Borer
//!
//! This module holds the scan settings, loads them from TOML files, and
//! validates them before a scan starts.
//!
//! # Example
//!
//! ```no_run
//! use borer::config::load_config;
//! use std::path::Path;
//!
//! let settings = load_config(Path::new("borer.toml")).unwrap();
//! println!("Scan will use {} workers", settings.workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{OutputFormat, ScanSettings, DEFAULT_USER_AGENT};

// Re-export parser functions
pub use parser::{
    compute_config_hash, default_config_paths, find_config_file, load_config, load_settings,
    load_settings_with_hash, scopes,
};
pub use validation::validate;
