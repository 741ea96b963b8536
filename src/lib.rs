//! Borer: a concurrent web content-discovery scanner
//!
//! This crate probes a space of candidate paths under one or more base URLs
//! (wordlist entries, optionally mangled with file extensions) and follows
//! links discovered in HTML responses, subject to scope, robots.txt, and
//! response-code policies.

pub mod config;
pub mod crawler;
pub mod output;
pub mod robots;
pub mod url;
pub mod wordlist;

use thiserror::Error;

/// Main error type for Borer operations
#[derive(Debug, Error)]
pub enum BorerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Failed to read wordlist {path}: {source}")]
    Wordlist {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid proxy {proxy}: {message}")]
    InvalidProxy { proxy: String, message: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Borer operations
pub type Result<T> = std::result::Result<T, BorerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::ScanSettings;
pub use crawler::{Candidate, Provenance, ScanResult, Scanner};
pub use robots::RobotsMode;
pub use url::{normalize_key, ScopePolicy};
