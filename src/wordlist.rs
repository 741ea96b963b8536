//! Wordlist loading

use crate::{ConfigError, ConfigResult};
use std::path::Path;

/// Used when no wordlist file is configured
const BUILTIN_WORDS: &[&str] = &[
    "admin",
    "administrator",
    "api",
    "backup",
    "backups",
    "bin",
    "cgi-bin",
    "config",
    "console",
    "css",
    "data",
    "db",
    "debug",
    "dev",
    "docs",
    "download",
    "files",
    "images",
    "img",
    "include",
    "includes",
    "index",
    "js",
    "lib",
    "log",
    "login",
    "logs",
    "old",
    "private",
    "robots.txt",
    "server-status",
    "sitemap.xml",
    "static",
    "test",
    "tmp",
    "upload",
    "uploads",
    "user",
    "users",
    ".git/HEAD",
    ".htaccess",
];

/// Loads the wordlist for a scan
///
/// One word per line; lines are trimmed, and blank lines and `#` comments are
/// skipped. With no path the built-in list is returned.
pub fn load_wordlist(path: Option<&Path>) -> ConfigResult<Vec<String>> {
    let Some(path) = path else {
        return Ok(builtin_wordlist());
    };

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Wordlist {
        path: path.display().to_string(),
        source,
    })?;

    let words = parse_wordlist(&content);
    tracing::info!("Loaded {} words from {}", words.len(), path.display());
    Ok(words)
}

pub fn builtin_wordlist() -> Vec<String> {
    BUILTIN_WORDS.iter().map(|w| w.to_string()).collect()
}

fn parse_wordlist(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}
