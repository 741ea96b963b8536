use crate::config::types::ScanSettings;
use crate::config::validation::{parse_base_url, validate};
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use url::Url;

/// System-wide config location, checked after the per-user one
const SYSTEM_CONFIG_PATH: &str = "/etc/borer.toml";

/// Loads settings from a TOML file
///
/// Keys missing from the file keep their defaults. The result is not
/// validated here, since command-line flags are usually applied on top
/// before [`validate`] runs.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(ScanSettings)` - Successfully loaded settings
/// * `Err(ConfigError)` - Failed to read or parse the file
pub fn load_settings(path: &Path) -> Result<ScanSettings, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let settings: ScanSettings = toml::from_str(&content)?;
    Ok(settings)
}

/// Loads and validates settings from a TOML file
pub fn load_config(path: &Path) -> Result<ScanSettings, ConfigError> {
    let settings = load_settings(path)?;
    validate(&settings)?;
    Ok(settings)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// This is logged at startup so a report can be tied back to the exact
/// configuration that produced it.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&content);
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads settings and returns both the settings and the file hash
pub fn load_settings_with_hash(path: &Path) -> Result<(ScanSettings, String), ConfigError> {
    let settings = load_settings(path)?;
    let hash = compute_config_hash(path)?;
    Ok((settings, hash))
}

/// Candidate config file locations, in search order
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(home) = std::env::var_os("HOME") {
        paths.push(PathBuf::from(home).join(".config").join("borer.toml"));
    }
    paths.push(PathBuf::from(SYSTEM_CONFIG_PATH));
    paths
}

/// Returns the first existing regular file among `paths`
pub fn find_config_file(paths: &[PathBuf]) -> Option<PathBuf> {
    paths.iter().find(|p| p.is_file()).cloned()
}

/// Converts the configured base URLs into scope URLs
///
/// An empty path becomes `/`.
pub fn scopes(settings: &ScanSettings) -> Result<Vec<Url>, ConfigError> {
    if settings.urls.is_empty() {
        return Err(ConfigError::Validation("URL is required".to_string()));
    }

    let mut scopes = Vec::with_capacity(settings.urls.len());
    for raw in &settings.urls {
        let mut scope = parse_base_url(raw)?;
        if scope.path().is_empty() {
            scope.set_path("/");
        }
        tracing::debug!("Added base URL: {}", scope);
        scopes.push(scope);
    }
    Ok(scopes)
}
