use crate::config::types::{OutputFormat, ScanSettings};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(settings: &ScanSettings) -> Result<(), ConfigError> {
    validate_urls(&settings.urls)?;
    validate_limits(settings)?;
    validate_spider_codes(settings)?;
    validate_proxies(&settings.proxies)?;
    validate_output(settings)?;
    Ok(())
}

/// Validates the base URLs
fn validate_urls(urls: &[String]) -> Result<(), ConfigError> {
    if urls.is_empty() {
        return Err(ConfigError::Validation("URL is required".to_string()));
    }

    for raw in urls {
        parse_base_url(raw)?;
    }

    Ok(())
}

/// Parses one base URL, requiring an http(s) scheme and a host
pub(crate) fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidUrl(format!("Unable to parse base URL '{}': {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Base URL '{}' must use http or https",
            raw
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "Base URL '{}' has no host",
            raw
        )));
    }

    Ok(url)
}

fn validate_limits(settings: &ScanSettings) -> Result<(), ConfigError> {
    if settings.threads < 1 {
        return Err(ConfigError::Validation(format!(
            "threads must be >= 1, got {}",
            settings.threads
        )));
    }

    if settings.workers < 1 {
        return Err(ConfigError::Validation(format!(
            "workers must be >= 1, got {}",
            settings.workers
        )));
    }

    if settings.queue_size < 1 {
        return Err(ConfigError::Validation(format!(
            "queue-size must be >= 1, got {}",
            settings.queue_size
        )));
    }

    if settings.timeout == 0 {
        return Err(ConfigError::Validation(
            "timeout must be greater than 0ms".to_string(),
        ));
    }

    Ok(())
}

fn validate_spider_codes(settings: &ScanSettings) -> Result<(), ConfigError> {
    if let Some(code) = settings
        .spider_codes
        .iter()
        .find(|code| !(100..=599).contains(*code))
    {
        return Err(ConfigError::Validation(format!(
            "spider code {} is not a valid HTTP status",
            code
        )));
    }
    Ok(())
}

fn validate_proxies(proxies: &[String]) -> Result<(), ConfigError> {
    for proxy in proxies {
        if let Err(e) = Url::parse(proxy) {
            return Err(ConfigError::InvalidProxy {
                proxy: proxy.clone(),
                message: e.to_string(),
            });
        }
    }
    Ok(())
}

fn validate_output(settings: &ScanSettings) -> Result<(), ConfigError> {
    if settings.output_format == OutputFormat::Sqlite && settings.output_path.is_none() {
        return Err(ConfigError::Validation(
            "sqlite output requires an output path".to_string(),
        ));
    }
    Ok(())
}
