use crate::config::types::Config;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// The file is only parsed here; validation runs once every layer
/// (file, environment, command line) has been applied.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully parsed configuration
/// * `Err(ConfigError)` - Failed to read or parse the file
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use sumi_audit::config::load_config_file;
///
/// let config = load_config_file(Path::new("audit.toml")).unwrap();
/// println!("Max pages: {}", config.crawler.max_pages);
/// ```
pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so a report can be traced back to the config that
/// produced it.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration file and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config_file(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Applies environment-style overrides on top of `config`
///
/// `lookup` resolves a variable name to its value; pass
/// `|key| std::env::var(key).ok()` for the process environment.
///
/// | Variable | Unit of a bare number |
/// |----------|-----------------------|
/// | `WEBSITE_URL` | - |
/// | `GITHUB_TOKEN`, `GITHUB_REPOSITORY` | - |
/// | `MAX_PAGES` | pages |
/// | `REQUEST_TIMEOUT`, `CRAWL_DELAY` | seconds |
/// | `PAGE_LOAD_TIMEOUT`, `NETWORK_IDLE_DELAY` | seconds |
/// | `OBSERVER_WINDOW` | milliseconds |
/// | `VIEWPORT` | `WIDTHxHEIGHT` |
/// | `WEBDRIVER_URL` | - |
/// | `SITEMAP_MAX_DEPTH` | levels |
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = get("WEBSITE_URL") {
        config.target.website_url = Some(url.trim().to_string());
    }
    if let Some(token) = get("GITHUB_TOKEN") {
        config.publish.github_token = Some(token);
    }
    if let Some(repo) = get("GITHUB_REPOSITORY") {
        config.publish.github_repository = Some(repo.trim().to_string());
    }
    if let Some(value) = get("MAX_PAGES") {
        config.crawler.max_pages = parse_number("MAX_PAGES", &value)?;
    }
    if let Some(value) = get("REQUEST_TIMEOUT") {
        config.crawler.request_timeout_ms = parse_duration_ms("REQUEST_TIMEOUT", &value, 1000.0)?;
    }
    if let Some(value) = get("CRAWL_DELAY") {
        config.crawler.crawl_delay_ms = parse_duration_ms("CRAWL_DELAY", &value, 1000.0)?;
    }
    if let Some(value) = get("PAGE_LOAD_TIMEOUT") {
        config.profiler.page_load_timeout_ms =
            parse_duration_ms("PAGE_LOAD_TIMEOUT", &value, 1000.0)?;
    }
    if let Some(value) = get("NETWORK_IDLE_DELAY") {
        config.profiler.network_idle_delay_ms =
            parse_duration_ms("NETWORK_IDLE_DELAY", &value, 1000.0)?;
    }
    if let Some(value) = get("OBSERVER_WINDOW") {
        config.profiler.observer_window_ms = parse_duration_ms("OBSERVER_WINDOW", &value, 1.0)?;
    }
    if let Some(value) = get("VIEWPORT") {
        let (width, height) = parse_viewport(&value)?;
        config.profiler.viewport_width = width;
        config.profiler.viewport_height = height;
    }
    if let Some(value) = get("WEBDRIVER_URL") {
        config.profiler.webdriver_url = value.trim().to_string();
    }
    if let Some(value) = get("SITEMAP_MAX_DEPTH") {
        config.sitemap.max_depth = parse_number("SITEMAP_MAX_DEPTH", &value)?;
    }

    Ok(())
}

fn parse_number(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Parses `10s`, `0.1s`, `500ms`, or a bare number scaled by `bare_unit_ms`
///
/// Returns whole milliseconds.
pub fn parse_duration_ms(key: &str, value: &str, bare_unit_ms: f64) -> Result<u64, ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    };

    let trimmed = value.trim().to_ascii_lowercase();
    let (number, scale) = if let Some(n) = trimmed.strip_suffix("ms") {
        (n, 1.0)
    } else if let Some(n) = trimmed.strip_suffix('s') {
        (n, 1000.0)
    } else {
        (trimmed.as_str(), bare_unit_ms)
    };

    let parsed: f64 = number.trim().parse().map_err(|_| invalid())?;
    if !parsed.is_finite() || parsed < 0.0 {
        return Err(invalid());
    }

    Ok((parsed * scale).round() as u64)
}

/// Parses a `WIDTHxHEIGHT` viewport specification
pub fn parse_viewport(value: &str) -> Result<(u32, u32), ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        key: "VIEWPORT".to_string(),
        value: value.to_string(),
    };

    let (w, h) = value
        .trim()
        .to_ascii_lowercase()
        .split_once('x')
        .map(|(w, h)| (w.trim().to_string(), h.trim().to_string()))
        .ok_or_else(invalid)?;

    let width = w.parse().map_err(|_| invalid())?;
    let height = h.parse().map_err(|_| invalid())?;
    Ok((width, height))
}
