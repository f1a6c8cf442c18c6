use crate::config::types::{Config, CrawlerConfig, ProfilerConfig, PublishConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
///
/// Runs before any network activity; a failure here is fatal.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_website_url(config.target.website_url.as_deref())?;
    validate_crawler_config(&config.crawler)?;
    validate_profiler_config(&config.profiler)?;
    validate_publish_config(&config.publish)?;
    Ok(())
}

/// Validates the seed URL and returns it parsed
pub fn validate_website_url(url: Option<&str>) -> Result<Url, ConfigError> {
    let url = url.ok_or_else(|| {
        ConfigError::Validation("WEBSITE_URL is not set".to_string())
    })?;

    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::InvalidUrl(format!(
            "'{}' must start with http:// or https://",
            url
        )));
    }

    let parsed = Url::parse(url)
        .map_err(|e| ConfigError::InvalidUrl(format!("'{}': {}", url, e)))?;

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::InvalidUrl(format!("'{}' has no host", url)));
    }

    Ok(parsed)
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.request_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "request_timeout must be greater than zero".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_profiler_config(config: &ProfilerConfig) -> Result<(), ConfigError> {
    if config.page_load_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "page_load_timeout must be greater than zero".to_string(),
        ));
    }

    if config.viewport_width == 0 || config.viewport_height == 0 {
        return Err(ConfigError::Validation(format!(
            "viewport must be non-zero, got {}x{}",
            config.viewport_width, config.viewport_height
        )));
    }

    Url::parse(&config.webdriver_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid webdriver_url: {}", e)))?;

    Ok(())
}

fn validate_publish_config(config: &PublishConfig) -> Result<(), ConfigError> {
    if let Some(repo) = config.github_repository.as_deref() {
        validate_repository(repo)?;
    }

    Url::parse(&config.api_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid api_url: {}", e)))?;

    Ok(())
}

/// Repository must be `owner/name` with both parts non-empty
fn validate_repository(repo: &str) -> Result<(), ConfigError> {
    let parts: Vec<&str> = repo.split('/').collect();
    if parts.len() != 2 || parts.iter().any(|p| p.is_empty()) {
        return Err(ConfigError::Validation(format!(
            "GITHUB_REPOSITORY must look like 'owner/name', got '{}'",
            repo
        )));
    }
    Ok(())
}
