use crate::config::types::{Config, CrawlerConfig, OutputConfig, SiteConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on concurrent thread fetches; the forum bans aggressive clients
const MAX_CONCURRENT_ARTICLES: usize = 16;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the forum location and page markers
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use HTTP or HTTPS",
            config.base_url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' has no host",
            config.base_url
        )));
    }

    if config.busy_marker.trim().is_empty() {
        return Err(ConfigError::Validation(
            "busy-marker cannot be empty".to_string(),
        ));
    }

    if config.signature_marker.is_empty() {
        return Err(ConfigError::Validation(
            "signature-marker cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawler pacing
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.article_delay > config.page_delay {
        return Err(ConfigError::Validation(format!(
            "article-delay ({}ms) must not exceed page-delay ({}ms)",
            config.article_delay, config.page_delay
        )));
    }

    if config.busy_delay > config.max_busy_delay {
        return Err(ConfigError::Validation(format!(
            "busy-delay ({}ms) must not exceed max-busy-delay ({}ms)",
            config.busy_delay, config.max_busy_delay
        )));
    }

    if config.max_busy_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max-busy-retries must be >= 1, got {}",
            config.max_busy_retries
        )));
    }

    if config.max_concurrent_articles < 1 || config.max_concurrent_articles > MAX_CONCURRENT_ARTICLES
    {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-articles must be between 1 and {}, got {}",
            MAX_CONCURRENT_ARTICLES, config.max_concurrent_articles
        )));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(
            "request-timeout must be at least 1 second".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler-version cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.boards_file.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "boards-file cannot be empty".to_string(),
        ));
    }

    Ok(())
}
