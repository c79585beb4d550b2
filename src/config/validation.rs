use crate::config::types::{RateLimitConfig, ScraperConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &ScraperConfig) -> Result<(), ConfigError> {
    validate_request_settings(config)?;
    validate_rate_limit(&config.rate_limit)?;
    validate_concurrency(config.max_concurrent)?;
    Ok(())
}

/// Validates user agent, timeout and retry settings
fn validate_request_settings(config: &ScraperConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.max_retries == 0 {
        return Err(ConfigError::Validation(
            "max_retries must be >= 1 (it counts the first attempt)".to_string(),
        ));
    }

    Ok(())
}

/// Validates the rolling-window quota
fn validate_rate_limit(config: &RateLimitConfig) -> Result<(), ConfigError> {
    if config.requests == 0 {
        return Err(ConfigError::Validation(format!(
            "rate_limit.requests must be >= 1, got {}",
            config.requests
        )));
    }

    if config.window_ms == 0 {
        return Err(ConfigError::Validation(
            "rate_limit.window_ms must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates the concurrent-fetch cap
fn validate_concurrency(max_concurrent: usize) -> Result<(), ConfigError> {
    if !(1..=100).contains(&max_concurrent) {
        return Err(ConfigError::Validation(format!(
            "max_concurrent must be between 1 and 100, got {}",
            max_concurrent
        )));
    }

    Ok(())
}
