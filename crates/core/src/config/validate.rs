use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Source base URL is present
/// - no_license_status is a client-error status
/// - common_key, when present, is 32 hex digits
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Source validation
    if config.source.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "source.base_url cannot be empty".to_string(),
        ));
    }

    if let Some(key) = &config.source.common_key {
        if key.len() != 32 || !key.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ConfigError::ValidationError(
                "source.common_key must be 32 hex digits".to_string(),
            ));
        }
    }

    // Download mapping validation
    if !(400..=499).contains(&config.download.no_license_status) {
        return Err(ConfigError::ValidationError(format!(
            "download.no_license_status must be a 4xx status, got {}",
            config.download.no_license_status
        )));
    }

    Ok(())
}
