use super::{types::Config, ConfigError};

/// Allowed listing cache TTL, in seconds.
const LISTING_TTL_RANGE: std::ops::RangeInclusive<u64> = 60..=600;

/// Validate configuration
/// Currently validates:
/// - Storage bucket is set
/// - Server port is not 0
/// - Listing cache TTL is within 60-600 seconds and capacity is at least 1
/// - Resolver and sync orbit type lists are not empty
/// - Upstream page size is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.storage.bucket.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "storage.bucket cannot be empty".to_string(),
        ));
    }

    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Resolver validation
    if !LISTING_TTL_RANGE.contains(&config.resolver.listing_ttl_secs) {
        return Err(ConfigError::ValidationError(format!(
            "resolver.listing_ttl_secs must be between {} and {}, got {}",
            LISTING_TTL_RANGE.start(),
            LISTING_TTL_RANGE.end(),
            config.resolver.listing_ttl_secs
        )));
    }
    if config.resolver.listing_cache_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "resolver.listing_cache_capacity cannot be 0".to_string(),
        ));
    }
    if config.resolver.orbit_types.is_empty() {
        return Err(ConfigError::ValidationError(
            "resolver.orbit_types cannot be empty".to_string(),
        ));
    }

    // Upstream validation
    if config.upstream.cdse.page_size == 0 {
        return Err(ConfigError::ValidationError(
            "upstream.page_size cannot be 0".to_string(),
        ));
    }

    if config.sync.orbit_types.is_empty() {
        return Err(ConfigError::ValidationError(
            "sync.orbit_types cannot be empty".to_string(),
        ));
    }

    Ok(())
}
