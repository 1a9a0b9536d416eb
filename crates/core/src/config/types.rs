use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

use crate::orbit::{OrbitType, WindowMode};
use crate::resolver::ResolverOptions;
use crate::storage::S3StoreConfig;
use crate::sync::{LocalScope, SyncOptions};
use crate::upstream::{CdseConfig, Credentials};

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

impl Config {
    /// Resolver settings derived from the storage and resolver sections.
    pub fn resolver_options(&self) -> ResolverOptions {
        let mut options = ResolverOptions::for_bucket(&self.storage.bucket);
        if let Some(public_url) = &self.storage.public_url {
            options.location_base = public_url.clone();
        }
        options.orbit_types = self.resolver.orbit_types.clone();
        options.window = self.resolver.window;
        options
    }

    /// Reconciler settings derived from the storage and sync sections.
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            bucket: self.storage.bucket.clone(),
            pace: (self.sync.pace_secs > 0).then(|| Duration::from_secs(self.sync.pace_secs)),
            local_scope: self.sync.local_scope,
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.upstream.username, &self.upstream.password)
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Mirror bucket configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub bucket: String,
    #[serde(flatten)]
    pub s3: S3StoreConfig,
    /// Base of redirect locations (default: `https://<bucket>.s3.amazonaws.com`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
}

/// Resolver configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    #[serde(default)]
    pub window: WindowMode,
    /// Orbit types to try, most preferred first
    #[serde(default = "default_orbit_types")]
    pub orbit_types: Vec<OrbitType>,
    /// Listing cache TTL in seconds (default: 600, allowed: 60-600)
    #[serde(default = "default_listing_ttl")]
    pub listing_ttl_secs: u64,
    /// Listing cache entries (default: 10)
    #[serde(default = "default_listing_capacity")]
    pub listing_cache_capacity: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            window: WindowMode::default(),
            orbit_types: default_orbit_types(),
            listing_ttl_secs: default_listing_ttl(),
            listing_cache_capacity: default_listing_capacity(),
        }
    }
}

impl ResolverConfig {
    pub fn listing_ttl(&self) -> Duration {
        Duration::from_secs(self.listing_ttl_secs)
    }
}

fn default_orbit_types() -> Vec<OrbitType> {
    OrbitType::ALL.to_vec()
}

fn default_listing_ttl() -> u64 {
    crate::listing::DEFAULT_LISTING_TTL.as_secs()
}

fn default_listing_capacity() -> usize {
    crate::listing::DEFAULT_LISTING_CAPACITY
}

/// Upstream provider configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpstreamConfig {
    #[serde(flatten)]
    pub cdse: CdseConfig,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Reconciliation configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    /// Orbit types mirrored when none are given on the command line
    #[serde(default = "default_orbit_types")]
    pub orbit_types: Vec<OrbitType>,
    #[serde(default)]
    pub local_scope: LocalScope,
    /// Pause between downloads in seconds (default: 0, no pause)
    #[serde(default)]
    pub pace_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            orbit_types: default_orbit_types(),
            local_scope: LocalScope::default(),
            pace_secs: 0,
        }
    }
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub resolver: ResolverConfig,
    pub upstream: SanitizedUpstreamConfig,
    pub sync: SyncConfig,
}

/// Sanitized upstream config (password hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedUpstreamConfig {
    #[serde(flatten)]
    pub cdse: CdseConfig,
    pub username: String,
    pub password_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            storage: config.storage.clone(),
            resolver: config.resolver.clone(),
            upstream: SanitizedUpstreamConfig {
                cdse: config.upstream.cdse.clone(),
                username: config.upstream.username.clone(),
                password_configured: !config.upstream.password.is_empty(),
            },
            sync: config.sync.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_config() {
        let toml = r#"
[storage]
bucket = "s1-orbits"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.storage.bucket, "s1-orbits");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.resolver.window, WindowMode::AnxMargin);
        assert_eq!(config.resolver.orbit_types, OrbitType::ALL.to_vec());
        assert_eq!(config.resolver.listing_ttl_secs, 600);
        assert_eq!(config.resolver.listing_cache_capacity, 10);
        assert_eq!(config.upstream.cdse.client_id, "cdse-public");
        assert_eq!(config.upstream.cdse.page_size, 1000);
        assert_eq!(config.sync.local_scope, LocalScope::Prefix);
        assert_eq!(config.sync.pace_secs, 0);
    }

    #[test]
    fn test_deserialize_missing_storage_fails() {
        let toml = r#"
[server]
port = 8080
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000

[storage]
bucket = "s1-orbits"
region = "us-west-2"
endpoint = "http://localhost:9000"
force_path_style = true
public_url = "https://orbits.example.com"

[resolver]
window = "raw"
orbit_types = ["AUX_POEORB", "AUX_RESORB"]
listing_ttl_secs = 120
listing_cache_capacity = 4

[upstream]
catalog_url = "http://localhost:8081/search.json"
username = "me"
password = "secret"

[sync]
orbit_types = ["AUX_RESORB"]
local_scope = "bucket"
pace_secs = 2
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.storage.s3.region.as_deref(), Some("us-west-2"));
        assert!(config.storage.s3.force_path_style);
        assert_eq!(config.resolver.window, WindowMode::Raw);
        assert_eq!(
            config.resolver.orbit_types,
            vec![OrbitType::Precise, OrbitType::Restituted]
        );
        assert_eq!(config.upstream.cdse.catalog_url, "http://localhost:8081/search.json");
        assert_eq!(config.upstream.cdse.timeout_secs, 60);
        assert_eq!(config.upstream.username, "me");
        assert_eq!(config.sync.orbit_types, vec![OrbitType::Restituted]);
        assert_eq!(config.sync.local_scope, LocalScope::Bucket);
    }

    #[test]
    fn test_resolver_options_default_location() {
        let config: Config = toml::from_str("[storage]\nbucket = \"s1-orbits\"\n").unwrap();
        let options = config.resolver_options();
        assert_eq!(options.bucket, "s1-orbits");
        assert_eq!(options.location_base, "https://s1-orbits.s3.amazonaws.com");
    }

    #[test]
    fn test_resolver_options_public_url() {
        let toml = r#"
[storage]
bucket = "s1-orbits"
public_url = "https://orbits.example.com"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.resolver_options().location_base,
            "https://orbits.example.com"
        );
    }

    #[test]
    fn test_sync_options_pace() {
        let mut config: Config = toml::from_str("[storage]\nbucket = \"b\"\n").unwrap();
        assert_eq!(config.sync_options().pace, None);
        config.sync.pace_secs = 3;
        assert_eq!(config.sync_options().pace, Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_sanitized_config_hides_password() {
        let toml = r#"
[storage]
bucket = "s1-orbits"

[upstream]
username = "me"
password = "hunter2"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert_eq!(sanitized.upstream.username, "me");
        assert!(sanitized.upstream.password_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(json.contains("cdse-public"));
    }
}
