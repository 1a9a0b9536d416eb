use std::sync::Arc;

use orbits_core::{Config, OrbitResolver, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    resolver: Arc<OrbitResolver>,
}

impl AppState {
    pub fn new(config: Config, resolver: Arc<OrbitResolver>) -> Self {
        Self { config, resolver }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn resolver(&self) -> &OrbitResolver {
        self.resolver.as_ref()
    }
}
