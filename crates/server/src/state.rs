use axum::http::StatusCode;

use titlegate_core::{Config, PackagingEngine, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    engine: PackagingEngine,
}

impl AppState {
    pub fn new(config: Config, engine: PackagingEngine) -> Self {
        Self { config, engine }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine(&self) -> &PackagingEngine {
        &self.engine
    }

    /// Status returned when a title has no public license. Validated at
    /// startup to be a 4xx; falls back to 406 if the config slipped past
    /// validation.
    pub fn no_license_status(&self) -> StatusCode {
        StatusCode::from_u16(self.config.download.no_license_status)
            .unwrap_or(StatusCode::NOT_ACCEPTABLE)
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }
}
