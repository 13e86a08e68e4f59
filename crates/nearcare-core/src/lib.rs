pub mod app_config;
pub mod config;
pub mod facility;
pub mod geo;
pub mod providers;
pub mod query;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use facility::{Facility, FacilityKind, RankedFacility, UNKNOWN_ADDRESS};
pub use geo::{haversine_km, Coordinate, EARTH_RADIUS_KM};
pub use providers::{
    default_endpoints, in_try_order, load_providers, ProviderEndpoint, ProvidersFile,
};
pub use query::{SearchQuery, SearchQueryBuilder, DEFAULT_RADIUS_METERS};

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("invalid coordinate ({latitude}, {longitude}): latitude must be in [-90, 90] and longitude in [-180, 180]")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("search radius must be greater than zero")]
    InvalidRadius,

    #[error("search query must request at least one facility kind")]
    NoFacilityKinds,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read providers file {path}: {source}")]
    ProvidersFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse providers file: {0}")]
    ProvidersFileParse(#[source] serde_yaml::Error),

    #[error("providers validation error: {0}")]
    Validation(String),
}
