use std::path::PathBuf;

use crate::geo::Coordinate;

#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    /// YAML provider list; `None` means the built-in mirror list.
    pub providers_path: Option<PathBuf>,
    pub search_radius_meters: u32,
    pub provider_timeout_secs: u64,
    pub location_timeout_secs: u64,
    /// Origin used when the live position cannot be obtained.
    pub fallback_location: Coordinate,
    pub user_agent: String,
    /// IP geolocation lookup URL. May carry an access token in its query string.
    pub geolocate_url: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("providers_path", &self.providers_path)
            .field("search_radius_meters", &self.search_radius_meters)
            .field("provider_timeout_secs", &self.provider_timeout_secs)
            .field("location_timeout_secs", &self.location_timeout_secs)
            .field("fallback_location", &self.fallback_location)
            .field("user_agent", &self.user_agent)
            .field(
                "geolocate_url",
                &self.geolocate_url.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}
