use crate::app_config::AppConfig;
use crate::geo::Coordinate;
use crate::ConfigError;

const DEFAULT_FALLBACK_LATITUDE: &str = "6.5244";
const DEFAULT_FALLBACK_LONGITUDE: &str = "3.3792";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let log_level = or_default("NEARCARE_LOG_LEVEL", "info");
    let providers_path = lookup("NEARCARE_PROVIDERS_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);

    let search_radius_meters = parse_u32("NEARCARE_SEARCH_RADIUS_METERS", "5000")?;
    if search_radius_meters == 0 {
        return Err(invalid(
            "NEARCARE_SEARCH_RADIUS_METERS",
            "must be greater than zero".to_string(),
        ));
    }

    let provider_timeout_secs = parse_u64("NEARCARE_PROVIDER_TIMEOUT_SECS", "25")?;
    if provider_timeout_secs == 0 {
        return Err(invalid(
            "NEARCARE_PROVIDER_TIMEOUT_SECS",
            "must be greater than zero".to_string(),
        ));
    }

    let location_timeout_secs = parse_u64("NEARCARE_LOCATION_TIMEOUT_SECS", "8")?;

    // The fallback pair only makes sense together.
    let lat_set = lookup("NEARCARE_FALLBACK_LATITUDE").is_ok();
    let lon_set = lookup("NEARCARE_FALLBACK_LONGITUDE").is_ok();
    if lat_set && !lon_set {
        return Err(ConfigError::MissingEnvVar(
            "NEARCARE_FALLBACK_LONGITUDE".to_string(),
        ));
    }
    if lon_set && !lat_set {
        return Err(ConfigError::MissingEnvVar(
            "NEARCARE_FALLBACK_LATITUDE".to_string(),
        ));
    }
    let fallback_latitude = parse_f64("NEARCARE_FALLBACK_LATITUDE", DEFAULT_FALLBACK_LATITUDE)?;
    let fallback_longitude =
        parse_f64("NEARCARE_FALLBACK_LONGITUDE", DEFAULT_FALLBACK_LONGITUDE)?;
    let fallback_location = Coordinate::new(fallback_latitude, fallback_longitude)
        .map_err(|e| invalid("NEARCARE_FALLBACK_LATITUDE", e.to_string()))?;

    let user_agent = or_default("NEARCARE_USER_AGENT", "nearcare/0.1 (facility-discovery)");
    let geolocate_url = lookup("NEARCARE_GEOLOCATE_URL")
        .ok()
        .filter(|u| !u.trim().is_empty());

    Ok(AppConfig {
        log_level,
        providers_path,
        search_radius_meters,
        provider_timeout_secs,
        location_timeout_secs,
        fallback_location,
        user_agent,
        geolocate_url,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
