use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Public Overpass API mirrors, in the order they are tried when no providers
/// file is configured.
pub const DEFAULT_PROVIDER_URLS: &[&str] = &[
    "https://overpass-api.de/api/interpreter",
    "https://overpass.kumi.systems/api/interpreter",
    "https://maps.mail.ru/osm/tools/overpass/api/interpreter",
];

/// One upstream mirror. Lower `priority` values are tried first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoint {
    pub url: String,
    #[serde(default)]
    pub priority: u32,
}

impl ProviderEndpoint {
    #[must_use]
    pub fn new(url: impl Into<String>, priority: u32) -> Self {
        Self {
            url: url.into(),
            priority,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProvidersFile {
    pub providers: Vec<ProviderEndpoint>,
}

/// The built-in mirror list, prioritised in declaration order.
#[must_use]
pub fn default_endpoints() -> Vec<ProviderEndpoint> {
    DEFAULT_PROVIDER_URLS
        .iter()
        .zip(1u32..)
        .map(|(url, priority)| ProviderEndpoint::new(*url, priority))
        .collect()
}

/// Returns the endpoints sorted by ascending priority. Equal priorities keep
/// their configured order.
#[must_use]
pub fn in_try_order(endpoints: &[ProviderEndpoint]) -> Vec<ProviderEndpoint> {
    let mut ordered = endpoints.to_vec();
    ordered.sort_by_key(|e| e.priority);
    ordered
}

/// Load and validate the provider endpoint list from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_providers(path: &Path) -> Result<ProvidersFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ProvidersFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let mut providers_file: ProvidersFile =
        serde_yaml::from_str(&content).map_err(ConfigError::ProvidersFileParse)?;

    // Quoted YAML scalars keep surrounding whitespace; the URL is sent as stored.
    for provider in &mut providers_file.providers {
        provider.url = provider.url.trim().to_string();
    }

    validate_providers(&providers_file)?;

    Ok(providers_file)
}

fn validate_providers(providers_file: &ProvidersFile) -> Result<(), ConfigError> {
    if providers_file.providers.is_empty() {
        return Err(ConfigError::Validation(
            "at least one provider endpoint is required".to_string(),
        ));
    }

    let mut seen_urls = HashSet::new();

    for provider in &providers_file.providers {
        let url = provider.url.trim();
        if url.is_empty() {
            return Err(ConfigError::Validation(
                "provider url must be non-empty".to_string(),
            ));
        }

        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigError::Validation(format!(
                "provider url '{url}' must use http or https"
            )));
        }

        let normalized = url.trim_end_matches('/').to_lowercase();
        if !seen_urls.insert(normalized) {
            return Err(ConfigError::Validation(format!(
                "duplicate provider url: '{url}'"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "providers_test.rs"]
mod tests;
