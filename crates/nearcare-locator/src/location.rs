//! Origin resolution with a deterministic fallback.
//!
//! A [`PositionSource`] stands in for the platform location service. The
//! [`LocationResolver`] asks it once, bounded by a timeout, and substitutes
//! the configured fallback coordinate on denial, lack of support, failure or
//! timeout. Falling back is not an error; which path was taken is reported
//! through `tracing` and [`ResolvedLocation::outcome`] for telemetry only.

use std::future::Future;
use std::time::Duration;

use nearcare_core::Coordinate;
use reqwest::Client;

use crate::error::PositionError;

/// A source of the user's current position.
pub trait PositionSource: Send + Sync {
    fn current_position(&self) -> impl Future<Output = Result<Coordinate, PositionError>> + Send;
}

/// A position known up front, e.g. from command-line flags.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Coordinate);

impl PositionSource for FixedPosition {
    async fn current_position(&self) -> Result<Coordinate, PositionError> {
        Ok(self.0)
    }
}

/// A platform without any location service.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedPlatform;

impl PositionSource for UnsupportedPlatform {
    async fn current_position(&self) -> Result<Coordinate, PositionError> {
        Err(PositionError::Unsupported)
    }
}

/// Approximate position from an IP geolocation endpoint.
///
/// Accepts JSON bodies carrying either `latitude`/`longitude` or `lat`/`lon`,
/// as numbers or numeric strings. A body with `"error": true` is treated as
/// unavailable.
pub struct IpGeolocation {
    client: Client,
    url: String,
}

impl IpGeolocation {
    #[must_use]
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

impl PositionSource for IpGeolocation {
    async fn current_position(&self) -> Result<Coordinate, PositionError> {
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?;
        let body = response.json::<serde_json::Value>().await?;
        coordinate_from_geolocation(&body)
    }
}

fn coordinate_from_geolocation(body: &serde_json::Value) -> Result<Coordinate, PositionError> {
    if body
        .get("error")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false)
    {
        let reason = body
            .get("reason")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("geolocation service reported an error");
        return Err(PositionError::Unavailable(reason.to_string()));
    }

    let latitude = number_field(body, &["latitude", "lat"]);
    let longitude = number_field(body, &["longitude", "lon"]);
    match (latitude, longitude) {
        (Some(lat), Some(lon)) => Coordinate::new(lat, lon)
            .map_err(|e| PositionError::Unavailable(e.to_string())),
        _ => Err(PositionError::Unavailable(
            "geolocation response has no coordinates".to_string(),
        )),
    }
}

fn number_field(body: &serde_json::Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| {
        let value = body.get(*key)?;
        value
            .as_f64()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
    })
}

/// Why the resolver fell back to the default coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    PermissionDenied,
    Unsupported,
    Unavailable,
    TimedOut,
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackReason::PermissionDenied => write!(f, "permission_denied"),
            FallbackReason::Unsupported => write!(f, "unsupported"),
            FallbackReason::Unavailable => write!(f, "unavailable"),
            FallbackReason::TimedOut => write!(f, "timed_out"),
        }
    }
}

impl From<&PositionError> for FallbackReason {
    fn from(err: &PositionError) -> Self {
        match err {
            PositionError::PermissionDenied => FallbackReason::PermissionDenied,
            PositionError::Unsupported => FallbackReason::Unsupported,
            PositionError::Unavailable(_) | PositionError::Http(_) => FallbackReason::Unavailable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationOutcome {
    Live,
    Fallback(FallbackReason),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedLocation {
    pub coordinate: Coordinate,
    /// Telemetry only; do not branch on it.
    pub outcome: LocationOutcome,
}

pub struct LocationResolver<S> {
    source: S,
    fallback: Coordinate,
}

impl<S: PositionSource> LocationResolver<S> {
    #[must_use]
    pub fn new(source: S, fallback: Coordinate) -> Self {
        Self { source, fallback }
    }

    /// Resolves the search origin. Always yields a coordinate.
    pub async fn resolve(&self, timeout: Duration) -> Coordinate {
        self.resolve_with_outcome(timeout).await.coordinate
    }

    /// Like [`LocationResolver::resolve`], also reporting which path was taken.
    pub async fn resolve_with_outcome(&self, timeout: Duration) -> ResolvedLocation {
        let reason = match tokio::time::timeout(timeout, self.source.current_position()).await {
            Ok(Ok(coordinate)) => {
                tracing::debug!(origin = %coordinate, "resolved live position");
                return ResolvedLocation {
                    coordinate,
                    outcome: LocationOutcome::Live,
                };
            }
            Ok(Err(err)) => {
                tracing::debug!(error = %err, "position source failed");
                FallbackReason::from(&err)
            }
            Err(_elapsed) => FallbackReason::TimedOut,
        };

        tracing::info!(
            reason = %reason,
            fallback = %self.fallback,
            "live position unavailable; using fallback coordinate"
        );
        ResolvedLocation {
            coordinate: self.fallback,
            outcome: LocationOutcome::Fallback(reason),
        }
    }
}
