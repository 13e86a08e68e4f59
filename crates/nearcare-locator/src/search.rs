//! The caller-facing facility search.
//!
//! One call runs query build, gateway fetch, normalization and ranking in
//! sequence. Nothing is shared between calls except immutable settings and
//! the pooled HTTP client inside the gateway.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use nearcare_core::{
    AppConfig, Coordinate, FacilityKind, RankedFacility, SearchQuery, DEFAULT_RADIUS_METERS,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::error::SearchError;
use crate::gateway::ProviderGateway;
use crate::normalize::normalize;
use crate::rank::rank;

/// Either a ranked (possibly empty) list or a terminal error.
pub type SearchResult = Result<RankedFacilityList, SearchError>;

#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub radius_meters: u32,
    pub kinds: BTreeSet<FacilityKind>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            radius_meters: DEFAULT_RADIUS_METERS,
            kinds: FacilityKind::ALL.into_iter().collect(),
        }
    }
}

impl SearchSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            radius_meters: config.search_radius_meters,
            ..Self::default()
        }
    }
}

/// Result of one successful search, ordered nearest first.
#[derive(Debug, Clone, Serialize)]
pub struct RankedFacilityList {
    pub origin: Coordinate,
    pub facilities: Vec<RankedFacility>,
    /// Mirror that served the response.
    pub served_by: String,
    pub searched_at: DateTime<Utc>,
}

impl RankedFacilityList {
    /// `true` when the search succeeded but found nothing nearby. Distinct
    /// from [`SearchError::AllExhausted`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facilities.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.facilities.len()
    }
}

pub struct FacilitySearchService {
    gateway: ProviderGateway,
    settings: SearchSettings,
}

impl FacilitySearchService {
    #[must_use]
    pub fn new(gateway: ProviderGateway, settings: SearchSettings) -> Self {
        Self { gateway, settings }
    }

    /// Finds facilities near `origin`, nearest first.
    ///
    /// # Errors
    ///
    /// - [`SearchError::AllExhausted`] when every provider endpoint failed.
    /// - [`SearchError::Cancelled`] when `cancel` fired before completion.
    /// - [`SearchError::NoEndpoints`] when the gateway has no endpoints.
    /// - [`SearchError::InvalidQuery`] when the settings cannot form a query
    ///   (zero radius or no kinds).
    pub async fn search(&self, origin: Coordinate, cancel: &CancellationToken) -> SearchResult {
        let search_id = Uuid::new_v4();
        let span = tracing::info_span!("facility_search", %search_id, origin = %origin);
        self.run(origin, cancel).instrument(span).await
    }

    async fn run(&self, origin: Coordinate, cancel: &CancellationToken) -> SearchResult {
        let query = SearchQuery::builder(origin)
            .radius_meters(self.settings.radius_meters)
            .kinds(self.settings.kinds.iter().copied())
            .build()?;

        let raw = match self.gateway.fetch(&query, cancel).await {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(error = %err, "facility search failed");
                return Err(err.into());
            }
        };

        let facilities = rank(origin, normalize(&raw));
        if facilities.is_empty() {
            tracing::info!(served_by = %raw.served_by, "no facilities found near origin");
        } else {
            tracing::info!(
                served_by = %raw.served_by,
                count = facilities.len(),
                nearest_km = facilities[0].rounded_distance_km(),
                "facility search complete"
            );
        }

        Ok(RankedFacilityList {
            origin,
            facilities,
            served_by: raw.served_by,
            searched_at: Utc::now(),
        })
    }
}
