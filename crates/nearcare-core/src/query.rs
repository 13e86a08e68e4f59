//! Provider-agnostic search queries.

use std::collections::BTreeSet;

use crate::facility::FacilityKind;
use crate::geo::Coordinate;
use crate::CoreError;

pub const DEFAULT_RADIUS_METERS: u32 = 5_000;

/// What to look for and where. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    center: Coordinate,
    radius_meters: u32,
    kinds: BTreeSet<FacilityKind>,
}

impl SearchQuery {
    /// Starts a builder centred on `center` with the default radius and all
    /// facility kinds.
    #[must_use]
    pub fn builder(center: Coordinate) -> SearchQueryBuilder {
        SearchQueryBuilder {
            center,
            radius_meters: DEFAULT_RADIUS_METERS,
            kinds: FacilityKind::ALL.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn center(&self) -> Coordinate {
        self.center
    }

    #[must_use]
    pub fn radius_meters(&self) -> u32 {
        self.radius_meters
    }

    /// Requested kinds in stable (declaration) order.
    #[must_use]
    pub fn kinds(&self) -> &BTreeSet<FacilityKind> {
        &self.kinds
    }
}

#[derive(Debug, Clone)]
pub struct SearchQueryBuilder {
    center: Coordinate,
    radius_meters: u32,
    kinds: BTreeSet<FacilityKind>,
}

impl SearchQueryBuilder {
    #[must_use]
    pub fn radius_meters(mut self, radius_meters: u32) -> Self {
        self.radius_meters = radius_meters;
        self
    }

    /// Replaces the requested kinds.
    #[must_use]
    pub fn kinds<I>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = FacilityKind>,
    {
        self.kinds = kinds.into_iter().collect();
        self
    }

    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRadius`] for a zero radius and
    /// [`CoreError::NoFacilityKinds`] when no kinds were requested.
    pub fn build(self) -> Result<SearchQuery, CoreError> {
        if self.radius_meters == 0 {
            return Err(CoreError::InvalidRadius);
        }
        if self.kinds.is_empty() {
            return Err(CoreError::NoFacilityKinds);
        }
        Ok(SearchQuery {
            center: self.center,
            radius_meters: self.radius_meters,
            kinds: self.kinds,
        })
    }
}
