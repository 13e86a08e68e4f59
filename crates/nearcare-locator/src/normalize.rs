//! Maps raw Overpass elements into canonical [`Facility`] records.
//!
//! Elements without a name, without a resolvable location, or with a kind
//! other than hospital/clinic are dropped. Nothing is synthesized.

use std::collections::HashMap;

use nearcare_core::{Coordinate, Facility, FacilityKind, UNKNOWN_ADDRESS};
use serde::Deserialize;

use crate::overpass::{RawFacilityRecord, RawResponse};

/// Normalizes every element of a provider response. Never fails: a response
/// with no usable elements yields an empty `Vec`.
#[must_use]
pub fn normalize(raw: &RawResponse) -> Vec<Facility> {
    let elements = raw.elements();
    let facilities: Vec<Facility> = elements
        .iter()
        .filter_map(|element| match RawFacilityRecord::deserialize(element) {
            Ok(record) => normalize_record(&record),
            Err(e) => {
                tracing::debug!(error = %e, "skipping element with unexpected shape");
                None
            }
        })
        .collect();

    tracing::debug!(
        served_by = %raw.served_by,
        elements = elements.len(),
        kept = facilities.len(),
        "normalized provider response"
    );
    facilities
}

/// Converts one record, or returns `None` if it fails the facility invariants.
#[must_use]
pub fn normalize_record(record: &RawFacilityRecord) -> Option<Facility> {
    let name = tag(&record.tags, "name")?;
    let coordinate = resolve_coordinate(record)?;
    let kind = resolve_kind(&record.tags)?;

    Some(Facility {
        id: format!("{}/{}", record.element_type, record.id),
        name: name.to_string(),
        coordinate,
        kind,
        address: compose_address(&record.tags),
        phone: tag(&record.tags, "phone")
            .or_else(|| tag(&record.tags, "contact:phone"))
            .map(str::to_string),
    })
}

/// Direct point first, then the shape center. Out-of-range values count as
/// absent.
fn resolve_coordinate(record: &RawFacilityRecord) -> Option<Coordinate> {
    let direct = match (record.lat, record.lon) {
        (Some(lat), Some(lon)) => Coordinate::new(lat, lon).ok(),
        _ => None,
    };
    direct.or_else(|| {
        record
            .center
            .and_then(|center| Coordinate::new(center.lat, center.lon).ok())
    })
}

fn resolve_kind(tags: &HashMap<String, String>) -> Option<FacilityKind> {
    tag(tags, "amenity")
        .and_then(FacilityKind::from_tag)
        .or_else(|| tag(tags, "healthcare").and_then(FacilityKind::from_tag))
}

fn compose_address(tags: &HashMap<String, String>) -> String {
    if let Some(full) = tag(tags, "addr:full") {
        return full.to_string();
    }

    let street_line = match (tag(tags, "addr:housenumber"), tag(tags, "addr:street")) {
        (Some(number), Some(street)) => Some(format!("{number} {street}")),
        (None, Some(street)) => Some(street.to_string()),
        _ => None,
    };

    let parts: Vec<String> = [
        street_line,
        tag(tags, "addr:city").map(str::to_string),
        tag(tags, "addr:postcode").map(str::to_string),
    ]
    .into_iter()
    .flatten()
    .collect();

    if parts.is_empty() {
        UNKNOWN_ADDRESS.to_string()
    } else {
        parts.join(", ")
    }
}

/// Trimmed, non-empty tag value.
fn tag<'a>(tags: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    tags.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
