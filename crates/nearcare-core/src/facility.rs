//! Canonical facility records produced by normalization and ranking.

use serde::{Deserialize, Serialize, Serializer};

use crate::geo::Coordinate;

/// Placeholder address used when upstream data carries no address tags.
pub const UNKNOWN_ADDRESS: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacilityKind {
    Hospital,
    Clinic,
}

impl FacilityKind {
    pub const ALL: [FacilityKind; 2] = [FacilityKind::Hospital, FacilityKind::Clinic];

    /// The OpenStreetMap tag value for this kind.
    #[must_use]
    pub fn as_tag(self) -> &'static str {
        match self {
            FacilityKind::Hospital => "hospital",
            FacilityKind::Clinic => "clinic",
        }
    }

    /// Maps an upstream tag value back to a kind. Unknown values yield `None`.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "hospital" => Some(FacilityKind::Hospital),
            "clinic" => Some(FacilityKind::Clinic),
            _ => None,
        }
    }
}

impl std::fmt::Display for FacilityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// A health facility with a guaranteed name and location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Facility {
    /// Provider-scoped identifier such as `node/123`. Not globally unique.
    pub id: String,
    pub name: String,
    pub coordinate: Coordinate,
    pub kind: FacilityKind,
    /// Postal address, or [`UNKNOWN_ADDRESS`].
    pub address: String,
    pub phone: Option<String>,
}

/// A [`Facility`] with its distance from one search's origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedFacility {
    #[serde(flatten)]
    pub facility: Facility,
    /// Full-precision distance; serialized rounded to two decimals.
    #[serde(serialize_with = "serialize_rounded_km")]
    pub distance_km: f64,
}

impl RankedFacility {
    /// Distance rounded to two decimal places for display.
    #[must_use]
    pub fn rounded_distance_km(&self) -> f64 {
        round_km(self.distance_km)
    }
}

fn round_km(km: f64) -> f64 {
    (km * 100.0).round() / 100.0
}

// serde's `serialize_with` hands the field by reference.
#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_rounded_km<S: Serializer>(km: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_km(*km))
}
