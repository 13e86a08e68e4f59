use nearcare_core::{Coordinate, Facility, RankedFacility};

/// Attaches the distance from `origin` to each facility and sorts ascending.
///
/// Distances compare at full precision; exact ties fall back to ascending
/// lexical `id` so output is deterministic. No radius filtering happens here.
#[must_use]
pub fn rank(origin: Coordinate, facilities: Vec<Facility>) -> Vec<RankedFacility> {
    let mut ranked: Vec<RankedFacility> = facilities
        .into_iter()
        .map(|facility| RankedFacility {
            distance_km: origin.distance_km(&facility.coordinate),
            facility,
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.distance_km
            .total_cmp(&b.distance_km)
            .then_with(|| a.facility.id.cmp(&b.facility.id))
    });
    ranked
}
