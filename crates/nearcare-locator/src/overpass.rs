//! Overpass API wire format: query text going out, element records coming back.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::time::Duration;

use nearcare_core::SearchQuery;
use serde::Deserialize;

/// Element classes requested for every facility kind. Ways and relations are
/// building or campus outlines and come back with a `center` instead of
/// `lat`/`lon`.
const ELEMENT_CLASSES: [&str; 3] = ["node", "way", "relation"];

/// OSM keys that classify a facility, in the order the normalizer reads them.
const KIND_KEYS: [&str; 2] = ["amenity", "healthcare"];

/// Serializes `query` into Overpass QL.
///
/// `server_timeout` is forwarded as the `[timeout:N]` setting so the mirror
/// gives up on its side no later than we do.
#[must_use]
pub fn build_overpass_query(query: &SearchQuery, server_timeout: Duration) -> String {
    let center = query.center();
    let around = format!(
        "(around:{},{},{})",
        query.radius_meters(),
        center.latitude(),
        center.longitude()
    );

    let mut ql = format!("[out:json][timeout:{}];\n(\n", server_timeout.as_secs().max(1));
    for kind in query.kinds() {
        for key in KIND_KEYS {
            for class in ELEMENT_CLASSES {
                let _ = writeln!(ql, "  {class}[\"{key}\"=\"{}\"]{around};", kind.as_tag());
            }
        }
    }
    ql.push_str(");\nout center;\n");
    ql
}

/// A successful provider payload. The gateway guarantees `body` carries an
/// `elements` array.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// URL of the mirror that answered.
    pub served_by: String,
    pub body: serde_json::Value,
}

impl RawResponse {
    #[must_use]
    pub fn elements(&self) -> &[serde_json::Value] {
        self.body
            .get("elements")
            .and_then(serde_json::Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// One upstream element before normalization.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFacilityRecord {
    #[serde(rename = "type")]
    pub element_type: String,
    pub id: u64,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub center: Option<RawCenter>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RawCenter {
    pub lat: f64,
    pub lon: f64,
}
