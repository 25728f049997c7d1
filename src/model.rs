//! Core data types for the HYDWS client.
//!
//! This module defines the shared domain model imported by all other
//! modules: the typed metadata structs for boreholes and sections, the
//! documented hydraulic channel names, and the timestamp formats used on
//! the wire.
//!
//! Metadata is deliberately pass-through: the service is trusted for data
//! content, so recognized fields are typed but unvalidated, and anything
//! the service adds in the future lands verbatim in the `extra` map.
//! Only `publicid` and `name` are hard requirements.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// ---------------------------------------------------------------------------
// Timestamp formats
// ---------------------------------------------------------------------------

/// Format of hydraulic sample timestamps, both parsed and emitted.
/// `%.f` keeps fractional seconds reversible: absent in, absent out.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Format of `starttime`/`endtime` query parameters.
pub const QUERY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parse a hydraulic sample timestamp.
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
}

/// Format a hydraulic sample timestamp for serialization.
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

// ---------------------------------------------------------------------------
// Hydraulic channels
// ---------------------------------------------------------------------------

/// Channel names defined by the HYDWS schema.
///
/// The channel set is open: a section's hydraulics may carry any subset of
/// these, and unknown channels are accepted as-is. This list documents the
/// names the service is known to emit.
pub const HYDRAULIC_CHANNELS: &[&str] = &[
    "topflow",
    "toppressure",
    "toptemperature",
    "bottomflow",
    "bottompressure",
    "bottomtemperature",
    "fluiddensity",
    "fluidviscosity",
    "fluidph",
];

/// Returns `true` if `name` is one of the documented hydraulic channels.
pub fn is_known_channel(name: &str) -> bool {
    HYDRAULIC_CHANNELS.contains(&name)
}

// ---------------------------------------------------------------------------
// Entity kinds
// ---------------------------------------------------------------------------

/// Which kind of entity a reference was resolved against. Carried in
/// `ReferenceNotFound` errors for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Borehole,
    Section,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Borehole => write!(f, "borehole"),
            EntityKind::Section => write!(f, "section"),
        }
    }
}

// ---------------------------------------------------------------------------
// Metadata types
// ---------------------------------------------------------------------------

/// Scalar metadata of a borehole, excluding its sections.
///
/// `publicid` and `name` must be present in the source document; all other
/// fields are optional and unvalidated. Unrecognized fields survive a
/// parse/serialize round trip through `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoreholeMetadata {
    pub publicid: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedrockaltitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measureddepth: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creationtime: Option<NaiveDateTime>,
    /// Verbatim pass-through of fields this client does not recognize.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Scalar metadata of a borehole section, excluding its hydraulics.
///
/// Section names are conventionally scoped within the parent borehole as
/// `"<boreholeName>/<sectionLocalName>"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionMetadata {
    pub publicid: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starttime: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endtime: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toplongitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toplatitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topaltitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottomlongitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottomlatitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottomaltitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topmeasureddepth: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottommeasureddepth: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holediameter: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub casingdiameter: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topclosed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottomclosed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sectiontype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub casingtype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Verbatim pass-through of fields this client does not recognize.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_timestamp_round_trip_without_fraction() {
        let ts = parse_timestamp("2024-04-06T01:00:00").unwrap();
        assert_eq!(format_timestamp(ts), "2024-04-06T01:00:00");
    }

    #[test]
    fn test_timestamp_round_trip_with_fraction() {
        let ts = parse_timestamp("2024-04-06T01:00:00.250").unwrap();
        assert_eq!(format_timestamp(ts), "2024-04-06T01:00:00.250");
    }

    #[test]
    fn test_timestamp_rejects_garbage() {
        assert!(parse_timestamp("06.04.2024 01:00").is_err());
    }

    #[test]
    fn test_known_channels() {
        assert!(is_known_channel("topflow"));
        assert!(is_known_channel("fluidph"));
        assert!(!is_known_channel("datetime"));
        assert!(!is_known_channel("sidepressure"));
    }

    #[test]
    fn test_borehole_metadata_requires_publicid_and_name() {
        let missing_name = json!({"publicid": "b1"});
        assert!(serde_json::from_value::<BoreholeMetadata>(missing_name).is_err());

        let missing_id = json!({"name": "A"});
        assert!(serde_json::from_value::<BoreholeMetadata>(missing_id).is_err());
    }

    #[test]
    fn test_unrecognized_fields_pass_through() {
        let doc = json!({
            "publicid": "b1",
            "name": "A",
            "operator": "XYZ Drilling",
            "depthunit": "m"
        });
        let meta: BoreholeMetadata = serde_json::from_value(doc).unwrap();
        assert_eq!(meta.extra["operator"], json!("XYZ Drilling"));
        assert_eq!(meta.extra["depthunit"], json!("m"));

        let back = serde_json::to_value(&meta).unwrap();
        assert_eq!(back["operator"], json!("XYZ Drilling"));
        // absent optionals must not reappear as nulls
        assert!(back.get("longitude").is_none());
    }

    #[test]
    fn test_section_metadata_parses_time_bounds() {
        let doc = json!({
            "publicid": "s1",
            "name": "A/sec_1",
            "starttime": "2024-01-01T00:00:00",
            "topclosed": false
        });
        let meta: SectionMetadata = serde_json::from_value(doc).unwrap();
        assert_eq!(
            meta.starttime.unwrap(),
            parse_timestamp("2024-01-01T00:00:00").unwrap()
        );
        assert_eq!(meta.topclosed, Some(false));
        assert!(meta.endtime.is_none());
    }
}
