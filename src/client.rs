//! HYDWS Data API client.
//!
//! Blocking HTTP access to a HYDWS deployment: borehole listings, scoped
//! metadata fetches, and time-windowed hydraulics retrieval. Every
//! operation that accepts a borehole or section reference takes either the
//! `publicid` or the `name`; references are resolved against a freshly
//! fetched listing on every call, trading round trips for staleness-free
//! resolution.
//!
//! Endpoints:
//!   GET {base}/boreholes
//!   GET {base}/boreholes/{id}
//!   GET {base}/boreholes/{id}/sections/{id}/hydraulics
//! with `starttime`/`endtime` (ISO-8601) and `level` query parameters.

use std::time::Duration;

use chrono::NaiveDateTime;
use log::{debug, info};
use serde_json::Value;

use crate::error::{HydwsError, Result};
use crate::hierarchy::{Borehole, Section};
use crate::model::{EntityKind, QUERY_TIME_FORMAT};
use crate::table::HydraulicsTable;

// ---------------------------------------------------------------------------
// URL construction
// ---------------------------------------------------------------------------

/// URL of the full borehole listing.
pub fn boreholes_url(base_url: &str) -> String {
    format!("{}/boreholes", base_url.trim_end_matches('/'))
}

/// URL of a single borehole document.
pub fn borehole_url(base_url: &str, borehole_id: &str) -> String {
    format!("{}/boreholes/{}", base_url.trim_end_matches('/'), borehole_id)
}

/// URL of one section's hydraulics array.
pub fn section_hydraulics_url(base_url: &str, borehole_id: &str, section_id: &str) -> String {
    format!(
        "{}/boreholes/{}/sections/{}/hydraulics",
        base_url.trim_end_matches('/'),
        borehole_id,
        section_id
    )
}

/// `starttime`/`endtime` query parameters for the half-open window
/// `[start, end)`.
pub fn time_window_params(start: NaiveDateTime, end: NaiveDateTime) -> [(String, String); 2] {
    [
        (
            "starttime".to_string(),
            start.format(QUERY_TIME_FORMAT).to_string(),
        ),
        (
            "endtime".to_string(),
            end.format(QUERY_TIME_FORMAT).to_string(),
        ),
    ]
}

/// Caller-error check performed before any network traffic.
fn validate_time_window(start: NaiveDateTime, end: NaiveDateTime) -> Result<()> {
    if start > end {
        return Err(HydwsError::InvalidTimeRange { start, end });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Reference resolution
// ---------------------------------------------------------------------------

/// Resolve a name-or-ID reference against a `(name, publicid)` listing.
///
/// Exact match against publicids first, then against names; the first
/// match in listing order wins. Both missing is a `ReferenceNotFound`
/// carrying the literal input and the entity kind.
fn resolve_reference(
    listing: &[(String, String)],
    reference: &str,
    kind: EntityKind,
) -> Result<String> {
    if let Some((_, id)) = listing.iter().find(|(_, id)| id == reference) {
        return Ok(id.clone());
    }
    if let Some((_, id)) = listing.iter().find(|(name, _)| name == reference) {
        return Ok(id.clone());
    }
    Err(HydwsError::ReferenceNotFound {
        kind,
        reference: reference.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Hydraulics return shape
// ---------------------------------------------------------------------------

/// Return format of [`HydwsClient::get_section_hydraulics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydraulicsFormat {
    /// The raw JSON record array, as returned by the service.
    Raw,
    /// An already-parsed [`HydraulicsTable`].
    Table,
}

/// A section's hydraulics in the requested format.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionHydraulics {
    Raw(Vec<Value>),
    Table(HydraulicsTable),
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Blocking client for one HYDWS deployment.
///
/// Holds no state across calls beyond the base URL and the underlying
/// transport; cancellation and timeout semantics are delegated to the
/// transport entirely.
pub struct HydwsClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl HydwsClient {
    /// Create a client for the service at `base_url` (with or without a
    /// trailing slash).
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::blocking::Client::builder().build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// As [`HydwsClient::new`], with a request timeout after which
    /// contacting the service is aborted.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -----------------------------------------------------------------------
    // Listings
    // -----------------------------------------------------------------------

    /// All boreholes known to the service, with full metadata and section
    /// metadata (no hydraulics), in service order.
    pub fn list_boreholes(&self) -> Result<Vec<Borehole>> {
        let listing = self.get_json(&boreholes_url(&self.base_url), &[])?;
        let Value::Array(values) = listing else {
            return Err(HydwsError::Schema(
                "borehole listing is not a JSON array".into(),
            ));
        };
        values.into_iter().map(Borehole::from_value).collect()
    }

    /// `(name, publicid)` pairs of all boreholes, in service order.
    pub fn list_borehole_names(&self) -> Result<Vec<(String, String)>> {
        Ok(self
            .list_boreholes()?
            .iter()
            .map(|b| (b.name().to_string(), b.publicid().to_string()))
            .collect())
    }

    /// Section metadata of one borehole (name or ID).
    pub fn list_sections(&self, borehole_ref: &str) -> Result<Vec<Section>> {
        Ok(self.get_borehole_metadata(borehole_ref)?.into_sections())
    }

    /// `(name, publicid)` pairs of one borehole's sections, in service
    /// order.
    pub fn list_section_names(&self, borehole_ref: &str) -> Result<Vec<(String, String)>> {
        Ok(self.get_borehole_metadata(borehole_ref)?.section_names())
    }

    // -----------------------------------------------------------------------
    // Metadata fetches
    // -----------------------------------------------------------------------

    /// Metadata of one borehole (name or ID), including its sections'
    /// metadata but no hydraulics.
    pub fn get_borehole_metadata(&self, borehole_ref: &str) -> Result<Borehole> {
        let borehole_id = self.resolve_borehole(borehole_ref)?;
        self.fetch_borehole_by_id(&borehole_id)
    }

    /// Metadata of one section, both references independently resolved by
    /// name or ID.
    pub fn get_section_metadata(&self, borehole_ref: &str, section_ref: &str) -> Result<Section> {
        let borehole = self.get_borehole_metadata(borehole_ref)?;
        Ok(borehole.section(section_ref)?.clone())
    }

    // -----------------------------------------------------------------------
    // Time-windowed fetches
    // -----------------------------------------------------------------------

    /// Full nested borehole JSON (metadata, sections, hydraulics) for the
    /// half-open window `[start, end)`.
    pub fn get_borehole(
        &self,
        borehole_ref: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Value> {
        validate_time_window(start, end)?;
        let borehole_id = self.resolve_borehole(borehole_ref)?;

        let [starttime, endtime] = time_window_params(start, end);
        let params = [
            starttime,
            endtime,
            ("level".to_string(), "hydraulic".to_string()),
        ];
        self.get_json(&borehole_url(&self.base_url, &borehole_id), &params)
    }

    /// Borehole-shaped JSON containing exactly one section with its
    /// hydraulics for `[start, end)`.
    ///
    /// Composed from two requests like the service's own clients do: the
    /// hydraulics array from the section endpoint, the metadata from the
    /// `level=section` borehole document.
    pub fn get_section(
        &self,
        borehole_ref: &str,
        section_ref: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Value> {
        validate_time_window(start, end)?;
        let borehole_id = self.resolve_borehole(borehole_ref)?;
        let section_id = self.resolve_section(&borehole_id, section_ref)?;

        let hydraulics = self.fetch_hydraulics_records(&borehole_id, &section_id, start, end)?;

        let params = [("level".to_string(), "section".to_string())];
        let document = self.get_json(&borehole_url(&self.base_url, &borehole_id), &params)?;

        attach_section_hydraulics(document, &section_id, hydraulics)
    }

    /// One section's hydraulics for `[start, end)`, either raw or already
    /// parsed depending on `format`.
    pub fn get_section_hydraulics(
        &self,
        borehole_ref: &str,
        section_ref: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        format: HydraulicsFormat,
    ) -> Result<SectionHydraulics> {
        validate_time_window(start, end)?;
        let borehole_id = self.resolve_borehole(borehole_ref)?;
        let section_id = self.resolve_section(&borehole_id, section_ref)?;

        let records = self.fetch_hydraulics_records(&borehole_id, &section_id, start, end)?;
        match format {
            HydraulicsFormat::Raw => Ok(SectionHydraulics::Raw(records)),
            HydraulicsFormat::Table => Ok(SectionHydraulics::Table(
                HydraulicsTable::from_records(&records)?,
            )),
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Resolve a borehole reference against a freshly fetched listing.
    fn resolve_borehole(&self, reference: &str) -> Result<String> {
        let listing = self.list_borehole_names()?;
        resolve_reference(&listing, reference, EntityKind::Borehole)
    }

    /// Resolve a section reference against the borehole's current section
    /// listing, including the borehole-qualified local-name convention.
    fn resolve_section(&self, borehole_id: &str, reference: &str) -> Result<String> {
        let borehole = self.fetch_borehole_by_id(borehole_id)?;
        Ok(borehole.section(reference)?.publicid().to_string())
    }

    fn fetch_borehole_by_id(&self, borehole_id: &str) -> Result<Borehole> {
        let document = self.get_json(&borehole_url(&self.base_url, borehole_id), &[])?;
        Borehole::from_value(document)
    }

    fn fetch_hydraulics_records(
        &self,
        borehole_id: &str,
        section_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Value>> {
        info!(
            "requesting hydraulics (url={}, borehole={}, section={}, window=[{}, {}))",
            self.base_url, borehole_id, section_id, start, end
        );

        let url = section_hydraulics_url(&self.base_url, borehole_id, section_id);
        let response = self.get_json(&url, &time_window_params(start, end))?;
        match response {
            Value::Array(records) => Ok(records),
            // an empty window comes back as no content on some deployments
            Value::Null => Ok(Vec::new()),
            other => Err(HydwsError::Schema(format!(
                "hydraulics response is not an array: {other}"
            ))),
        }
    }

    /// One GET request: transport errors surface as `Transport`, non-2xx
    /// as `Service` with status and body, undecodable bodies as `Decode`.
    fn get_json(&self, url: &str, params: &[(String, String)]) -> Result<Value> {
        debug!("GET {url} params={params:?}");

        let response = self
            .http
            .get(url)
            .query(params)
            .header("Accept", "application/json")
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(HydwsError::Service {
                status: status.as_u16(),
                body,
            });
        }
        if body.is_empty() {
            // 204-style empty success
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

/// Reduce a `level=section` borehole document to the one requested section
/// and attach the separately fetched hydraulics to it.
fn attach_section_hydraulics(
    document: Value,
    section_id: &str,
    hydraulics: Vec<Value>,
) -> Result<Value> {
    let Value::Object(mut object) = document else {
        return Err(HydwsError::Schema(
            "borehole document is not a JSON object".into(),
        ));
    };

    let Some(Value::Array(sections)) = object.remove("sections") else {
        return Err(HydwsError::Schema(
            "borehole document has no 'sections' array".into(),
        ));
    };

    let mut section = sections
        .into_iter()
        .find(|s| s.get("publicid").and_then(Value::as_str) == Some(section_id))
        .ok_or_else(|| HydwsError::ReferenceNotFound {
            kind: EntityKind::Section,
            reference: section_id.to_string(),
        })?;

    if let Some(section_object) = section.as_object_mut() {
        section_object.insert("hydraulics".to_string(), Value::Array(hydraulics));
    }
    object.insert("sections".to_string(), Value::Array(vec![section]));

    Ok(Value::Object(object))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::parse_timestamp;
    use serde_json::json;

    fn listing() -> Vec<(String, String)> {
        vec![
            ("A/sec_1".to_string(), "id1".to_string()),
            ("A/sec_2".to_string(), "id2".to_string()),
        ]
    }

    #[test]
    fn test_boreholes_url_trims_trailing_slash() {
        assert_eq!(
            boreholes_url("https://hydws.example.org/v1/"),
            "https://hydws.example.org/v1/boreholes"
        );
        assert_eq!(
            boreholes_url("https://hydws.example.org/v1"),
            "https://hydws.example.org/v1/boreholes"
        );
    }

    #[test]
    fn test_borehole_and_hydraulics_urls() {
        assert_eq!(
            borehole_url("https://h.example.org", "bh1"),
            "https://h.example.org/boreholes/bh1"
        );
        assert_eq!(
            section_hydraulics_url("https://h.example.org", "bh1", "s1"),
            "https://h.example.org/boreholes/bh1/sections/s1/hydraulics"
        );
    }

    #[test]
    fn test_time_window_params_format() {
        let start = parse_timestamp("2024-04-06T00:00:00").unwrap();
        let end = parse_timestamp("2024-04-07T12:30:00").unwrap();
        let [starttime, endtime] = time_window_params(start, end);
        assert_eq!(starttime, ("starttime".to_string(), "2024-04-06T00:00:00".to_string()));
        assert_eq!(endtime, ("endtime".to_string(), "2024-04-07T12:30:00".to_string()));
    }

    #[test]
    fn test_validate_time_window_rejects_inverted_range() {
        let start = parse_timestamp("2024-04-07T00:00:00").unwrap();
        let end = parse_timestamp("2024-04-06T00:00:00").unwrap();
        let err = validate_time_window(start, end).unwrap_err();
        assert!(matches!(err, HydwsError::InvalidTimeRange { .. }));
        // equal endpoints are a valid (empty) window
        assert!(validate_time_window(end, end).is_ok());
    }

    #[test]
    fn test_resolve_reference_by_id() {
        let id = resolve_reference(&listing(), "id2", EntityKind::Section).unwrap();
        assert_eq!(id, "id2");
    }

    #[test]
    fn test_resolve_reference_by_name() {
        let id = resolve_reference(&listing(), "A/sec_1", EntityKind::Section).unwrap();
        assert_eq!(id, "id1");
    }

    #[test]
    fn test_resolve_reference_id_takes_precedence() {
        // a pathological listing where one entry's name equals another's id
        let listing = vec![
            ("id2".to_string(), "id1".to_string()),
            ("A/sec_2".to_string(), "id2".to_string()),
        ];
        let id = resolve_reference(&listing, "id2", EntityKind::Section).unwrap();
        assert_eq!(id, "id2");
    }

    #[test]
    fn test_resolve_reference_not_found_names_input_and_kind() {
        let err = resolve_reference(&listing(), "B", EntityKind::Borehole).unwrap_err();
        let message = err.to_string();
        match err {
            HydwsError::ReferenceNotFound { kind, reference } => {
                assert_eq!(kind, EntityKind::Borehole);
                assert_eq!(reference, "B");
            }
            other => panic!("expected ReferenceNotFound, got {other}"),
        }
        assert!(message.contains("borehole"));
        assert!(message.contains("'B'"));
    }

    #[test]
    fn test_attach_section_hydraulics_filters_to_one_section() {
        let document = json!({
            "publicid": "bh1",
            "name": "A",
            "sections": [
                {"publicid": "id1", "name": "A/sec_1"},
                {"publicid": "id2", "name": "A/sec_2"}
            ]
        });
        let hydraulics = vec![json!({"datetime": "2024-04-06T01:00:00", "topflow": 0.2})];

        let combined = attach_section_hydraulics(document, "id2", hydraulics).unwrap();
        let sections = combined["sections"].as_array().unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0]["publicid"], json!("id2"));
        assert_eq!(sections[0]["hydraulics"][0]["topflow"], json!(0.2));
    }

    #[test]
    fn test_attach_section_hydraulics_unknown_section() {
        let document = json!({
            "publicid": "bh1",
            "name": "A",
            "sections": [{"publicid": "id1", "name": "A/sec_1"}]
        });
        let err = attach_section_hydraulics(document, "id9", Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            HydwsError::ReferenceNotFound {
                kind: EntityKind::Section,
                ..
            }
        ));
    }

    #[test]
    fn test_time_scoped_fetches_reject_inverted_range_before_any_request() {
        // base URL points nowhere; an InvalidTimeRange (not Transport)
        // error proves the check runs before the network is touched
        let client = HydwsClient::new("http://127.0.0.1:1/hydws/v1").unwrap();
        let start = parse_timestamp("2024-04-07T00:00:00").unwrap();
        let end = parse_timestamp("2024-04-06T00:00:00").unwrap();

        let err = client.get_borehole("A", start, end).unwrap_err();
        assert!(matches!(err, HydwsError::InvalidTimeRange { .. }));

        let err = client.get_section("A", "A/sec_1", start, end).unwrap_err();
        assert!(matches!(err, HydwsError::InvalidTimeRange { .. }));

        let err = client
            .get_section_hydraulics("A", "A/sec_1", start, end, HydraulicsFormat::Table)
            .unwrap_err();
        assert!(matches!(err, HydwsError::InvalidTimeRange { .. }));
    }
}
