//! Borehole → Section object graph.
//!
//! Builds navigable objects from HYDWS-shaped JSON (service response, local
//! file, or in-memory value) and regenerates equivalent JSON after edits.
//! Sections are addressable two ways — by `publicid` (primary) and by
//! `name` (the `nloc` secondary index) — and both paths borrow the same
//! owned `Section`, so a hydraulics replacement is visible through either.
//!
//! Construction is the only schema gate: `publicid` and `name` must be
//! present at both levels; every other field passes through untouched.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::debug;
use serde_json::{Map, Value};

use crate::error::{HydwsError, Result};
use crate::model::{BoreholeMetadata, EntityKind, SectionMetadata};
use crate::table::HydraulicsTable;

// ---------------------------------------------------------------------------
// Section
// ---------------------------------------------------------------------------

/// One instrumented depth interval of a borehole: scalar metadata plus its
/// hydraulic series.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    metadata: SectionMetadata,
    hydraulics: HydraulicsTable,
}

impl Section {
    /// Build a standalone section from a section-shaped JSON object.
    ///
    /// The `hydraulics` key is split off and parsed into the table; a
    /// missing or empty array yields the canonical empty table. Everything
    /// else becomes metadata.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut object) = value else {
            return Err(HydwsError::Schema(
                "section document is not a JSON object".into(),
            ));
        };

        let hydraulics = match object.remove("hydraulics") {
            None | Some(Value::Null) => HydraulicsTable::new(),
            Some(Value::Array(records)) => HydraulicsTable::from_records(&records)?,
            Some(other) => {
                return Err(HydwsError::Schema(format!(
                    "'hydraulics' is not an array: {other}"
                )));
            }
        };

        let metadata: SectionMetadata = serde_json::from_value(Value::Object(object))
            .map_err(|e| HydwsError::Schema(format!("section metadata: {e}")))?;

        Ok(Section {
            metadata,
            hydraulics,
        })
    }

    pub fn publicid(&self) -> &str {
        &self.metadata.publicid
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Scalar metadata; the `hydraulics` series is not part of it.
    pub fn metadata(&self) -> &SectionMetadata {
        &self.metadata
    }

    /// The parsed hydraulic series.
    pub fn hydraulics(&self) -> &HydraulicsTable {
        &self.hydraulics
    }

    /// Replace this section's hydraulic series entirely. Metadata is
    /// untouched.
    pub fn set_hydraulics(&mut self, table: HydraulicsTable) {
        self.hydraulics = table;
    }

    /// Regenerate the section-shaped JSON object, hydraulics included.
    pub fn to_value(&self) -> Result<Value> {
        let mut object = into_object(serde_json::to_value(&self.metadata)?)?;
        object.insert(
            "hydraulics".to_string(),
            Value::Array(self.hydraulics.to_records()),
        );
        Ok(Value::Object(object))
    }
}

// ---------------------------------------------------------------------------
// Borehole
// ---------------------------------------------------------------------------

/// A borehole: scalar metadata plus its ordered sections, with dual-key
/// section lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Borehole {
    metadata: BoreholeMetadata,
    sections: Vec<Section>,
    by_id: HashMap<String, usize>,
    nloc: HashMap<String, usize>,
}

impl Borehole {
    /// Build a borehole from a borehole-shaped JSON object.
    ///
    /// A missing `sections` key (metadata-only fetch) is valid and yields a
    /// borehole with no sections. Duplicate section names keep the first
    /// occurrence in the name index, in service order.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut object) = value else {
            return Err(HydwsError::Schema(
                "borehole document is not a JSON object".into(),
            ));
        };

        let sections = match object.remove("sections") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(values)) => values
                .into_iter()
                .map(Section::from_value)
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(HydwsError::Schema(format!(
                    "'sections' is not an array: {other}"
                )));
            }
        };

        let metadata: BoreholeMetadata = serde_json::from_value(Value::Object(object))
            .map_err(|e| HydwsError::Schema(format!("borehole metadata: {e}")))?;

        let mut by_id = HashMap::with_capacity(sections.len());
        let mut nloc = HashMap::with_capacity(sections.len());
        for (position, section) in sections.iter().enumerate() {
            by_id
                .entry(section.publicid().to_string())
                .or_insert(position);
            nloc.entry(section.name().to_string()).or_insert(position);
        }

        debug!(
            "parsed borehole '{}' with {} section(s)",
            metadata.name,
            sections.len()
        );

        Ok(Borehole {
            metadata,
            sections,
            by_id,
            nloc,
        })
    }

    /// Build a borehole from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(text)?)
    }

    /// Build a borehole from a previously captured JSON payload on disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn publicid(&self) -> &str {
        &self.metadata.publicid
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Scalar metadata; the `sections` array is not part of it.
    pub fn metadata(&self) -> &BoreholeMetadata {
        &self.metadata
    }

    /// Sections in service order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Consume the borehole, keeping only its sections.
    pub fn into_sections(self) -> Vec<Section> {
        self.sections
    }

    /// `(name, publicid)` pairs of the sections, in service order.
    pub fn section_names(&self) -> Vec<(String, String)> {
        self.sections
            .iter()
            .map(|s| (s.name().to_string(), s.publicid().to_string()))
            .collect()
    }

    /// Look up a section by `publicid`.
    pub fn section_by_id(&self, publicid: &str) -> Option<&Section> {
        self.by_id.get(publicid).map(|&i| &self.sections[i])
    }

    /// Look up a section by `name` via the `nloc` index. Resolves to the
    /// same object as the `publicid` lookup.
    pub fn section_by_name(&self, name: &str) -> Option<&Section> {
        self.nloc.get(name).map(|&i| &self.sections[i])
    }

    /// Look up a section by `publicid` or `name`, in that order.
    ///
    /// Since section names are conventionally qualified as
    /// `"<boreholeName>/<localName>"`, a bare local name resolves too:
    /// `section("sec_1")` finds `"A/sec_1"` within borehole `A`.
    pub fn section(&self, reference: &str) -> Result<&Section> {
        self.section_position(reference).map(|i| &self.sections[i])
    }

    fn section_position(&self, reference: &str) -> Result<usize> {
        if let Some(&position) = self.by_id.get(reference) {
            return Ok(position);
        }
        if let Some(&position) = self.nloc.get(reference) {
            return Ok(position);
        }
        let qualified = format!("{}/{}", self.metadata.name, reference);
        if let Some(&position) = self.nloc.get(&qualified) {
            return Ok(position);
        }
        Err(HydwsError::ReferenceNotFound {
            kind: EntityKind::Section,
            reference: reference.to_string(),
        })
    }

    /// Replace the hydraulic series of the section identified by
    /// `reference` (publicid or name). Only that section is touched.
    pub fn set_hydraulics(&mut self, reference: &str, table: HydraulicsTable) -> Result<()> {
        let position = self.section_position(reference)?;
        self.sections[position].set_hydraulics(table);
        Ok(())
    }

    /// Regenerate the borehole-shaped JSON document, sections and
    /// hydraulics included. Re-parsing the result reproduces an equivalent
    /// borehole.
    pub fn to_value(&self) -> Result<Value> {
        let mut object = into_object(serde_json::to_value(&self.metadata)?)?;
        let sections = self
            .sections
            .iter()
            .map(Section::to_value)
            .collect::<Result<Vec<_>>>()?;
        object.insert("sections".to_string(), Value::Array(sections));
        Ok(Value::Object(object))
    }
}

fn into_object(value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(object) => Ok(object),
        other => Err(HydwsError::Schema(format!(
            "metadata did not serialize to an object: {other}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
