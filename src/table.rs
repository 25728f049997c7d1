//! Time-indexed hydraulics table.
//!
//! A `HydraulicsTable` holds one section's hydraulic series: a sorted,
//! unique timestamp index and one column per observed channel. Cells are
//! `Option<f64>` — a channel absent from a record is missing, never zero —
//! and missing cells serialize as field-absent, matching the service's own
//! convention.
//!
//! Invariants maintained by every mutation path:
//!   - the index is strictly increasing (sorted, no duplicates),
//!   - every column has exactly one cell per index entry,
//!   - column order is first-observed order.

use chrono::NaiveDateTime;
use log::warn;
use serde_json::{Map, Number, Value};

use crate::error::{HydwsError, Result};
use crate::model::{format_timestamp, is_known_channel, parse_timestamp};

// ---------------------------------------------------------------------------
// Table type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
struct Column {
    name: String,
    values: Vec<Option<f64>>,
}

/// A section's hydraulic series as a table: rows are timestamps, columns
/// are numeric channels (flow, pressure, temperature, ...).
///
/// An empty table has zero rows and no established columns; columns only
/// exist once at least one record defines them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HydraulicsTable {
    index: Vec<NaiveDateTime>,
    columns: Vec<Column>,
}

impl HydraulicsTable {
    /// The canonical empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// The sorted timestamp index.
    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.index
    }

    /// Channel names in first-observed order.
    pub fn channel_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// One channel's cells, aligned with `timestamps()`. `None` if no such
    /// channel has been established.
    pub fn channel(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// The value of one (timestamp, channel) cell, if both exist and the
    /// cell is present.
    pub fn value(&self, timestamp: NaiveDateTime, channel: &str) -> Option<f64> {
        let row = self.index.binary_search(&timestamp).ok()?;
        self.channel(channel)?.get(row).copied().flatten()
    }

    /// Insert one row, keeping the index sorted. Inserting at an existing
    /// timestamp replaces that row entirely. Channels not named in `values`
    /// are missing for this row; new channel names establish new columns.
    ///
    /// Unknown channel names are accepted (the channel set is open) but
    /// logged, since they usually indicate a typo against the HYDWS field
    /// names.
    pub fn insert_row(&mut self, timestamp: NaiveDateTime, values: &[(&str, f64)]) {
        let row = match self.index.binary_search(&timestamp) {
            Ok(existing) => {
                for column in &mut self.columns {
                    column.values[existing] = None;
                }
                existing
            }
            Err(insert_at) => {
                self.index.insert(insert_at, timestamp);
                for column in &mut self.columns {
                    column.values.insert(insert_at, None);
                }
                insert_at
            }
        };

        for (name, value) in values {
            if !is_known_channel(name) {
                warn!("unknown hydraulic channel '{name}'");
            }
            let column = self.column_mut(name);
            column.values[row] = Some(*value);
        }
    }

    fn column_mut(&mut self, name: &str) -> &mut Column {
        if let Some(pos) = self.columns.iter().position(|c| c.name == name) {
            &mut self.columns[pos]
        } else {
            self.columns.push(Column {
                name: name.to_string(),
                values: vec![None; self.index.len()],
            });
            let last = self.columns.len() - 1;
            &mut self.columns[last]
        }
    }

    // -----------------------------------------------------------------------
    // JSON record conversion
    // -----------------------------------------------------------------------

    /// Build a table from a HYDWS `hydraulics` array.
    ///
    /// Each record is an object with a `datetime` string plus zero or more
    /// numeric channels. Records arrive in service order but the table is
    /// indexed sorted; duplicate timestamps keep the last record.
    pub fn from_records(records: &[Value]) -> Result<Self> {
        let mut table = HydraulicsTable::new();

        for record in records {
            let object = record.as_object().ok_or_else(|| {
                HydwsError::Schema("hydraulic record is not a JSON object".into())
            })?;

            let datetime = object
                .get("datetime")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    HydwsError::Schema("hydraulic record has no 'datetime' string".into())
                })?;
            let timestamp = parse_timestamp(datetime).map_err(|e| {
                HydwsError::Schema(format!("bad hydraulic timestamp '{datetime}': {e}"))
            })?;

            let mut row: Vec<(&str, f64)> = Vec::with_capacity(object.len() - 1);
            for (key, value) in object {
                if key == "datetime" {
                    continue;
                }
                let number = value.as_f64().ok_or_else(|| {
                    HydwsError::Schema(format!(
                        "channel '{key}' at {datetime} is not numeric: {value}"
                    ))
                })?;
                row.push((key.as_str(), number));
            }

            table.insert_row(timestamp, &row);
        }

        Ok(table)
    }

    /// Serialize back to a HYDWS `hydraulics` array.
    ///
    /// Missing cells are omitted from the record, never emitted as null.
    /// Timestamps format exactly as they parsed, so
    /// `from_records(to_records())` reproduces the table.
    pub fn to_records(&self) -> Vec<Value> {
        let mut records = Vec::with_capacity(self.index.len());

        for (row, timestamp) in self.index.iter().enumerate() {
            let mut record = Map::new();
            record.insert(
                "datetime".to_string(),
                Value::String(format_timestamp(*timestamp)),
            );
            for column in &self.columns {
                if let Some(value) = column.values[row] {
                    match Number::from_f64(value) {
                        Some(number) => {
                            record.insert(column.name.clone(), Value::Number(number));
                        }
                        None => warn!(
                            "dropping non-finite value {value} for channel '{}' at {timestamp}",
                            column.name
                        ),
                    }
                }
            }
            records.push(Value::Object(record));
        }

        records
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
