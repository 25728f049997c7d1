//! Error types for the HYDWS client.
//!
//! Every failure mode is surfaced to the caller; nothing is retried or
//! swallowed internally. Transport failures, non-2xx responses, undecodable
//! bodies, schema violations and failed name/ID lookups are all distinct
//! variants so callers can branch on them.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::model::EntityKind;

/// Main error type for HYDWS operations.
#[derive(Error, Debug)]
pub enum HydwsError {
    /// Connection, DNS or TLS failure while contacting the service.
    /// Not retried; surfaced immediately.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("service returned HTTP {status}: {body}")]
    Service { status: u16, body: String },

    /// The response body (or a loaded document) is not valid JSON.
    #[error("failed to decode JSON: {0}")]
    Decode(#[from] serde_json::Error),

    /// The JSON is valid but does not match the HYDWS schema
    /// (missing required fields, wrong value types).
    #[error("schema error: {0}")]
    Schema(String),

    /// A borehole or section reference matched neither a `publicid`
    /// nor a `name` in the current listing.
    #[error("{kind} reference '{reference}' matched no publicid or name")]
    ReferenceNotFound {
        kind: EntityKind,
        reference: String,
    },

    /// A time-scoped fetch was called with `start > end`. Checked before
    /// any network call is made.
    #[error("invalid time range: start {start} is after end {end}")]
    InvalidTimeRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    /// Failed to read a local document file.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Results using HydwsError.
pub type Result<T> = std::result::Result<T, HydwsError>;
