//! Client library for HYDWS, a hydraulic-data web service exposing
//! borehole and borehole-section metadata plus associated time-series
//! hydraulic measurements.
//!
//! Two collaborating pieces:
//!   - [`HydwsClient`] issues blocking, shaped queries against the service
//!     and resolves borehole/section references by `publicid` or `name`;
//!   - [`Borehole`] / [`Section`] turn the returned JSON (or a local file)
//!     into a navigable object graph whose hydraulic series are
//!     [`HydraulicsTable`]s, and turn edited tables back into
//!     service-shaped JSON.
//!
//! ```no_run
//! use hydws_client::{Borehole, HydwsClient};
//!
//! # fn main() -> hydws_client::Result<()> {
//! let client = HydwsClient::new("https://hydws.example.org/v1")?;
//! let start = "2024-04-06T00:00:00".parse().unwrap();
//! let end = "2024-04-07T00:00:00".parse().unwrap();
//!
//! let document = client.get_borehole("ST1", start, end)?;
//! let borehole = Borehole::from_value(document)?;
//! let section = borehole.section("ST1/sec_1")?;
//! let flow = section.hydraulics().channel("topflow");
//! # let _ = flow;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod hierarchy;
pub mod model;
pub mod table;

pub use client::{HydraulicsFormat, HydwsClient, SectionHydraulics};
pub use error::{HydwsError, Result};
pub use hierarchy::{Borehole, Section};
pub use model::{BoreholeMetadata, EntityKind, SectionMetadata};
pub use table::HydraulicsTable;
