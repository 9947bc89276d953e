//! Tabular export engine.
//!
//! Denormalizes a project's document graph into CSV:
//!
//! | Stage | Module |
//! |-------|--------|
//! | Column resolution | [`schema`] |
//! | Bulk read + grouping by feature | [`grouping`] |
//! | Row emission | [`writer`], [`cell`] |
//! | Orchestration | [`service`] |
//!
//! # Output shape
//!
//! ```text
//! "Place ID","Place name","Latitude","Longitude",<element labels...>
//! "<feature id>","<caption>","<lat>","<lng>",<answers...>
//! ```
//!
//! One row per (feature, observation) pair. Features without observations
//! produce no row; observations pointing at unknown features are dropped.

pub mod cell;
pub mod grouping;
pub mod schema;
pub mod service;
pub mod writer;

pub use grouping::{GroupedFeatures, ObservationIndex};
pub use schema::{ElementColumn, ExportSchema, FIXED_COLUMNS};
pub use service::{ExportRequest, ExportService, ExportSummary, PreparedExport};
pub use writer::CsvRowWriter;
