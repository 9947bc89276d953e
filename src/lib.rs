//! # Ground Export
//!
//! Tabular export engine for map-based field data collection projects.
//!
//! A project defines layers, each layer carries a form made of elements
//! (question definitions), and survey teams record observations against
//! geotagged features. This crate denormalizes that document graph into a
//! flat CSV file: four fixed identity/location columns followed by one column
//! per form element, one row per (feature, observation) pair.
//!
//! ## Features
//!
//! - Streaming CSV emission over any [`std::io::Write`] sink
//! - Pluggable document stores behind [`storage::DocumentStore`]
//! - HTTP endpoint (`GET /export/csv?project=..&layer=..`) built on axum
//! - CLI for serving and one-shot exports
//!
//! ## Example
//!
//! ```rust,ignore
//! use ground_export::{ExportRequest, ExportService};
//! use ground_export::storage::InMemoryDocumentStore;
//! use std::sync::Arc;
//!
//! let service = ExportService::new(Arc::new(InMemoryDocumentStore::new()));
//! let summary = service.export_to_writer(
//!     &ExportRequest::new("p1").with_layer("l1"),
//!     std::io::stdout(),
//! )?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod cli;
pub mod config;
pub mod export;
pub mod http;
pub mod models;
pub mod observability;
pub mod storage;

// Re-exports for convenience
pub use config::{FormSelection, GroundExportConfig};
pub use export::{ExportRequest, ExportService, ExportSummary, PreparedExport};
pub use models::{Element, Feature, Form, Layer, Location, Observation, Project};
pub use storage::DocumentStore;

/// Error type for export operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Missing `project` parameter, malformed config values |
/// | `ProjectNotFound` | The requested project does not exist in the store |
/// | `AmbiguousForm` | A layer has several forms under the `single` selection policy |
/// | `OperationFailed` | Store reads, file I/O, config parsing, server startup |
/// | `StreamWrite` | The output sink closed or failed while rows were being written |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The requested project does not exist.
    ///
    /// Raised before any output is written, so HTTP callers get a 404
    /// instead of a truncated CSV.
    #[error("project not found: {0}")]
    ProjectNotFound(String),

    /// A layer holds more than one form and the configured policy requires
    /// exactly one.
    #[error("layer '{layer_id}' has {count} forms; expected exactly one")]
    AmbiguousForm {
        /// The layer being exported.
        layer_id: String,
        /// Number of forms found on the layer.
        count: usize,
    },

    /// An operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// Writing to the output sink failed mid-export.
    ///
    /// Fatal to the export in flight only.
    #[error("stream write failed: {0}")]
    StreamWrite(String),
}

impl Error {
    /// Shorthand for [`Error::OperationFailed`].
    pub fn operation(operation: &str, cause: impl ToString) -> Self {
        Self::OperationFailed {
            operation: operation.to_string(),
            cause: cause.to_string(),
        }
    }
}

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, Error>;
