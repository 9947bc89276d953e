//! CSV export service.
//!
//! Orchestrates one export session: project lookup, column resolution, bulk
//! reads, grouping, then a single forward pass writing rows.
//!
//! The session is split in two so callers can choose a response status before
//! committing to a body: [`ExportService::prepare`] does every store read and
//! fails fast (project missing, store error), and
//! [`PreparedExport::write_to`] only writes.

use crate::config::ExportSettings;
use crate::export::grouping::GroupedFeatures;
use crate::export::schema::ExportSchema;
use crate::export::writer::CsvRowWriter;
use crate::models::{Feature, Observation};
use crate::observability::{current_request_id, outcome_label, record_export, record_outcome};
use crate::storage::DocumentStore;
use crate::{Error, Result};
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

/// Identifies what to export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    /// Project to export.
    pub project_id: String,
    /// Layer to export; `None` yields a header-only file.
    pub layer_id: Option<String>,
}

impl ExportRequest {
    /// Creates a request for a project with no layer selected.
    #[must_use]
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            layer_id: None,
        }
    }

    /// Selects the layer.
    #[must_use]
    pub fn with_layer(mut self, layer_id: impl Into<String>) -> Self {
        self.layer_id = Some(layer_id.into());
        self
    }

    /// Suggested download file name.
    #[must_use]
    pub fn file_name(&self) -> String {
        let stem: String = match &self.layer_id {
            Some(layer) => format!("{}-{layer}", self.project_id),
            None => self.project_id.clone(),
        };
        let safe: String = stem
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("{safe}.csv")
    }
}

/// Result of a completed export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Project exported.
    pub project_id: String,
    /// Layer exported.
    pub layer_id: Option<String>,
    /// Columns in the header row.
    pub columns: usize,
    /// Features read.
    pub features: usize,
    /// Observations read.
    pub observations: usize,
    /// Data rows written.
    pub rows_written: usize,
    /// Observations dropped because their feature was not found.
    pub orphaned_observations: usize,
}

/// Service for exporting layers to CSV.
pub struct ExportService<S: DocumentStore + ?Sized> {
    /// Document store to read from.
    store: Arc<S>,
    /// Export behavior.
    settings: ExportSettings,
}

impl<S: DocumentStore + ?Sized> Clone for ExportService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            settings: self.settings,
        }
    }
}

impl<S: DocumentStore + ?Sized> ExportService<S> {
    /// Creates a service with default settings.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            settings: ExportSettings::default(),
        }
    }

    /// Replaces the export settings.
    #[must_use]
    pub const fn with_settings(mut self, settings: ExportSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Returns the export settings.
    #[must_use]
    pub const fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Reads everything an export needs.
    ///
    /// # Errors
    ///
    /// - [`Error::ProjectNotFound`] if the project does not exist
    /// - [`Error::AmbiguousForm`] under the single-form policy
    /// - [`Error::OperationFailed`] if a store read fails
    pub fn prepare(&self, request: &ExportRequest) -> Result<PreparedExport> {
        self.try_prepare(request)
            .inspect_err(|e| record_outcome(outcome_label(e)))
    }

    fn try_prepare(&self, request: &ExportRequest) -> Result<PreparedExport> {
        let started = Instant::now();
        let project_id = request.project_id.as_str();
        let layer_id = request.layer_id.as_deref();

        let Some(project) = self.store.fetch_project(project_id)? else {
            return Err(Error::ProjectNotFound(project_id.to_string()));
        };

        tracing::info!(
            project_id,
            layer_id = layer_id.unwrap_or(""),
            request_id = current_request_id().as_deref().unwrap_or("-"),
            "Exporting project"
        );

        let schema = ExportSchema::resolve(&project, layer_id, self.settings.form_selection)?;

        let (features, observations) = match layer_id {
            Some(layer_id) => self.fetch_collections(project_id, layer_id)?,
            None => (Vec::new(), Vec::new()),
        };
        let grouped = GroupedFeatures::new(features, observations);

        let orphaned = grouped.orphan_count();
        if orphaned > 0 {
            tracing::debug!(project_id, orphaned, "Dropping observations with no matching feature");
        }

        Ok(PreparedExport {
            request: request.clone(),
            schema,
            grouped,
            started,
        })
    }

    /// Prepares and writes an export in one call.
    ///
    /// # Errors
    ///
    /// Returns any error from [`Self::prepare`] or [`PreparedExport::write_to`].
    pub fn export_to_writer<W: Write>(
        &self,
        request: &ExportRequest,
        writer: W,
    ) -> Result<ExportSummary> {
        self.prepare(request)?.write_to(writer)
    }

    /// Runs the two bulk reads, concurrently when enabled.
    fn fetch_collections(
        &self,
        project_id: &str,
        layer_id: &str,
    ) -> Result<(Vec<Feature>, Vec<Observation>)> {
        let store = self.store.as_ref();
        if !self.settings.parallel_fetch {
            let features = store.fetch_features_by_layer_id(project_id, layer_id)?;
            let observations = store.fetch_observations_by_layer_id(project_id, layer_id)?;
            return Ok((features, observations));
        }

        std::thread::scope(|scope| {
            let features =
                scope.spawn(move || store.fetch_features_by_layer_id(project_id, layer_id));
            let observations = store.fetch_observations_by_layer_id(project_id, layer_id);
            let features = features
                .join()
                .map_err(|_| Error::operation("fetch_features", "reader thread panicked"))?;
            Ok((features?, observations?))
        })
    }
}

/// An export whose data has been read and grouped, ready to stream.
#[derive(Debug)]
pub struct PreparedExport {
    request: ExportRequest,
    schema: ExportSchema,
    grouped: GroupedFeatures,
    started: Instant,
}

impl PreparedExport {
    /// The resolved columns.
    #[must_use]
    pub const fn schema(&self) -> &ExportSchema {
        &self.schema
    }

    /// The request this export answers.
    #[must_use]
    pub const fn request(&self) -> &ExportRequest {
        &self.request
    }

    /// Streams the CSV into `writer` and closes the stream.
    ///
    /// Rows are written in feature fetch order, then observation fetch order
    /// within each feature. Nothing is buffered beyond the encoder's buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StreamWrite`] if the sink fails; the export is
    /// abandoned at that point.
    pub fn write_to<W: Write>(self, writer: W) -> Result<ExportSummary> {
        let result = self.stream(writer);
        match &result {
            Ok(summary) => record_export(summary, self.started.elapsed()),
            Err(e) => {
                record_outcome(outcome_label(e));
                tracing::warn!(
                    project_id = %self.request.project_id,
                    error = %e,
                    "Export aborted while streaming"
                );
            },
        }
        result
    }

    fn stream<W: Write>(&self, writer: W) -> Result<ExportSummary> {
        let mut rows = CsvRowWriter::new(writer, &self.schema.headers())?;
        for (feature, observation) in self.grouped.pairs() {
            rows.write_observation(&self.schema, feature, observation)?;
        }
        let rows_written = rows.rows_written();
        rows.finish()?;

        Ok(ExportSummary {
            project_id: self.request.project_id.clone(),
            layer_id: self.request.layer_id.clone(),
            columns: self.schema.width(),
            features: self.grouped.features().len(),
            observations: self.grouped.index().len(),
            rows_written,
            orphaned_observations: self.grouped.orphan_count(),
        })
    }
}
