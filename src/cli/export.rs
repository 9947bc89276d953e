//! Export CLI command (one-shot file export).

use crate::config::GroundExportConfig;
use crate::export::{ExportRequest, ExportSummary};
use crate::{Error, Result};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

/// Export command handler.
pub struct ExportCommand {
    config: GroundExportConfig,
    request: ExportRequest,
    output: Option<PathBuf>,
}

impl ExportCommand {
    /// Creates an export command. Without an output path, CSV goes to stdout.
    #[must_use]
    pub const fn new(
        config: GroundExportConfig,
        request: ExportRequest,
        output: Option<PathBuf>,
    ) -> Self {
        Self {
            config,
            request,
            output,
        }
    }

    /// Runs the export.
    ///
    /// The output file is only created once the project has been found.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened, the project does not
    /// exist, or the output cannot be written.
    pub fn run(self) -> Result<ExportSummary> {
        let service = super::open_service(&self.config)?;
        let prepared = service.prepare(&self.request)?;

        match self.output {
            Some(path) => {
                let file = File::create(&path).map_err(|e| Error::OperationFailed {
                    operation: "create_output".to_string(),
                    cause: format!("{}: {e}", path.display()),
                })?;
                let summary = prepared.write_to(BufWriter::new(file))?;
                tracing::info!(path = %path.display(), rows = summary.rows_written, "Wrote export");
                Ok(summary)
            },
            None => prepared.write_to(BufWriter::new(io::stdout().lock())),
        }
    }
}
