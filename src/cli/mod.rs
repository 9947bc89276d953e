//! CLI command implementations.
//!
//! | Command | Description |
//! |---------|-------------|
//! | `serve` | Run the HTTP export endpoint |
//! | `export` | Write one project/layer export to a file or stdout |
//!
//! ```bash
//! ground-export serve --bind 127.0.0.1:8080 --data snapshot.json
//! ground-export export --project p1 --layer l1 --output p1-l1.csv --data snapshot.json
//! ```

mod export;
mod serve;

pub use export::ExportCommand;
pub use serve::ServeCommand;

use crate::config::GroundExportConfig;
use crate::export::ExportService;
use crate::storage::{DocumentStore, load_snapshot};
use crate::{Error, Result};
use std::sync::Arc;

/// Opens the configured document store and wraps it in an export service.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if no snapshot is configured, or any error
/// from loading it.
pub fn open_service(config: &GroundExportConfig) -> Result<ExportService<dyn DocumentStore>> {
    let path = config.snapshot_path.as_deref().ok_or_else(|| {
        Error::InvalidInput(
            "no document snapshot configured \
             (use --data, GROUND_EXPORT_DATA, or [store].snapshot_path)"
                .to_string(),
        )
    })?;
    let store: Arc<dyn DocumentStore> = Arc::new(load_snapshot(path)?);
    Ok(ExportService::new(store).with_settings(config.export))
}
