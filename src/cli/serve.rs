//! Serve CLI command (HTTP export endpoint).

use crate::config::GroundExportConfig;
use crate::http::{self, AppState};
use crate::{Error, Result};
use tokio::net::TcpListener;

/// Serve command handler.
pub struct ServeCommand {
    config: GroundExportConfig,
}

impl ServeCommand {
    /// Creates a serve command over the resolved configuration.
    #[must_use]
    pub const fn new(config: GroundExportConfig) -> Self {
        Self { config }
    }

    /// Loads the store, binds the listener, and serves until shutdown.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened, the address cannot be
    /// bound, or the server fails.
    pub async fn run(self) -> Result<()> {
        let service = super::open_service(&self.config)?;
        let bind = self.config.server.bind;
        let listener = TcpListener::bind(bind).await.map_err(|e| Error::OperationFailed {
            operation: "bind".to_string(),
            cause: format!("{bind}: {e}"),
        })?;
        http::serve(
            listener,
            AppState::new(service, self.config.server.stream_buffer),
        )
        .await
    }
}
