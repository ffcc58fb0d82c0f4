use tokio::net::TcpListener;

use avmux_media::Merger;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// avmux HTTP server.
pub struct AvmuxServer {
    config: ServerConfig,
}

impl AvmuxServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router, probing the configured media tool once.
    pub async fn router(&self) -> ServerResult<axum::Router> {
        let merger = Merger::new(self.config.merge.clone())?;
        let state = AppState::probed(merger).await;
        Ok(build_router(state, &self.config))
    }

    /// Serve requests until Ctrl-C. In-flight requests run to completion.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router().await?;
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!("avmux listening on {}", self.config.bind_addr);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
