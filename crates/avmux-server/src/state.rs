use avmux_media::Merger;

/// Shared per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub merger: Merger,
    /// Media tool version line, probed once at startup.
    pub tool_version: Option<String>,
}

impl AppState {
    pub fn new(merger: Merger, tool_version: Option<String>) -> Self {
        Self { merger, tool_version }
    }

    /// Probe the merger's media tool and record its version.
    pub async fn probed(merger: Merger) -> Self {
        let tool_version = match merger.tool().probe().await {
            Ok(version) => {
                tracing::info!("media tool: {version}");
                Some(version)
            }
            Err(e) => {
                tracing::warn!("media tool unavailable: {e}");
                None
            }
        };
        Self::new(merger, tool_version)
    }
}
