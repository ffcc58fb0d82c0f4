use thiserror::Error;

use crate::workspace::ArtifactKind;

/// Failure of a single merge request.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("missing required fields: {}", .missing.join(", "))]
    MissingField { missing: Vec<&'static str> },

    #[error("failed to download {stream}: {reason}")]
    DownloadFailed { stream: ArtifactKind, reason: String },

    #[error("media tool failed: {reason}")]
    TranscodeFailed { reason: String, diagnostic: String },

    #[error("failed to read merged output: {reason}")]
    OutputReadFailed { reason: String },

    #[error("merged output too large: {size} bytes (max {max})")]
    OutputTooLarge { size: u64, max: u64 },

    #[error("working area unavailable: {0}")]
    Workspace(#[source] std::io::Error),

    #[error("HTTP client unavailable: {0}")]
    Client(#[source] FetchError),
}

impl MergeError {
    /// Short, stable description suitable for a client-facing message.
    pub fn summary(&self) -> String {
        match self {
            Self::MissingField { .. } => "Missing required fields".into(),
            Self::DownloadFailed { stream, .. } => format!("Failed to download {stream}"),
            Self::TranscodeFailed { .. } => "Media tool failed to merge streams".into(),
            Self::OutputReadFailed { .. } => "Failed to read merged output".into(),
            Self::OutputTooLarge { .. } => "Merged output exceeds size limit".into(),
            Self::Workspace(_) => "Failed to prepare working area".into(),
            Self::Client(_) => "Failed to initialize HTTP client".into(),
        }
    }

    /// Low-level diagnostic text.
    pub fn details(&self) -> String {
        match self {
            Self::TranscodeFailed { reason, diagnostic } if !diagnostic.is_empty() => {
                format!("{reason}\n{diagnostic}")
            }
            Self::TranscodeFailed { reason, .. } => reason.clone(),
            Self::DownloadFailed { reason, .. } | Self::OutputReadFailed { reason } => {
                reason.clone()
            }
            other => other.to_string(),
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::MissingField { .. })
    }
}

pub type MergeResult<T> = Result<T, MergeError>;

/// Failure of one remote fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server responded with HTTP {status}")]
    Status { status: u16 },

    #[error("content exceeds limit of {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
