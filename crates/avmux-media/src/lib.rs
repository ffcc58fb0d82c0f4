//! Merge pipeline for avmux.
//!
//! Fetches a video and an audio stream into a request-scoped working area,
//! hands both to an external media tool for multiplexing, and returns the
//! combined file encoded for transport. The working area is released on
//! every exit path.

pub mod config;
pub mod error;
pub mod fetch;
pub mod merger;
pub mod tool;
pub mod workspace;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{FetchLimits, MergeConfig};
pub use error::{FetchError, MergeError, MergeResult};
pub use fetch::Fetcher;
pub use merger::{encode_output, MergeOutcome, Merger};
pub use tool::{CombineJob, FfmpegTool, MediaTool};
pub use workspace::{Artifact, ArtifactKind, Workspace};
