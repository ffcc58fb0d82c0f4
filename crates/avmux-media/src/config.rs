use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

const MIB: u64 = 1024 * 1024;

/// Size ceiling and deadline for one remote fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchLimits {
    pub max_bytes: u64,
    pub timeout_secs: u64,
}

impl FetchLimits {
    pub fn new(max_bytes: u64, timeout_secs: u64) -> Self {
        Self { max_bytes, timeout_secs }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn video() -> Self {
        Self::new(500 * MIB, 300)
    }

    pub fn audio() -> Self {
        Self::new(100 * MIB, 120)
    }
}

/// Configuration for the merge pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Directory under which per-request working areas are created.
    /// `None` uses the OS temp directory.
    pub work_root: Option<PathBuf>,
    pub video: FetchLimits,
    pub audio: FetchLimits,
    /// Path or name of the media tool executable.
    pub tool_path: PathBuf,
    pub audio_codec: String,
    pub audio_bitrate: String,
    /// Ceiling on the merged file size. `None` leaves it bounded only by
    /// memory and the response path.
    pub max_output_bytes: Option<u64>,
    /// Maximum number of merges in flight at once. `None` admits every
    /// request immediately.
    pub max_concurrent_merges: Option<usize>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            work_root: None,
            video: FetchLimits::video(),
            audio: FetchLimits::audio(),
            tool_path: PathBuf::from("ffmpeg"),
            audio_codec: "aac".into(),
            audio_bitrate: "192k".into(),
            max_output_bytes: None,
            max_concurrent_merges: None,
        }
    }
}
