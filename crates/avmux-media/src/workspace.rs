use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use rand::distributions::Alphanumeric;
use rand::Rng;
use tempfile::TempDir;

const SUFFIX_LEN: usize = 8;

/// Role of a temporary file within one merge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Video,
    Audio,
    Output,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [Self::Video, Self::Audio, Self::Output];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Output => "output",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named temporary file owned by one request.
#[derive(Clone, Debug)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
}

/// Request-scoped working area holding the video, audio, and output
/// artifacts.
///
/// The area is a freshly created directory under the configured root, so
/// concurrent requests never share file names. [`Workspace::close`]
/// releases it and reports failures to the log; dropping without closing
/// still removes the directory, silently.
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    video: Artifact,
    audio: Artifact,
    output: Artifact,
}

impl Workspace {
    /// Create a working area under `root` (or the OS temp dir).
    ///
    /// `video_ext` and `audio_ext` become the input file extensions; the
    /// output is always `.mp4`.
    pub fn create(root: Option<&Path>, video_ext: &str, audio_ext: &str) -> io::Result<Self> {
        let root = root.map(Path::to_path_buf).unwrap_or_else(std::env::temp_dir);
        std::fs::create_dir_all(&root)?;
        let dir = tempfile::Builder::new().prefix("avmux-").tempdir_in(&root)?;

        let artifact = |kind: ArtifactKind, ext: &str| Artifact {
            kind,
            path: dir.path().join(artifact_name(kind, ext)),
        };
        let video = artifact(ArtifactKind::Video, video_ext);
        let audio = artifact(ArtifactKind::Audio, audio_ext);
        let output = artifact(ArtifactKind::Output, "mp4");

        tracing::debug!("created working area {}", dir.path().display());
        Ok(Self { dir: Some(dir), video, audio, output })
    }

    /// [`Workspace::create`] on the blocking pool.
    pub async fn open(root: Option<PathBuf>, video_ext: String, audio_ext: String) -> io::Result<Self> {
        tokio::task::spawn_blocking(move || Self::create(root.as_deref(), &video_ext, &audio_ext))
            .await
            .map_err(io::Error::other)?
    }

    /// [`Workspace::close`] on the blocking pool.
    pub async fn release(self) {
        if let Err(e) = tokio::task::spawn_blocking(move || self.close()).await {
            tracing::warn!("working area cleanup task failed: {e}");
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.dir.as_ref().map(TempDir::path)
    }

    pub fn artifact(&self, kind: ArtifactKind) -> &Artifact {
        match kind {
            ArtifactKind::Video => &self.video,
            ArtifactKind::Audio => &self.audio,
            ArtifactKind::Output => &self.output,
        }
    }

    /// Delete every artifact that exists, then the area itself.
    ///
    /// Best-effort: failures are logged and never returned.
    pub fn close(mut self) {
        for kind in ArtifactKind::ALL {
            let path = &self.artifact(kind).path;
            match std::fs::remove_file(path) {
                Ok(()) => tracing::debug!("removed {kind} artifact {}", path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!("failed to remove {kind} artifact {}: {e}", path.display()),
            }
        }
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                tracing::warn!("failed to remove working area {}: {e}", path.display());
            }
        }
    }
}

/// `<kind>_<unix-millis>_<random>.<ext>`
fn artifact_name(kind: ArtifactKind, ext: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("{kind}_{}_{suffix}.{ext}", chrono::Utc::now().timestamp_millis())
}

/// File extension taken from the last path segment of `url`, if it looks
/// like one; otherwise `default`.
pub fn extension_hint(url: &str, default: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| {
            let segment = u.path_segments()?.last()?.to_string();
            let (_, ext) = segment.rsplit_once('.')?;
            let valid = (1..=5).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphanumeric());
            valid.then(|| ext.to_ascii_lowercase())
        })
        .unwrap_or_else(|| default.to_string())
}
