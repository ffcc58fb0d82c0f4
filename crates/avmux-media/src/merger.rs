use std::sync::Arc;
use std::time::Instant;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tokio::sync::Semaphore;
use tracing::Instrument;
use uuid::Uuid;

use avmux_protocol::{MergeRequest, MergeResponse, MergeStats};

use crate::config::{FetchLimits, MergeConfig};
use crate::error::{MergeError, MergeResult};
use crate::fetch::Fetcher;
use crate::tool::{CombineJob, FfmpegTool, MediaTool};
use crate::workspace::{extension_hint, Artifact, ArtifactKind, Workspace};

/// Successful merge: the encoded output plus per-stage statistics.
#[derive(Clone, Debug)]
pub struct MergeOutcome {
    pub base64: String,
    pub stats: MergeStats,
}

impl From<MergeOutcome> for MergeResponse {
    fn from(outcome: MergeOutcome) -> Self {
        MergeResponse::new(outcome.base64, outcome.stats)
    }
}

/// Text-safe encoding of the merged file.
pub fn encode_output(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Runs merge requests end to end.
///
/// Cheap to clone; clones share the HTTP client, the media tool, and the
/// admission permits.
#[derive(Clone)]
pub struct Merger {
    config: Arc<MergeConfig>,
    fetcher: Fetcher,
    tool: Arc<dyn MediaTool>,
    permits: Option<Arc<Semaphore>>,
}

impl Merger {
    /// Build a merger that invokes `ffmpeg` at `config.tool_path`.
    pub fn new(config: MergeConfig) -> MergeResult<Self> {
        let tool = Arc::new(FfmpegTool::new(config.tool_path.clone()));
        Self::with_tool(config, tool)
    }

    pub fn with_tool(config: MergeConfig, tool: Arc<dyn MediaTool>) -> MergeResult<Self> {
        let fetcher = Fetcher::new().map_err(MergeError::Client)?;
        let permits = config.max_concurrent_merges.map(|n| Arc::new(Semaphore::new(n.max(1))));
        Ok(Self { config: Arc::new(config), fetcher, tool, permits })
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    pub fn tool(&self) -> &Arc<dyn MediaTool> {
        &self.tool
    }

    /// Validate, download, combine, encode, and clean up.
    ///
    /// Phases run strictly in order and any failure skips straight to
    /// cleanup. No working area is created for an invalid request.
    pub async fn merge(&self, request: &MergeRequest) -> MergeResult<MergeOutcome> {
        let span = tracing::info_span!("merge", request_id = %Uuid::now_v7());
        self.merge_inner(request).instrument(span).await
    }

    async fn merge_inner(&self, request: &MergeRequest) -> MergeResult<MergeOutcome> {
        let (video_url, audio_url) = match (&request.video_url, &request.audio_url) {
            (Some(v), Some(a)) if request.missing_fields().is_empty() => (v.trim(), a.trim()),
            _ => return Err(MergeError::MissingField { missing: request.missing_fields() }),
        };

        let _permit = match &self.permits {
            Some(permits) => permits.acquire().await.ok(),
            None => None,
        };

        let started = Instant::now();
        let workspace = Workspace::open(
            self.config.work_root.clone(),
            extension_hint(video_url, "mp4"),
            extension_hint(audio_url, "mp3"),
        )
        .await
        .map_err(MergeError::Workspace)?;

        let result = self.run(&workspace, video_url, audio_url, started).await;
        workspace.release().await;

        match &result {
            Ok(outcome) => tracing::info!(
                output_size = outcome.stats.output_size,
                seconds = outcome.stats.processing_time,
                "merge complete"
            ),
            Err(e) => tracing::error!("merge failed: {e}"),
        }
        result
    }

    async fn run(
        &self,
        workspace: &Workspace,
        video_url: &str,
        audio_url: &str,
        started: Instant,
    ) -> MergeResult<MergeOutcome> {
        let video = workspace.artifact(ArtifactKind::Video);
        let audio = workspace.artifact(ArtifactKind::Audio);
        let output = workspace.artifact(ArtifactKind::Output);

        tracing::info!(video_url, audio_url, "downloading inputs");
        let (video_size, audio_size) = tokio::try_join!(
            self.download(video_url, video, &self.config.video),
            self.download(audio_url, audio, &self.config.audio),
        )?;
        tracing::info!(video_size, audio_size, "inputs downloaded");

        let job = CombineJob {
            video: video.path.clone(),
            audio: audio.path.clone(),
            output: output.path.clone(),
            audio_codec: self.config.audio_codec.clone(),
            audio_bitrate: self.config.audio_bitrate.clone(),
        };
        self.tool.combine(&job).await?;

        let bytes = self.read_output(output).await?;
        let stats = MergeStats::new(
            video_size,
            audio_size,
            bytes.len() as u64,
            started.elapsed().as_secs_f64(),
        );
        Ok(MergeOutcome { base64: encode_output(&bytes), stats })
    }

    async fn download(&self, url: &str, artifact: &Artifact, limits: &FetchLimits) -> MergeResult<u64> {
        self.fetcher
            .fetch_to_file(url, &artifact.path, limits)
            .await
            .map_err(|e| MergeError::DownloadFailed { stream: artifact.kind, reason: e.to_string() })
    }

    async fn read_output(&self, output: &Artifact) -> MergeResult<Vec<u8>> {
        let metadata = match tokio::fs::metadata(&output.path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MergeError::TranscodeFailed {
                    reason: "media tool reported success but produced no output".into(),
                    diagnostic: String::new(),
                });
            }
            Err(e) => return Err(MergeError::OutputReadFailed { reason: e.to_string() }),
        };
        if let Some(max) = self.config.max_output_bytes {
            if metadata.len() > max {
                return Err(MergeError::OutputTooLarge { size: metadata.len(), max });
            }
        }
        tokio::fs::read(&output.path)
            .await
            .map_err(|e| MergeError::OutputReadFailed { reason: e.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{entries, serve, Behavior, RecordingTool};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use proptest::prelude::*;
    use std::path::Path;
    use std::time::Duration;

    async fn media_host() -> String {
        let app = Router::new()
            .route("/a.mp4", get(|| async { vec![1u8; 100] }))
            .route("/b.mp3", get(|| async { vec![2u8; 40] }))
            .route("/gone.mp4", get(|| async { StatusCode::NOT_FOUND }));
        serve(app).await
    }

    fn config(root: &Path) -> MergeConfig {
        MergeConfig {
            work_root: Some(root.to_path_buf()),
            video: FetchLimits::new(1024, 10),
            audio: FetchLimits::new(1024, 10),
            ..MergeConfig::default()
        }
    }

    fn merger(config: MergeConfig, tool: &Arc<RecordingTool>) -> Merger {
        Merger::with_tool(config, tool.clone()).unwrap()
    }

    #[tokio::test]
    async fn missing_fields_create_no_artifacts() {
        let root = tempfile::tempdir().unwrap();
        let tool = Arc::new(RecordingTool::new(Behavior::NoOutput));
        let m = merger(config(root.path()), &tool);

        let err = m
            .merge(&MergeRequest { video_url: Some("https://host/a.mp4".into()), audio_url: None })
            .await
            .unwrap_err();
        assert!(matches!(err, MergeError::MissingField { ref missing } if missing == &["audioUrl"]));

        let err = m.merge(&MergeRequest::default()).await.unwrap_err();
        assert!(matches!(err, MergeError::MissingField { ref missing } if missing.len() == 2));

        assert_eq!(entries(root.path()), 0);
        assert_eq!(tool.calls(), 0);
    }

    #[tokio::test]
    async fn successful_merge_encodes_output_and_cleans_up() {
        let base = media_host().await;
        let root = tempfile::tempdir().unwrap();
        let tool = Arc::new(RecordingTool::new(Behavior::Write(b"merged-bytes".to_vec())));
        let m = merger(config(root.path()), &tool);

        let outcome = m
            .merge(&MergeRequest::new(format!("{base}/a.mp4"), format!("{base}/b.mp3")))
            .await
            .unwrap();

        assert_eq!(STANDARD.decode(&outcome.base64).unwrap(), b"merged-bytes");
        assert_eq!(outcome.stats.input_video_size, 100);
        assert_eq!(outcome.stats.input_audio_size, 40);
        assert_eq!(outcome.stats.output_size, 12);
        assert!(outcome.stats.processing_time >= 0.0);
        assert_eq!(tool.calls(), 1);
        assert_eq!(entries(root.path()), 0);

        let response: MergeResponse = outcome.into();
        assert!(response.success);
    }

    #[tokio::test]
    async fn failed_download_skips_tool_and_cleans_up() {
        let base = media_host().await;
        let root = tempfile::tempdir().unwrap();
        let tool = Arc::new(RecordingTool::new(Behavior::Write(vec![0])));
        let m = merger(config(root.path()), &tool);

        let err = m
            .merge(&MergeRequest::new(format!("{base}/gone.mp4"), format!("{base}/b.mp3")))
            .await
            .unwrap_err();

        match err {
            MergeError::DownloadFailed { stream, reason } => {
                assert_eq!(stream, ArtifactKind::Video);
                assert!(reason.contains("404"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(tool.calls(), 0);
        assert_eq!(entries(root.path()), 0);
    }

    #[tokio::test]
    async fn oversized_audio_fails_download() {
        let base = media_host().await;
        let root = tempfile::tempdir().unwrap();
        let tool = Arc::new(RecordingTool::new(Behavior::Write(vec![0])));
        let mut cfg = config(root.path());
        cfg.audio = FetchLimits::new(10, 10);
        let m = merger(cfg, &tool);

        let err = m
            .merge(&MergeRequest::new(format!("{base}/a.mp4"), format!("{base}/b.mp3")))
            .await
            .unwrap_err();

        assert!(matches!(err, MergeError::DownloadFailed { stream: ArtifactKind::Audio, .. }));
        assert_eq!(tool.calls(), 0);
        assert_eq!(entries(root.path()), 0);
    }

    #[tokio::test]
    async fn tool_failure_surfaces_diagnostic() {
        let base = media_host().await;
        let root = tempfile::tempdir().unwrap();
        let tool = Arc::new(RecordingTool::new(Behavior::Fail("moov atom not found".into())));
        let m = merger(config(root.path()), &tool);

        let err = m
            .merge(&MergeRequest::new(format!("{base}/a.mp4"), format!("{base}/b.mp3")))
            .await
            .unwrap_err();

        assert!(matches!(err, MergeError::TranscodeFailed { .. }));
        assert!(err.details().contains("moov atom not found"));
        assert_eq!(entries(root.path()), 0);
    }

    #[tokio::test]
    async fn silent_no_output_is_transcode_failure() {
        let base = media_host().await;
        let root = tempfile::tempdir().unwrap();
        let tool = Arc::new(RecordingTool::new(Behavior::NoOutput));
        let m = merger(config(root.path()), &tool);

        let err = m
            .merge(&MergeRequest::new(format!("{base}/a.mp4"), format!("{base}/b.mp3")))
            .await
            .unwrap_err();

        match err {
            MergeError::TranscodeFailed { reason, .. } => assert!(reason.contains("no output")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(entries(root.path()), 0);
    }

    #[tokio::test]
    async fn output_ceiling_is_enforced() {
        let base = media_host().await;
        let root = tempfile::tempdir().unwrap();
        let tool = Arc::new(RecordingTool::new(Behavior::Write(vec![9u8; 64])));
        let mut cfg = config(root.path());
        cfg.max_output_bytes = Some(16);
        let m = merger(cfg, &tool);

        let err = m
            .merge(&MergeRequest::new(format!("{base}/a.mp4"), format!("{base}/b.mp3")))
            .await
            .unwrap_err();

        assert!(matches!(err, MergeError::OutputTooLarge { size: 64, max: 16 }));
        assert_eq!(entries(root.path()), 0);
    }

    #[tokio::test]
    async fn admission_limit_serializes_tool_runs() {
        let base = media_host().await;
        let root = tempfile::tempdir().unwrap();
        let tool = Arc::new(
            RecordingTool::new(Behavior::Write(vec![1])).with_delay(Duration::from_millis(50)),
        );
        let mut cfg = config(root.path());
        cfg.max_concurrent_merges = Some(1);
        let m = merger(cfg, &tool);

        let request = MergeRequest::new(format!("{base}/a.mp4"), format!("{base}/b.mp3"));
        let runs = (0..3).map(|_| {
            let m = m.clone();
            let request = request.clone();
            tokio::spawn(async move { m.merge(&request).await })
        });
        for handle in runs.collect::<Vec<_>>() {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(tool.calls(), 3);
        assert_eq!(tool.peak(), 1);
        assert_eq!(entries(root.path()), 0);
    }

    proptest! {
        #[test]
        fn encoded_output_round_trips(bytes in proptest::collection::vec(any::<u8>(), 0..2048)) {
            let encoded = encode_output(&bytes);
            prop_assert!(encoded.is_ascii());
            prop_assert_eq!(STANDARD.decode(encoded).unwrap(), bytes);
        }
    }
}
