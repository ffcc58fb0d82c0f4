//! Shared fixtures for unit tests.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpListener;

use crate::error::{MergeError, MergeResult};
use crate::tool::{CombineJob, MediaTool};

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn serve(app: axum::Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Number of entries directly under `dir`.
pub fn entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

#[derive(Clone, Debug)]
pub enum Behavior {
    Write(Vec<u8>),
    Fail(String),
    NoOutput,
}

/// In-process stand-in for the media tool.
pub struct RecordingTool {
    behavior: Behavior,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl RecordingTool {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaTool for RecordingTool {
    async fn combine(&self, job: &CombineJob) -> MergeResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        assert!(job.video.exists());
        assert!(job.audio.exists());
        match &self.behavior {
            Behavior::Write(bytes) => {
                tokio::fs::write(&job.output, bytes).await.unwrap();
                Ok(())
            }
            Behavior::Fail(msg) => Err(MergeError::TranscodeFailed {
                reason: "exited with status 1".into(),
                diagnostic: msg.clone(),
            }),
            Behavior::NoOutput => Ok(()),
        }
    }

    async fn probe(&self) -> MergeResult<String> {
        Ok("recording-tool 1.0".into())
    }
}
