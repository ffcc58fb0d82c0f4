use std::collections::VecDeque;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::error::{MergeError, MergeResult};

/// Lines of the tool's stderr kept for failure diagnostics.
const DIAGNOSTIC_TAIL_LINES: usize = 20;

/// One invocation of the media tool: two local inputs, one output.
#[derive(Clone, Debug)]
pub struct CombineJob {
    pub video: PathBuf,
    pub audio: PathBuf,
    pub output: PathBuf,
    pub audio_codec: String,
    pub audio_bitrate: String,
}

/// External program that multiplexes a video and an audio input.
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Run to completion. The caller is suspended until the tool exits.
    async fn combine(&self, job: &CombineJob) -> MergeResult<()>;

    /// Identify the installed tool, typically its version banner.
    async fn probe(&self) -> MergeResult<String>;
}

/// [`MediaTool`] backed by the `ffmpeg` command-line program.
#[derive(Clone, Debug)]
pub struct FfmpegTool {
    program: PathBuf,
}

impl FfmpegTool {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    /// Arguments for `job`: video copied from input 0, audio re-encoded
    /// from input 1, cut to the shorter input, moov atom up front, output
    /// overwritten. Progress goes to stdout as `key=value` lines.
    pub fn args(job: &CombineJob) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "-hide_banner", "-nostdin", "-nostats",
            "-loglevel", "warning",
            "-progress", "pipe:1",
            "-y",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.push("-i".into());
        args.push(job.video.clone().into_os_string());
        args.push("-i".into());
        args.push(job.audio.clone().into_os_string());
        for a in [
            "-map", "0:v:0",
            "-map", "1:a:0",
            "-c:v", "copy",
            "-c:a", job.audio_codec.as_str(),
            "-b:a", job.audio_bitrate.as_str(),
            "-shortest",
            "-movflags", "+faststart",
        ] {
            args.push(a.into());
        }
        args.push(job.output.clone().into_os_string());
        args
    }
}

#[async_trait]
impl MediaTool for FfmpegTool {
    async fn combine(&self, job: &CombineJob) -> MergeResult<()> {
        tracing::info!("running {} on {}", self.program.display(), job.output.display());

        let mut child = Command::new(&self.program)
            .args(Self::args(job))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| MergeError::TranscodeFailed {
                reason: format!("failed to start {}: {e}", self.program.display()),
                diagnostic: String::new(),
            })?;

        let stderr = child.stderr.take();
        let diagnostics = tokio::spawn(async move {
            let mut tail = VecDeque::with_capacity(DIAGNOSTIC_TAIL_LINES);
            if let Some(stderr) = stderr {
                let mut lines = BufReader::new(stderr).split(b'\n');
                while let Ok(Some(raw)) = lines.next_segment().await {
                    if tail.len() == DIAGNOSTIC_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(decode_line(&raw));
                }
            }
            Vec::from(tail).join("\n")
        });

        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).split(b'\n');
            while let Ok(Some(raw)) = lines.next_segment().await {
                log_progress(&decode_line(&raw));
            }
        }

        let status = child.wait().await.map_err(|e| MergeError::TranscodeFailed {
            reason: format!("failed to wait for {}: {e}", self.program.display()),
            diagnostic: String::new(),
        })?;
        let diagnostic = diagnostics.await.unwrap_or_default();

        if status.success() {
            if !diagnostic.is_empty() {
                tracing::debug!("media tool warnings:\n{diagnostic}");
            }
            return Ok(());
        }
        let reason = match status.code() {
            Some(code) => format!("exited with status {code}"),
            None => "terminated by signal".to_string(),
        };
        Err(MergeError::TranscodeFailed { reason, diagnostic })
    }

    async fn probe(&self) -> MergeResult<String> {
        let output = Command::new(&self.program)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| MergeError::TranscodeFailed {
                reason: format!("failed to start {}: {e}", self.program.display()),
                diagnostic: String::new(),
            })?;
        if !output.status.success() {
            return Err(MergeError::TranscodeFailed {
                reason: format!("{} -version failed", self.program.display()),
                diagnostic: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
    }
}

/// Tool output may carry non-UTF-8 bytes from metadata or paths.
fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).trim_end_matches('\r').to_string()
}

fn log_progress(line: &str) {
    match line.split_once('=') {
        Some(("out_time", t)) => tracing::debug!(out_time = t, "media tool progress"),
        Some(("progress", "end")) => tracing::debug!("media tool finished writing"),
        _ => {}
    }
}
