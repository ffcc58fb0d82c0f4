use serde::{Deserialize, Serialize};

pub const VIDEO_URL_FIELD: &str = "videoUrl";
pub const AUDIO_URL_FIELD: &str = "audioUrl";

/// Fields every merge request must carry.
pub const REQUIRED_FIELDS: [&str; 2] = [VIDEO_URL_FIELD, AUDIO_URL_FIELD];

pub const SUCCESS_MESSAGE: &str = "Video and audio merged successfully";

/// Body of `POST /merge`.
///
/// Both locators are optional at the serde layer so that an absent field
/// reaches validation instead of being rejected by the deserializer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

impl MergeRequest {
    pub fn new(video_url: impl Into<String>, audio_url: impl Into<String>) -> Self {
        Self { video_url: Some(video_url.into()), audio_url: Some(audio_url.into()) }
    }

    /// Names of required fields that are absent or empty, in wire order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(&self.video_url) {
            missing.push(VIDEO_URL_FIELD);
        }
        if is_blank(&self.audio_url) {
            missing.push(AUDIO_URL_FIELD);
        }
        missing
    }
}

fn is_blank(field: &Option<String>) -> bool {
    field.as_deref().map(str::trim).map_or(true, str::is_empty)
}

/// Per-stage byte counts and timing of a successful merge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeStats {
    pub input_video_size: u64,
    pub input_audio_size: u64,
    pub output_size: u64,
    /// Wall-clock seconds, rounded to two decimals.
    pub processing_time: f64,
    /// Output size in MiB, rounded to two decimals.
    #[serde(rename = "outputSizeMB")]
    pub output_size_mb: f64,
}

impl MergeStats {
    pub fn new(
        input_video_size: u64,
        input_audio_size: u64,
        output_size: u64,
        elapsed_secs: f64,
    ) -> Self {
        Self {
            input_video_size,
            input_audio_size,
            output_size,
            processing_time: round2(elapsed_secs),
            output_size_mb: round2(output_size as f64 / (1024.0 * 1024.0)),
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// `200 OK` body of `POST /merge`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MergeResponse {
    pub success: bool,
    pub base64: String,
    pub stats: MergeStats,
    pub message: String,
}

impl MergeResponse {
    pub fn new(base64: String, stats: MergeStats) -> Self {
        Self { success: true, base64, stats, message: SUCCESS_MESSAGE.into() }
    }
}

/// `400 Bad Request` body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingFieldsResponse {
    pub error: String,
    pub required: Vec<String>,
}

impl MissingFieldsResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            required: REQUIRED_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// `500 Internal Server Error` body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureResponse {
    pub success: bool,
    pub error: String,
    pub details: String,
}

impl FailureResponse {
    pub fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self { success: false, error: error.into(), details: details.into() }
    }
}
