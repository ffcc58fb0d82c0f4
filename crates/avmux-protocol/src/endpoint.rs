use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SERVICE_NAME: &str = "avmux";

/// HTTP endpoint paths served by avmux.
pub mod endpoints {
    pub const ROOT: &str = "/";
    pub const HEALTH: &str = "/health";
    pub const MERGE: &str = "/merge";

    /// Human-readable listing used by the service descriptor.
    pub const LISTING: [&str; 3] = ["GET /", "GET /health", "POST /merge"];
}

/// Liveness response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    pub fn now() -> Self {
        Self { status: "ok".into(), timestamp: Utc::now() }
    }
}

/// Service descriptor returned from the root path.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub status: String,
    pub service: String,
    pub version: String,
    /// First line of the media tool's version banner, if it could be run.
    pub tool: Option<String>,
    pub endpoints: Vec<String>,
}

impl ServiceInfo {
    pub fn running(tool: Option<String>) -> Self {
        Self {
            status: "running".into(),
            service: SERVICE_NAME.into(),
            version: env!("CARGO_PKG_VERSION").into(),
            tool,
            endpoints: endpoints::LISTING.iter().map(|e| e.to_string()).collect(),
        }
    }
}
