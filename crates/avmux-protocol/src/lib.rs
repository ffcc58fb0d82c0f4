//! Wire types for the avmux merge service.
//!
//! Defines the JSON bodies exchanged over HTTP between clients and the
//! merge server, along with the endpoint paths they travel on.

pub mod endpoint;
pub mod message;

pub use endpoint::{endpoints, HealthResponse, ServiceInfo, SERVICE_NAME};
pub use message::{
    FailureResponse, MergeRequest, MergeResponse, MergeStats, MissingFieldsResponse,
    AUDIO_URL_FIELD, REQUIRED_FIELDS, SUCCESS_MESSAGE, VIDEO_URL_FIELD,
};
