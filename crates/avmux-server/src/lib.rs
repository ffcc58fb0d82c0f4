//! HTTP server for avmux.
//!
//! Exposes the merge pipeline over a small JSON API: a service descriptor,
//! a liveness probe, and `POST /merge`.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::AvmuxServer;
pub use state::AppState;
