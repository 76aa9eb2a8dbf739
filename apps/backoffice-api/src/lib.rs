//! # backoffice-api: REST Server for TripDesk
//!
//! JSON over HTTP for the agency's web UI. All business rules live in
//! `tripdesk-core`; all persistence in `tripdesk-db`.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Web UI ──► axum Router ──► handler ──► Repository ──► SQLite           │
//! │                 │              │            │                           │
//! │                 │              │            └── DbError / CoreError     │
//! │                 │              ▼                        │               │
//! │                 │          Json<T> ◄── ApiError ◄───────┘               │
//! │                 │                     (status + {code, message})        │
//! │                 ▼                                                       │
//! │             /health, /api/v1/*                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`config`] - Environment configuration
//! - [`error`] - API error type and HTTP status mapping
//! - [`extract`] - Extractors that reject with [`ApiError`]
//! - [`routes`] - Resource handlers
//! - [`state`] - Shared handler state
//! - [`telemetry`] - Tracing subscriber

use axum::routing::get;
use axum::Router;

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::AppState;

/// Builds the full application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .nest("/api/v1", routes::api_v1())
        .with_state(state)
}
