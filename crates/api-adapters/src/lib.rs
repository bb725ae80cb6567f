//! # api-adapters
//!
//! HTTP surface of the board service. Everything axum-specific lives behind
//! the `web-axum` feature; [`metrics`] is framework-free.

pub mod metrics;

#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod handlers;
#[cfg(feature = "web-axum")]
pub mod identity;
#[cfg(feature = "web-axum")]
pub mod multipart;
#[cfg(feature = "web-axum")]
pub mod routes;
#[cfg(feature = "web-axum")]
pub mod state;

pub use metrics::Metrics;

#[cfg(feature = "web-axum")]
pub use error::{ApiError, ApiResult};
#[cfg(feature = "web-axum")]
pub use routes::{build_router, route_table, Access, HttpOptions, RouteSpec, Verb};
#[cfg(feature = "web-axum")]
pub use state::{AppState, HealthProbe};
