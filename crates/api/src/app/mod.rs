//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: record store, order spool and controller wiring
//! - `routes/`: HTTP routes + handlers
//! - `transport.rs`: header extraction for validation
//! - `response.rs`: JSON:API success and error documents

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::config::Config;
use crate::middleware;

pub mod response;
pub mod routes;
pub mod services;
pub mod transport;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: &Config) -> anyhow::Result<Router> {
    let services = Arc::new(services::build_services(config)?);
    Ok(router(services))
}

/// Router over already-wired services.
pub fn router(services: Arc<services::AppServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::trace_requests))
                .layer(Extension(services)),
        )
}
