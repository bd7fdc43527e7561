use axum::Router;

pub mod maps;
pub mod system;

/// Base path of the map job API.
pub const API_BASE: &str = "/api/beta2/maps";

/// Router for all map job endpoints.
pub fn router() -> Router {
    Router::new().nest(API_BASE, maps::router())
}
