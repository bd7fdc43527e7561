//! Map job endpoints.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::{get, post},
    Router,
};

use printmaps_infra::{InternalError, LifecycleError};

use crate::app::response::respond;
use crate::app::services::{AppController, AppServices};
use crate::app::transport::transport_headers;

pub fn router() -> Router {
    Router::new()
        .route("/metadata", post(create_metadata).patch(update_metadata))
        .route("/metadata/:id", get(read_metadata))
        .route("/mapfile", post(create_mapfile))
        .route("/mapstate/:id", get(read_mapstate))
}

/// POST /metadata: create a job from client metadata (201).
pub async fn create_metadata(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let transport = transport_headers(&headers);
    let result = blocking(services, move |c| c.create_job(&transport, &body)).await;
    respond("create_metadata", StatusCode::CREATED, result)
}

/// PATCH /metadata: replace metadata of a job not yet ordered (200).
pub async fn update_metadata(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let transport = transport_headers(&headers);
    let result = blocking(services, move |c| c.update_metadata(&transport, &body)).await;
    respond("update_metadata", StatusCode::OK, result)
}

/// GET /metadata/:id
pub async fn read_metadata(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let transport = transport_headers(&headers);
    let result = blocking(services, move |c| c.metadata(&transport, &id)).await;
    respond("read_metadata", StatusCode::OK, result)
}

/// POST /mapfile: submit a build order for an existing job (202).
pub async fn create_mapfile(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let transport = transport_headers(&headers);
    let result = blocking(services, move |c| c.submit_build_order(&transport, &body)).await;
    respond("create_mapfile", StatusCode::ACCEPTED, result)
}

/// GET /mapstate/:id
pub async fn read_mapstate(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let transport = transport_headers(&headers);
    let result = blocking(services, move |c| c.state(&transport, &id)).await;
    respond("read_mapstate", StatusCode::OK, result)
}

/// Run a controller operation on the blocking pool; store and spool I/O is
/// synchronous.
async fn blocking<T, F>(services: Arc<AppServices>, op: F) -> Result<T, LifecycleError>
where
    T: Send + 'static,
    F: FnOnce(&AppController) -> Result<T, LifecycleError> + Send + 'static,
{
    match tokio::task::spawn_blocking(move || op(&services.controller)).await {
        Ok(result) => result,
        Err(e) => Err(InternalError::Worker(e.to_string()).into()),
    }
}
