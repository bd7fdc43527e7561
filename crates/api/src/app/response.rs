//! Response builder: every reply is a JSON:API document, success or errors.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{debug, error};

use printmaps_core::{ErrorCode, ErrorEntry, ErrorList};
use printmaps_infra::LifecycleError;

/// `Content-Type` of every response.
pub const RESPONSE_MEDIA_TYPE: &str = "application/vnd.api+json; charset=utf-8";

/// Detail of every `9001` entry sent to clients.
const INTERNAL_DETAIL: &str = "internal error";

/// Last-resort body when even an error list cannot be serialized.
const SERIALIZATION_FAILED: &str =
    r#"{"errors":[{"code":"9002","detail":"response serialization failed"}]}"#;

/// Map the outcome of a lifecycle operation to a response.
///
/// `status` is used on success (201 created, 202 accepted, 200 otherwise);
/// rejections become 400 with the error list, internal failures 500 with an
/// opaque entry; the full error only goes to the log.
pub fn respond<T: Serialize>(
    operation: &'static str,
    status: StatusCode,
    result: Result<T, LifecycleError>,
) -> Response {
    match result {
        Ok(payload) => document(status, &payload),
        Err(LifecycleError::Rejected(errors)) => {
            debug!(operation, errors = %errors, "request rejected");
            document(StatusCode::BAD_REQUEST, &errors)
        }
        Err(LifecycleError::Internal(e)) => {
            error!(operation, error = %e, "request failed");
            internal(INTERNAL_DETAIL)
        }
    }
}

/// 500 with a single `9001` entry.
pub fn internal(detail: impl Into<String>) -> Response {
    let errors: ErrorList = ErrorEntry::new(ErrorCode::Internal, detail).into();
    document(StatusCode::INTERNAL_SERVER_ERROR, &errors)
}

/// Pretty-printed JSON:API document with the given status.
pub fn document<T: Serialize + ?Sized>(status: StatusCode, payload: &T) -> Response {
    match serde_json::to_vec_pretty(payload) {
        Ok(body) => with_media_type(status, body),
        Err(e) => {
            error!(error = %e, "response serialization failed");
            let errors: ErrorList = ErrorEntry::new(
                ErrorCode::Serialization,
                format!("response serialization failed: {e}"),
            )
            .into();
            let body = serde_json::to_vec_pretty(&errors)
                .unwrap_or_else(|_| SERIALIZATION_FAILED.as_bytes().to_vec());
            with_media_type(StatusCode::INTERNAL_SERVER_ERROR, body)
        }
    }
}

fn with_media_type(status: StatusCode, body: Vec<u8>) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static(RESPONSE_MEDIA_TYPE))],
        body,
    )
        .into_response()
}
