//! Extraction of the protocol-relevant request headers.

use axum::http::{HeaderMap, HeaderName, header};

use printmaps_core::TransportHeaders;

pub fn transport_headers(headers: &HeaderMap) -> TransportHeaders {
    TransportHeaders {
        content_type: header_value(headers, header::CONTENT_TYPE),
        accept: header_value(headers, header::ACCEPT),
    }
}

/// Header value as text; non-UTF-8 values are kept lossily so they still
/// fail validation with a readable detail.
fn header_value(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}
