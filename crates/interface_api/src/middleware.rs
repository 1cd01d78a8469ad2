//! API middleware

use axum::{
    body::Body,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::info;

use core_kernel::OperationMetadata;

/// Header naming the acting user, recorded in the audit log
pub const USER_HEADER: &str = "x-user-id";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
}

/// Builds the audit metadata for a request from its headers
pub fn request_metadata(headers: &HeaderMap) -> OperationMetadata {
    let metadata = match header_value(headers, REQUEST_ID_HEADER) {
        Some(id) => OperationMetadata::with_correlation_id(id),
        None => OperationMetadata::default(),
    };
    match header_value(headers, USER_HEADER) {
        Some(user) => metadata.initiated_by(user),
        None => metadata,
    }
}

/// Audit logging middleware
///
/// Logs every API request with its user, correlation id, status and latency.
pub async fn audit_middleware(mut request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let metadata = request_metadata(request.headers());
    request.extensions_mut().insert(metadata.clone());

    let start = Utc::now();

    let response = next.run(request).await;

    let duration = Utc::now() - start;
    let status = response.status();

    info!(
        method = %method,
        uri = %uri,
        user = metadata.initiated_by.as_deref().unwrap_or("anonymous"),
        request_id = metadata.correlation_id.as_deref().unwrap_or("-"),
        status = %status.as_u16(),
        duration_ms = duration.num_milliseconds(),
        "API request"
    );

    response
}
