//! Request ID handling.
//!
//! # Responsibilities
//! - Name the correlation header shared by the server layers and the negotiator
//! - Read the ID for log fields
//!
//! # Design Decisions
//! - IDs are assigned by tower-http's `SetRequestIdLayer` as early as possible
//! - Requests that bypassed the server layers log as `unknown`

use axum::http::{HeaderMap, HeaderName};

pub const X_REQUEST_ID: &str = "x-request-id";

pub fn request_id_header() -> HeaderName {
    HeaderName::from_static(X_REQUEST_ID)
}

/// Request ID carried by `headers`, or `unknown`.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}
