//! Subprotocol detection and confirmation.
//!
//! The offered list is read the same way the upgrade primitive reads it:
//! the first `Sec-WebSocket-Protocol` header, split on commas, each entry
//! trimmed. Matching is exact string equality.

use axum::http::{header, HeaderMap, HeaderValue};

use crate::error::NegotiationError;

/// The subprotocol this layer negotiates.
pub const GRAPHQL_WS: &str = "graphql-ws";

/// Subprotocols offered by the client, in the order it listed them.
pub fn offered_subprotocols(headers: &HeaderMap) -> impl Iterator<Item = &str> {
    headers
        .get(header::SEC_WEBSOCKET_PROTOCOL)
        .and_then(|value| value.to_str().ok())
        .into_iter()
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|protocol| !protocol.is_empty())
}

/// Whether the client offered `protocol`.
pub fn offers(headers: &HeaderMap, protocol: &str) -> bool {
    offered_subprotocols(headers).any(|offered| offered == protocol)
}

/// Check the subprotocol an upgraded socket actually negotiated.
pub fn confirm(negotiated: Option<&HeaderValue>) -> Result<(), NegotiationError> {
    match negotiated {
        Some(value) if value.as_bytes() == GRAPHQL_WS.as_bytes() => Ok(()),
        other => Err(NegotiationError::SubprotocolMismatch {
            expected: GRAPHQL_WS,
            negotiated: other.map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned()),
        }),
    }
}
