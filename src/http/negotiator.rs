//! Upgrade-or-fallback negotiation.
//!
//! # State Machine
//! ```text
//! Start ─┬─ graphql-ws not offered ─→ Fallback (fallback response returned as is)
//!        └─ offered → Negotiating
//!              ├─ generator fails ──────→ ContextFailed   (no response written)
//!              └─ context ready
//!                    ├─ upgrade rejected → UpgradeFailed   (primitive's response)
//!                    └─ upgraded
//!                          ├─ wrong subprotocol → SubprotocolMismatch (socket closed)
//!                          └─ graphql-ws        → HandedOff
//! ```
//!
//! Every terminal state except Fallback is reported only through tracing
//! and metrics; callers just see the HTTP response.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ws::WebSocket, FromRequestParts, WebSocketUpgrade},
    http::{HeaderMap, Request},
    response::{IntoResponse, Response},
};
use futures_util::SinkExt;
use tower::{Service, ServiceExt};

use crate::config::WebSocketConfig;
use crate::engine::ProtocolEngine;
use crate::error::NegotiationError;
use crate::handler::ContextSource;
use crate::http::handoff::handoff;
use crate::http::request::request_id;
use crate::http::subprotocol::{self, GRAPHQL_WS};
use crate::observability::metrics;

/// Terminal state of one negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationOutcome {
    Fallback,
    HandedOff,
    ContextFailed,
    UpgradeFailed,
    SubprotocolMismatch,
}

impl NegotiationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            NegotiationOutcome::Fallback => "fallback",
            NegotiationOutcome::HandedOff => "handed_off",
            NegotiationOutcome::ContextFailed => "context_failed",
            NegotiationOutcome::UpgradeFailed => "upgrade_failed",
            NegotiationOutcome::SubprotocolMismatch => "subprotocol_mismatch",
        }
    }
}

pub(crate) async fn negotiate<E, F>(
    request: Request<Body>,
    source: &ContextSource,
    engine: &Arc<E>,
    fallback: &F,
    websocket: &WebSocketConfig,
) -> Response
where
    E: ProtocolEngine,
    F: Service<Request<Body>, Error = Infallible> + Clone + Send + Sync + 'static,
    F::Response: IntoResponse,
    F::Future: Send,
{
    let request_id = request_id(request.headers());

    if !wants_upgrade(request.headers()) {
        tracing::debug!(
            request_id = %request_id,
            path = %request.uri().path(),
            "graphql-ws not offered, passing to fallback handler"
        );
        metrics::record_outcome(NegotiationOutcome::Fallback);
        return match fallback.clone().oneshot(request).await {
            Ok(response) => response.into_response(),
            Err(never) => match never {},
        };
    }

    let (mut parts, _body) = request.into_parts();

    let ctx = match source.ready_context(&parts) {
        Ok(ctx) => ctx,
        Err(e) => {
            record_abort(&request_id, &NegotiationError::from(e));
            // Nothing is written: the client gets axum's default empty 200.
            return Response::default();
        }
    };

    let upgrade = match WebSocketUpgrade::from_request_parts(&mut parts, &()).await {
        Ok(upgrade) => upgrade,
        Err(rejection) => {
            record_abort(&request_id, &NegotiationError::Upgrade(rejection.body_text()));
            return rejection.into_response();
        }
    };

    tracing::debug!(request_id = %request_id, context_values = ctx.len(), "Upgrading to graphql-ws");

    let engine = Arc::clone(engine);
    let policy = websocket.panic_policy;
    let failed_request_id = request_id.clone();

    configure(upgrade.protocols([GRAPHQL_WS]), websocket)
        .on_failed_upgrade(move |e: axum::Error| {
            record_abort(&failed_request_id, &NegotiationError::Upgrade(e.to_string()));
        })
        .on_upgrade(move |socket| async move {
            // Defensive check: axum only selects a protocol listed in
            // `protocols`, so this branch is not reachable through it today.
            if let Err(e) = subprotocol::confirm(socket.protocol()) {
                record_abort(&request_id, &e);
                close(socket, &request_id).await;
                return;
            }
            metrics::record_outcome(NegotiationOutcome::HandedOff);
            tracing::info!(request_id = %request_id, "graphql-ws connection handed off");
            handoff(ctx, socket, engine, policy);
        })
}

fn configure(mut upgrade: WebSocketUpgrade, websocket: &WebSocketConfig) -> WebSocketUpgrade {
    if let Some(size) = websocket.max_message_size {
        upgrade = upgrade.max_message_size(size);
    }
    if let Some(size) = websocket.max_frame_size {
        upgrade = upgrade.max_frame_size(size);
    }
    if let Some(size) = websocket.write_buffer_size {
        upgrade = upgrade.write_buffer_size(size);
    }
    upgrade
}

fn record_abort(request_id: &str, error: &NegotiationError) {
    let outcome = error.outcome();
    metrics::record_outcome(outcome);
    tracing::warn!(
        request_id = %request_id,
        outcome = outcome.as_str(),
        error = %error,
        "graphql-ws negotiation aborted"
    );
}

async fn close(mut socket: WebSocket, request_id: &str) {
    if let Err(e) = SinkExt::close(&mut socket).await {
        tracing::debug!(request_id = %request_id, error = %e, "Failed to close mismatched socket");
    }
}

/// Whether the request would be upgraded rather than passed to the fallback.
pub fn wants_upgrade(headers: &HeaderMap) -> bool {
    subprotocol::offers(headers, GRAPHQL_WS)
}
