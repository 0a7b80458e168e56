//! Protocol engine seam.
//!
//! The engine owns everything that happens on an upgraded socket: message
//! framing, query dispatch, subscription teardown and closing the socket.
//! This crate only decides when to call it.

use std::sync::Arc;

use axum::extract::ws::WebSocket;
use futures_util::future::BoxFuture;

use crate::context::ConnectionContext;

/// External engine serving `graphql-ws` over an upgraded socket.
///
/// `connect` is called exactly once per successfully negotiated connection,
/// from a detached task. The `Arc<Self>` receiver is the service reference
/// the engine resolves queries against.
pub trait ProtocolEngine: Send + Sync + 'static {
    fn connect(self: Arc<Self>, ctx: ConnectionContext, socket: WebSocket) -> BoxFuture<'static, ()>;
}
