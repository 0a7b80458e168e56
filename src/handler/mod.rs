//! Handler factory.
//!
//! # Data Flow
//! ```text
//! new_handler(ctx, engine, fallback)             → ContextSource::Fixed(ctx)
//! new_handler_func(engine, fallback, options...) → ContextSource::Pipeline(Arc<Options>)
//!     → GraphQLWsHandler (tower::Service, mountable on an axum Router)
//!     → per request: http::negotiator::negotiate
//! ```
//!
//! # Design Decisions
//! - The two modes are separate context sources; a fixed handler never
//!   looks at options
//! - Options are applied once at construction and shared read-only
//! - The fallback is any infallible tower service, so an axum `Router` or
//!   `MethodRouter` can be used directly

pub mod options;

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::{request::Parts, Request},
    response::{IntoResponse, Response},
};
use futures_util::future::BoxFuture;
use tower::Service;

use crate::config::WebSocketConfig;
use crate::context::{build_context, ConnectionContext, ContextBuildError};
use crate::engine::ProtocolEngine;
use crate::http::negotiator;

pub use options::{with_context_generator, HandlerOption, Options};

/// Where a handler gets the context for each connection.
#[derive(Debug, Clone)]
pub(crate) enum ContextSource {
    /// Every connection reuses this context as is.
    Fixed(ConnectionContext),
    /// Every connection runs the pipeline from an empty context.
    Pipeline(Arc<Options>),
}

impl ContextSource {
    pub(crate) fn ready_context(&self, request: &Parts) -> Result<ConnectionContext, ContextBuildError> {
        match self {
            ContextSource::Fixed(ctx) => Ok(ctx.clone()),
            ContextSource::Pipeline(options) => build_context(request, options.generators()),
        }
    }
}

/// Request handler that upgrades `graphql-ws` requests and falls back to
/// `F` for everything else.
pub struct GraphQLWsHandler<E, F> {
    engine: Arc<E>,
    fallback: F,
    source: ContextSource,
    websocket: WebSocketConfig,
}

/// Build a handler that hands `ctx` to the engine for every connection.
pub fn new_handler<E, F>(ctx: ConnectionContext, engine: Arc<E>, fallback: F) -> GraphQLWsHandler<E, F>
where
    E: ProtocolEngine,
{
    GraphQLWsHandler {
        engine,
        fallback,
        source: ContextSource::Fixed(ctx),
        websocket: WebSocketConfig::default(),
    }
}

/// Build a handler that runs the configured context pipeline for every
/// connection.
pub fn new_handler_func<E, F, I>(engine: Arc<E>, fallback: F, options: I) -> GraphQLWsHandler<E, F>
where
    E: ProtocolEngine,
    I: IntoIterator<Item = HandlerOption>,
{
    GraphQLWsHandler {
        engine,
        fallback,
        source: ContextSource::Pipeline(Arc::new(Options::from_options(options))),
        websocket: WebSocketConfig::default(),
    }
}

impl<E, F> GraphQLWsHandler<E, F>
where
    E: ProtocolEngine,
    F: Service<Request<Body>, Error = Infallible> + Clone + Send + Sync + 'static,
    F::Response: IntoResponse,
    F::Future: Send,
{
    /// Apply WebSocket limits and the handoff panic policy.
    pub fn with_websocket_config(mut self, websocket: WebSocketConfig) -> Self {
        self.websocket = websocket;
        self
    }

    /// Negotiate a single request.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        negotiator::negotiate(request, &self.source, &self.engine, &self.fallback, &self.websocket).await
    }
}

impl<E, F: Clone> Clone for GraphQLWsHandler<E, F> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            fallback: self.fallback.clone(),
            source: self.source.clone(),
            websocket: self.websocket.clone(),
        }
    }
}

impl<E, F> fmt::Debug for GraphQLWsHandler<E, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphQLWsHandler")
            .field("source", &self.source)
            .field("websocket", &self.websocket)
            .finish_non_exhaustive()
    }
}

impl<E, F> Service<Request<Body>> for GraphQLWsHandler<E, F>
where
    E: ProtocolEngine,
    F: Service<Request<Body>, Error = Infallible> + Clone + Send + Sync + 'static,
    F::Response: IntoResponse,
    F::Future: Send,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let handler = self.clone();
        Box::pin(async move { Ok(handler.handle(request).await) })
    }
}
