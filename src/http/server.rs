//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router and mount the negotiating handler
//! - Wire up middleware (request ID, tracing)
//! - Serve on a listener until shutdown is signalled

use std::convert::Infallible;
use std::future::Future;

use axum::{body::Body, http::Request, response::IntoResponse, Router};
use tokio::net::TcpListener;
use tower::Service;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::http::request::request_id_header;

/// HTTP server fronting a `graphql-ws` handler.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
}

impl GatewayServer {
    /// Create a server that routes `config.endpoint.path` to `handler`.
    pub fn new<S>(config: GatewayConfig, handler: S) -> Self
    where
        S: Service<Request<Body>, Error = Infallible> + Clone + Send + Sync + 'static,
        S::Response: IntoResponse,
        S::Future: Send + 'static,
    {
        let router = Self::build_router(&config, handler);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router<S>(config: &GatewayConfig, handler: S) -> Router
    where
        S: Service<Request<Body>, Error = Infallible> + Clone + Send + Sync + 'static,
        S::Response: IntoResponse,
        S::Future: Send + 'static,
    {
        let x_request_id = request_id_header();
        Router::new()
            .route_service(&config.endpoint.path, handler)
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
    }

    /// Run the server until `shutdown` resolves.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            path = %self.config.endpoint.path,
            "graphql-ws gateway starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("graphql-ws gateway stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The fully layered router, for embedding in a larger application.
    pub fn into_router(self) -> Router {
        self.router
    }
}
