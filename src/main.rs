//! graphql-ws gateway (demo binary)
//!
//! Serves the negotiating handler with an echo engine standing in for a real
//! GraphQL protocol engine.
//!
//! ```text
//!     Client ──HTTP──▶ ┌────────────┐  no graphql-ws  ┌───────────────┐
//!                      │ negotiator │────────────────▶│ JSON fallback │
//!                      └─────┬──────┘                 └───────────────┘
//!                            │ graphql-ws offered
//!                            ▼
//!                 context pipeline (connection id, forwarded headers)
//!                            │
//!                            ▼
//!                 upgrade → detached task → EchoEngine
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::ws::{Message, WebSocket},
    http::header,
    routing::any,
    Json,
};
use clap::Parser;
use futures_util::future::BoxFuture;
use serde_json::json;
use tokio::net::TcpListener;

use graphql_ws_gateway::config::{load_config, GatewayConfig};
use graphql_ws_gateway::context::{connection_id, forward_headers, ConnectionContext, ConnectionId};
use graphql_ws_gateway::lifecycle::{shutdown_signal, Shutdown};
use graphql_ws_gateway::observability::{logging::init_logging, metrics::init_metrics};
use graphql_ws_gateway::{new_handler_func, with_context_generator, GatewayServer, ProtocolEngine};

#[derive(Parser)]
#[command(name = "graphql-ws-gateway")]
#[command(about = "Negotiates graphql-ws upgrades in front of an HTTP handler", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

/// Sends every text and binary frame back to the client.
struct EchoEngine;

impl ProtocolEngine for EchoEngine {
    fn connect(self: Arc<Self>, ctx: ConnectionContext, mut socket: WebSocket) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            while let Some(Ok(message)) = socket.recv().await {
                if matches!(message, Message::Close(_)) {
                    break;
                }
                let echo = matches!(message, Message::Text(_) | Message::Binary(_));
                if echo && socket.send(message).await.is_err() {
                    break;
                }
            }
            if let Some(id) = ctx.get::<ConnectionId>() {
                tracing::debug!(connection_id = %id, "Echo connection finished");
            }
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    init_logging(&config.observability);
    tracing::info!(
        bind_address = %config.listener.bind_address,
        path = %config.endpoint.path,
        panic_policy = ?config.websocket.panic_policy,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let fallback = any(|| async {
        Json(json!({
            "error": "this endpoint only serves the graphql-ws subprotocol",
        }))
    });

    let handler = new_handler_func(
        Arc::new(EchoEngine),
        fallback,
        [
            with_context_generator(connection_id()),
            with_context_generator(forward_headers([header::AUTHORIZATION])),
        ],
    )
    .with_websocket_config(config.websocket.clone());

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = GatewayServer::new(config, handler);

    let shutdown = Shutdown::new();
    let server_task = tokio::spawn(server.run(listener, shutdown.signal()));

    shutdown_signal().await;
    shutdown.trigger();
    server_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
