//! Shared utilities for integration testing.
#![allow(dead_code)]

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::ws::{Message, WebSocket},
    http::Request,
    response::IntoResponse,
    routing::{any, MethodRouter},
};
use futures_util::{future::BoxFuture, SinkExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{
    tungstenite::{self, client::IntoClientRequest, handshake::client::Response, http::HeaderValue},
    MaybeTlsStream, WebSocketStream,
};
use tower::Service;

use graphql_ws_gateway::{ConnectionContext, GatewayConfig, GatewayServer, ProtocolEngine, Shutdown};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Per-connection value written by test generators.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker(pub String);

/// Engine that reports every context it receives, sends the context's
/// [`Marker`] (or `none`) as one text frame and closes the socket.
pub struct RecordingEngine {
    contexts: mpsc::UnboundedSender<ConnectionContext>,
}

impl RecordingEngine {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<ConnectionContext>) {
        let (contexts, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { contexts }), rx)
    }
}

impl ProtocolEngine for RecordingEngine {
    fn connect(self: Arc<Self>, ctx: ConnectionContext, mut socket: WebSocket) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            let marker = ctx
                .get::<Marker>()
                .map(|m| m.0.clone())
                .unwrap_or_else(|| "none".to_string());
            let _ = self.contexts.send(ctx);
            let _ = socket.send(Message::Text(marker.into())).await;
            let _ = SinkExt::close(&mut socket).await;
        })
    }
}

/// Fallback that always answers `200 fallback`.
pub fn fallback() -> MethodRouter {
    any(|| async { "fallback" })
}

/// Serve `handler` on an ephemeral port with the default configuration.
pub async fn spawn_gateway<S>(handler: S) -> (SocketAddr, Shutdown)
where
    S: Service<Request<Body>, Error = Infallible> + Clone + Send + Sync + 'static,
    S::Response: IntoResponse,
    S::Future: Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = GatewayServer::new(GatewayConfig::default(), handler);
    let shutdown = Shutdown::new();
    let signal = shutdown.signal();
    tokio::spawn(async move {
        let _ = server.run(listener, signal).await;
    });

    (addr, shutdown)
}

/// Open a WebSocket to the gateway offering `protocols`, with extra headers.
pub async fn connect(
    addr: SocketAddr,
    protocols: &str,
    headers: &[(&'static str, &str)],
) -> Result<(Client, Response), tungstenite::Error> {
    let mut request = format!("ws://{}/graphql", addr).into_client_request()?;
    request
        .headers_mut()
        .insert("sec-websocket-protocol", HeaderValue::from_str(protocols).unwrap());
    for (name, value) in headers {
        request.headers_mut().insert(*name, HeaderValue::from_str(value).unwrap());
    }
    tokio_tungstenite::connect_async(request).await
}
