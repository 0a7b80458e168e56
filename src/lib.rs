//! GraphQL-over-WebSocket negotiation and handoff.
//!
//! Sits in front of an ordinary HTTP handler and, for every request that
//! offers the `graphql-ws` subprotocol, builds a per-connection
//! [`ConnectionContext`], upgrades the connection and hands the socket to a
//! [`ProtocolEngine`]. Everything else goes to the fallback handler untouched.

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod handler;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::schema::GatewayConfig;
pub use context::{ConnectionContext, ContextGenerator};
pub use engine::ProtocolEngine;
pub use error::NegotiationError;
pub use handler::{new_handler, new_handler_func, with_context_generator, GraphQLWsHandler, HandlerOption};
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
