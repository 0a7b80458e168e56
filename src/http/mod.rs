//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → negotiator.rs (graphql-ws offered?)
//!         no  → fallback handler
//!         yes → context pipeline → upgrade → subprotocol.rs (confirm)
//!     → handoff.rs (detached task owns the socket)
//!     → protocol engine
//! ```

pub mod handoff;
pub mod negotiator;
pub mod request;
pub mod server;
pub mod subprotocol;

pub use negotiator::NegotiationOutcome;
pub use request::X_REQUEST_ID;
pub use server::GatewayServer;
pub use subprotocol::GRAPHQL_WS;
