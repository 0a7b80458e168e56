//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! negotiator / handoff produce:
//!     → logging.rs (structured log events, request and connection IDs)
//!     → metrics.rs (negotiation outcomes, live connections, engine panics)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Every abort point emits one warn event and one counter increment
//! - Metric updates are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
