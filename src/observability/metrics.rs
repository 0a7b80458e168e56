//! Metrics collection and exposition.
//!
//! # Metrics
//! - `graphql_ws_negotiations_total` (counter): negotiations by `outcome`
//! - `graphql_ws_active_connections` (gauge): handed-off connections still running
//! - `graphql_ws_handoff_panics_total` (counter): engine panics caught by the handoff task

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::http::negotiator::NegotiationOutcome;

pub const NEGOTIATIONS_TOTAL: &str = "graphql_ws_negotiations_total";
pub const ACTIVE_CONNECTIONS: &str = "graphql_ws_active_connections";
pub const HANDOFF_PANICS_TOTAL: &str = "graphql_ws_handoff_panics_total";

/// Install the Prometheus recorder and serve it on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_outcome(outcome: NegotiationOutcome) {
    counter!(NEGOTIATIONS_TOTAL, "outcome" => outcome.as_str()).increment(1);
}

pub fn connection_opened() {
    gauge!(ACTIVE_CONNECTIONS).increment(1.0);
}

pub fn connection_closed() {
    gauge!(ACTIVE_CONNECTIONS).decrement(1.0);
}

pub fn record_handoff_panic() {
    counter!(HANDOFF_PANICS_TOTAL).increment(1);
}
