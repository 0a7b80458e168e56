//! Negotiation error kinds.
//!
//! None of these reach the caller of the handler: each one aborts the
//! negotiation where it happens and is reported through tracing and metrics.

use thiserror::Error;

use crate::context::ContextBuildError;
use crate::http::negotiator::NegotiationOutcome;

#[derive(Debug, Error)]
pub enum NegotiationError {
    /// A context generator failed before the upgrade was attempted.
    #[error(transparent)]
    ContextBuild(#[from] ContextBuildError),

    /// The upgrade primitive rejected the handshake or the upgrade failed.
    #[error("websocket upgrade failed: {0}")]
    Upgrade(String),

    /// The upgraded socket negotiated a different subprotocol.
    #[error("negotiated subprotocol {negotiated:?} does not match `{expected}`")]
    SubprotocolMismatch {
        expected: &'static str,
        negotiated: Option<String>,
    },
}

impl NegotiationError {
    /// Terminal negotiation state this error leads to.
    pub fn outcome(&self) -> NegotiationOutcome {
        match self {
            NegotiationError::ContextBuild(_) => NegotiationOutcome::ContextFailed,
            NegotiationError::Upgrade(_) => NegotiationOutcome::UpgradeFailed,
            NegotiationError::SubprotocolMismatch { .. } => NegotiationOutcome::SubprotocolMismatch,
        }
    }
}
