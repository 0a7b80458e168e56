//! Handoff of upgraded sockets to the protocol engine.
//!
//! # Responsibilities
//! - Spawn one detached task per negotiated connection
//! - Track the number of live handed-off connections
//! - Apply the configured panic policy around the engine
//!
//! # Design Decisions
//! - The `JoinHandle` is dropped: nothing here joins or cancels the task
//! - Context and socket are moved into the task; no reference is kept
//! - Timeouts and cancellation of a live connection belong to the engine

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::extract::ws::WebSocket;
use futures_util::FutureExt;
use tracing::Instrument;

use crate::config::PanicPolicy;
use crate::context::{ConnectionContext, ConnectionId};
use crate::engine::ProtocolEngine;
use crate::observability::metrics;

/// Start `future` on the runtime without keeping a handle to it.
pub fn detach<F>(future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    drop(tokio::spawn(future));
}

/// Hand `socket` and `ctx` to `engine` on a detached task and return
/// immediately.
pub fn handoff<E>(ctx: ConnectionContext, socket: WebSocket, engine: Arc<E>, policy: PanicPolicy)
where
    E: ProtocolEngine,
{
    let connection_id = ctx.get::<ConnectionId>().copied().unwrap_or_default();
    // `connect` is called from inside the detached task so a panic in the
    // engine entry point is covered by the panic policy.
    run_detached(connection_id, policy, async move { engine.connect(ctx, socket).await });
}

/// Run an engine connection future on a detached task under `policy`.
pub(crate) fn run_detached<F>(connection_id: ConnectionId, policy: PanicPolicy, connection: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    let span = tracing::info_span!("graphql_ws_connection", connection_id = %connection_id);
    metrics::connection_opened();

    detach(
        async move {
            tracing::debug!("Protocol engine started");
            let result = AssertUnwindSafe(connection).catch_unwind().await;
            metrics::connection_closed();

            match result {
                Ok(()) => tracing::debug!("Protocol engine finished"),
                Err(panic) => {
                    metrics::record_handoff_panic();
                    tracing::error!(panic = %panic_message(&*panic), "Protocol engine panicked");
                    if policy == PanicPolicy::Abort {
                        std::process::abort();
                    }
                }
            }
        }
        .instrument(span),
    );
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future::BoxFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_detached_future_runs_once() {
        let runs = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = oneshot::channel();
        let counter = runs.clone();

        run_detached(ConnectionId::new(), PanicPolicy::Isolate, async move {
            counter.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send(());
        });

        tokio::time::timeout(Duration::from_secs(1), rx).await.unwrap().unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_returns_before_connection_finishes() {
        let (release_tx, release_rx) = oneshot::channel::<()>();
        let (done_tx, mut done_rx) = oneshot::channel();

        run_detached(ConnectionId::new(), PanicPolicy::Isolate, async move {
            let _ = release_rx.await;
            let _ = done_tx.send(());
        });

        assert!(done_rx.try_recv().is_err());
        release_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), done_rx).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_panic_is_isolated() {
        let (tx, rx) = oneshot::channel::<()>();

        run_detached(ConnectionId::new(), PanicPolicy::Isolate, async move {
            let _keep = tx;
            panic!("engine exploded");
        });

        // The sender is dropped during unwinding instead of being sent on.
        let received = tokio::time::timeout(Duration::from_secs(1), rx).await.unwrap();
        assert!(received.is_err());

        let (tx, rx) = oneshot::channel();
        run_detached(ConnectionId::new(), PanicPolicy::Isolate, async move {
            let _ = tx.send("still serving");
        });
        assert_eq!(rx.await.unwrap(), "still serving");
    }

    fn connect_that_panics() -> BoxFuture<'static, ()> {
        panic!("engine refused connection");
    }

    #[tokio::test]
    async fn test_panic_before_future_is_returned_is_isolated() {
        let (tx, rx) = oneshot::channel::<()>();

        // Mirrors `handoff`: the entry point is invoked inside the task.
        run_detached(ConnectionId::new(), PanicPolicy::Isolate, async move {
            let _keep = tx;
            connect_that_panics().await
        });

        let received = tokio::time::timeout(Duration::from_secs(1), rx).await.unwrap();
        assert!(received.is_err());
    }

    #[test]
    fn test_panic_message() {
        let text: Box<dyn Any + Send> = Box::new("static");
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let other: Box<dyn Any + Send> = Box::new(7u32);
        assert_eq!(panic_message(&*text), "static");
        assert_eq!(panic_message(&*owned), "owned");
        assert_eq!(panic_message(&*other), "non-string panic payload");
    }
}
