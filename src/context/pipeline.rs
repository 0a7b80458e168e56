//! Context pipeline: folds generators over a request head.

use std::sync::Arc;

use axum::http::request::Parts;
use thiserror::Error;

use super::ConnectionContext;

/// Boxed error returned by a failing generator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// One step of the context pipeline.
///
/// A generator receives the context built so far and the head of the
/// upgrade request. It returns the context the next step should see. The
/// request is borrowed immutably, so nothing a generator does is visible to
/// the fallback handler or to later HTTP middleware.
pub trait ContextGenerator: Send + Sync + 'static {
    fn build_context(&self, ctx: ConnectionContext, request: &Parts) -> Result<ConnectionContext, BoxError>;
}

/// Adapter turning a closure into a [`ContextGenerator`].
#[derive(Clone, Copy)]
pub struct ContextGeneratorFn<F> {
    f: F,
}

/// Wrap a closure as a [`ContextGenerator`].
///
/// ```ignore
/// let step = context_generator_fn(|ctx, request| {
///     let user = request.headers.get("x-user").cloned();
///     Ok::<_, Infallible>(ctx.with(user))
/// });
/// ```
pub fn context_generator_fn<F, E>(f: F) -> ContextGeneratorFn<F>
where
    F: Fn(ConnectionContext, &Parts) -> Result<ConnectionContext, E> + Send + Sync + 'static,
    E: Into<BoxError>,
{
    ContextGeneratorFn { f }
}

impl<F, E> ContextGenerator for ContextGeneratorFn<F>
where
    F: Fn(ConnectionContext, &Parts) -> Result<ConnectionContext, E> + Send + Sync + 'static,
    E: Into<BoxError>,
{
    fn build_context(&self, ctx: ConnectionContext, request: &Parts) -> Result<ConnectionContext, BoxError> {
        (self.f)(ctx, request).map_err(Into::into)
    }
}

/// A generator failed; the remaining generators were not run.
#[derive(Debug, Error)]
#[error("context generator #{step} failed: {source}")]
pub struct ContextBuildError {
    /// Zero-based position of the failing generator.
    pub step: usize,
    pub source: BoxError,
}

/// Build a connection context by running `generators` left to right,
/// starting from an empty context.
pub fn build_context(
    request: &Parts,
    generators: &[Arc<dyn ContextGenerator>],
) -> Result<ConnectionContext, ContextBuildError> {
    generators
        .iter()
        .enumerate()
        .try_fold(ConnectionContext::new(), |ctx, (step, generator)| {
            generator
                .build_context(ctx, request)
                .map_err(|source| ContextBuildError { step, source })
        })
}
