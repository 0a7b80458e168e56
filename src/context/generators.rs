//! Ready-made context generators.
//!
//! # Responsibilities
//! - Tag each connection with a unique ID
//! - Copy selected request headers into the context
//! - Promote values placed in request extensions by earlier middleware
//!   (authentication, tenancy) into the context

use std::convert::Infallible;
use std::fmt;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use thiserror::Error;
use uuid::Uuid;

use super::pipeline::{context_generator_fn, ContextGenerator};
use super::ConnectionContext;

/// Unique identifier of one upgraded connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Request headers copied into the context by [`forward_headers`].
#[derive(Debug, Clone, Default)]
pub struct ForwardedHeaders(HeaderMap);

impl ForwardedHeaders {
    pub fn get(&self, name: &HeaderName) -> Option<&HeaderValue> {
        self.0.get(name)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.0
    }
}

/// A required request extension was not present.
#[derive(Debug, Error)]
#[error("request extension `{type_name}` is missing")]
pub struct MissingExtension {
    pub type_name: &'static str,
}

/// Store a fresh [`ConnectionId`] in the context.
pub fn connection_id() -> impl ContextGenerator {
    context_generator_fn(|ctx, _request| Ok::<_, Infallible>(ctx.with(ConnectionId::new())))
}

/// Copy the named headers (all values of each) into [`ForwardedHeaders`].
/// Headers the client did not send are skipped.
pub fn forward_headers<I>(names: I) -> impl ContextGenerator
where
    I: IntoIterator<Item = HeaderName>,
{
    let names: Vec<HeaderName> = names.into_iter().collect();
    context_generator_fn(move |ctx: ConnectionContext, request| {
        let mut forwarded = HeaderMap::new();
        for name in &names {
            for value in request.headers.get_all(name) {
                forwarded.append(name.clone(), value.clone());
            }
        }
        Ok::<_, Infallible>(ctx.with(ForwardedHeaders(forwarded)))
    })
}

/// Copy the request extension `T` into the context, failing the pipeline
/// with [`MissingExtension`] when it is absent.
pub fn require_extension<T>() -> impl ContextGenerator
where
    T: Clone + Send + Sync + 'static,
{
    context_generator_fn(|ctx: ConnectionContext, request| match request.extensions.get::<T>() {
        Some(value) => Ok(ctx.with(value.clone())),
        None => Err(MissingExtension {
            type_name: std::any::type_name::<T>(),
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, request::Parts, Request};

    #[derive(Debug, Clone, PartialEq)]
    struct Identity(String);

    fn parts_with(build: impl FnOnce(&mut Request<()>)) -> Parts {
        let mut request = Request::builder()
            .uri("/graphql")
            .header(header::AUTHORIZATION, "Bearer token")
            .header("x-trace", "one")
            .header("x-trace", "two")
            .body(())
            .unwrap();
        build(&mut request);
        request.into_parts().0
    }

    #[test]
    fn test_connection_id_is_unique() {
        let parts = parts_with(|_| {});
        let generator = connection_id();
        let a = generator.build_context(ConnectionContext::new(), &parts).unwrap();
        let b = generator.build_context(ConnectionContext::new(), &parts).unwrap();
        assert_ne!(a.get::<ConnectionId>(), b.get::<ConnectionId>());
    }

    #[test]
    fn test_forward_headers_copies_selected() {
        let parts = parts_with(|_| {});
        let generator = forward_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-trace"),
            HeaderName::from_static("x-absent"),
        ]);

        let ctx = generator.build_context(ConnectionContext::new(), &parts).unwrap();
        let forwarded = ctx.get::<ForwardedHeaders>().unwrap();

        assert_eq!(forwarded.get(&header::AUTHORIZATION).unwrap(), "Bearer token");
        assert_eq!(forwarded.headers().get_all("x-trace").iter().count(), 2);
        assert!(forwarded.get(&HeaderName::from_static("x-absent")).is_none());
    }

    #[test]
    fn test_require_extension_present() {
        let parts = parts_with(|req| {
            req.extensions_mut().insert(Identity("alice".into()));
        });
        let ctx = require_extension::<Identity>()
            .build_context(ConnectionContext::new(), &parts)
            .unwrap();
        assert_eq!(ctx.get::<Identity>(), Some(&Identity("alice".into())));
    }

    #[test]
    fn test_require_extension_missing() {
        let parts = parts_with(|_| {});
        let err = require_extension::<Identity>()
            .build_context(ConnectionContext::new(), &parts)
            .unwrap_err();
        assert!(err.to_string().contains("Identity"));
    }
}
