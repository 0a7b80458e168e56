//! Per-connection execution context.
//!
//! # Data Flow
//! ```text
//! ConnectionContext::new() (empty)
//!     → pipeline.rs (fold every ContextGenerator over the request head)
//!     → ready ConnectionContext
//!     → moved into the handoff task, owned by the protocol engine
//! ```
//!
//! # Design Decisions
//! - Values are keyed by type, one value per type
//! - A context is never mutated: `with` returns a new context
//! - Cloning is an `Arc` bump, so a fixed base context can be reused per connection

pub mod generators;
pub mod pipeline;

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub use generators::{connection_id, forward_headers, require_extension, ConnectionId, ForwardedHeaders, MissingExtension};
pub use pipeline::{build_context, context_generator_fn, BoxError, ContextBuildError, ContextGenerator, ContextGeneratorFn};

type Value = Arc<dyn Any + Send + Sync>;

/// Immutable carrier of values scoped to one WebSocket connection.
#[derive(Clone, Default)]
pub struct ConnectionContext {
    values: Arc<HashMap<TypeId, Value>>,
}

impl ConnectionContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a new context that also carries `value`.
    ///
    /// A value of the same type already present is shadowed in the derived
    /// context; `self` is left as it was.
    pub fn with<T>(&self, value: T) -> Self
    where
        T: Send + Sync + 'static,
    {
        let mut values = HashMap::clone(&self.values);
        values.insert(TypeId::of::<T>(), Arc::new(value));
        Self {
            values: Arc::new(values),
        }
    }

    /// Look up the value stored for type `T`.
    pub fn get<T>(&self) -> Option<&T>
    where
        T: Send + Sync + 'static,
    {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|value| (**value).downcast_ref::<T>())
    }

    pub fn contains<T>(&self) -> bool
    where
        T: Send + Sync + 'static,
    {
        self.values.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for ConnectionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionContext")
            .field("values", &self.values.len())
            .finish()
    }
}
