//! Handler options.
//!
//! Options are applied once, in call order, when a handler is built. The
//! resulting [`Options`] is frozen behind an `Arc` and only read afterwards.

use std::fmt;
use std::sync::Arc;

use crate::context::ContextGenerator;

/// Immutable handler configuration: the ordered context pipeline.
#[derive(Clone, Default)]
pub struct Options {
    generators: Vec<Arc<dyn ContextGenerator>>,
}

impl Options {
    /// Apply `options` in order to an empty configuration.
    pub fn from_options<I>(options: I) -> Self
    where
        I: IntoIterator<Item = HandlerOption>,
    {
        let mut built = Options::default();
        for option in options {
            option.apply(&mut built);
        }
        built
    }

    /// Context generators in registration order.
    pub fn generators(&self) -> &[Arc<dyn ContextGenerator>] {
        &self.generators
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("generators", &self.generators.len())
            .finish()
    }
}

/// A configuration step accepted by [`new_handler_func`](super::new_handler_func).
pub struct HandlerOption(Box<dyn FnOnce(&mut Options) + Send>);

impl HandlerOption {
    fn apply(self, options: &mut Options) {
        (self.0)(options)
    }
}

impl fmt::Debug for HandlerOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HandlerOption")
    }
}

/// Append `generator` to the context pipeline.
///
/// Generators run in the order they were registered, each one building on
/// the context returned by the previous one.
pub fn with_context_generator<G>(generator: G) -> HandlerOption
where
    G: ContextGenerator,
{
    let generator: Arc<dyn ContextGenerator> = Arc::new(generator);
    HandlerOption(Box::new(move |options: &mut Options| options.generators.push(generator)))
}
