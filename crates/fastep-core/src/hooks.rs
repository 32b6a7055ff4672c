//! # Hook Chains
//!
//! A [`Filter`] is an ordered list of callbacks for one interception point.
//! The component that owns the filter decides the callback signature and
//! threads the current value through every handler in registration order:
//!
//! ```
//! use fastep_core::Filter;
//!
//! let mut double: Filter<dyn Fn(i64) -> i64 + Send + Sync> = Filter::new();
//! double.add(Box::new(|v| v * 2));
//! double.add(Box::new(|v| v + 1));
//! let out = double.iter().fold(5, |acc, handler| handler(acc));
//! assert_eq!(out, 11);
//! ```

use std::fmt;

/// Ordered list of boxed handlers of type `F`.
pub struct Filter<F: ?Sized> {
    handlers: Vec<Box<F>>,
}

impl<F: ?Sized> Filter<F> {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Append a handler. Handlers run in the order they were added.
    pub fn add(&mut self, handler: Box<F>) {
        self.handlers.push(handler);
    }

    /// Handlers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &F> {
        self.handlers.iter().map(|handler| handler.as_ref())
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<F: ?Sized> Default for Filter<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized> fmt::Debug for Filter<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Labeler = dyn Fn(String, &str) -> String + Send + Sync;

    #[test]
    fn test_handlers_run_in_registration_order() {
        let mut chain: Filter<Labeler> = Filter::new();
        chain.add(Box::new(|acc: String, ctx: &str| format!("{acc}-a{ctx}")));
        chain.add(Box::new(|acc: String, ctx: &str| format!("{acc}-b{ctx}")));

        let out = chain.iter().fold("start".to_string(), |acc, h| h(acc, "!"));
        assert_eq!(out, "start-a!-b!");
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn test_empty_chain_passes_value_through() {
        let chain: Filter<Labeler> = Filter::default();
        assert!(chain.is_empty());
        let out = chain.iter().fold("untouched".to_string(), |acc, h| h(acc, ""));
        assert_eq!(out, "untouched");
    }

    #[test]
    fn test_debug_reports_handler_count() {
        let mut chain: Filter<Labeler> = Filter::new();
        chain.add(Box::new(|acc: String, _: &str| acc));
        assert_eq!(format!("{chain:?}"), "Filter { handlers: 1 }");
    }
}
