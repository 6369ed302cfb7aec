//! Default providers.
//!
//! A provider receives the raw argument and returns it unchanged unless it is
//! [`Value::Empty`]. Factories run on every call that needs them, so mutable
//! defaults are never shared between calls.

use std::fmt;

use sigcast_value::Value;

/// Supplies a value for an omitted argument.
pub trait DefaultProvider: Send + Sync {
    fn provide(&self, value: Value) -> Value;
}

/// A fixed default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultValue(pub Value);

impl DefaultValue {
    pub fn new(value: impl Into<Value>) -> Self {
        Self(value.into())
    }

    /// No default: an omitted argument stays `Empty`.
    pub const fn none_given() -> Self {
        Self(Value::Empty)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }
}

impl DefaultProvider for DefaultValue {
    fn provide(&self, value: Value) -> Value {
        if value.is_empty_marker() { self.0.clone() } else { value }
    }
}

/// A default built by a zero-argument function, invoked per call.
#[derive(Clone)]
pub struct DefaultFactory<F> {
    factory: F,
}

impl<F> DefaultFactory<F>
where
    F: Fn() -> Value + Send + Sync,
{
    pub const fn new(factory: F) -> Self {
        Self { factory }
    }
}

impl<F> fmt::Debug for DefaultFactory<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultFactory").finish_non_exhaustive()
    }
}

impl<F> DefaultProvider for DefaultFactory<F>
where
    F: Fn() -> Value + Send + Sync,
{
    fn provide(&self, value: Value) -> Value {
        if value.is_empty_marker() { (self.factory)() } else { value }
    }
}

/// Defaults to `0`.
pub fn zero() -> DefaultValue {
    DefaultValue(Value::Int(0))
}

/// A fresh `[]` per call.
pub fn empty_list() -> DefaultFactory<fn() -> Value> {
    DefaultFactory::<fn() -> Value>::new(|| Value::List(Vec::new()))
}

/// A fresh `{}` per call.
pub fn empty_dict() -> DefaultFactory<fn() -> Value> {
    DefaultFactory::<fn() -> Value>::new(|| Value::Dict(Default::default()))
}

pub fn empty_tuple() -> DefaultFactory<fn() -> Value> {
    DefaultFactory::<fn() -> Value>::new(|| Value::Tuple(Vec::new()))
}

pub fn empty_set() -> DefaultFactory<fn() -> Value> {
    DefaultFactory::<fn() -> Value>::new(|| Value::Set(Default::default()))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_value_only_fills_empty() {
        let default = DefaultValue::new(5);
        assert_eq!(default.provide(Value::Empty), Value::Int(5));
        assert_eq!(default.provide(Value::None), Value::None);
        assert_eq!(DefaultValue::none_given().provide(Value::Empty), Value::Empty);
    }

    #[test]
    fn test_factory_runs_per_call() {
        let calls = AtomicUsize::new(0);
        let factory = DefaultFactory::new(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            Value::List(Vec::new())
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        factory.provide(Value::Empty);
        factory.provide(Value::Empty);
        factory.provide(Value::Int(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_presets() {
        assert_eq!(zero().provide(Value::Empty), Value::Int(0));
        assert_eq!(empty_list().provide(Value::Empty), Value::list(Vec::<Value>::new()));
        assert_eq!(empty_dict().provide(Value::Empty).len(), Some(0));
        assert_eq!(empty_tuple().provide(Value::Empty), Value::Tuple(Vec::new()));
        assert_eq!(empty_set().provide(Value::Empty), Value::Set(Default::default()));
    }
}
