//! Call arguments going into a validated callable and bound arguments coming out.

use std::ops::Index;

use indexmap::IndexMap;
use sigcast_value::Value;
use thiserror::Error;

/// Raw positional and keyword arguments of a call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallArgs {
    pub positional: Vec<Value>,
    pub named: IndexMap<String, Value>,
}

/// A mapping used for keyword construction had a non-string key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("keywords must be strings, got {0}")]
pub struct NonStringKeyword(pub String);

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Adds a keyword argument, replacing an earlier one with the same name.
    #[must_use]
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }

    /// Keyword arguments only.
    pub fn from_named<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            positional: Vec::new(),
            named: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Expands a value the way construct-by-signature does: a dict becomes
    /// keyword arguments, a list or tuple positional arguments, anything else a
    /// single positional argument.
    pub fn from_value(value: &Value) -> Result<Self, NonStringKeyword> {
        match value {
            Value::Dict(map) => {
                let mut named = IndexMap::with_capacity(map.len());
                for (key, item) in map {
                    let Value::Str(key) = key else {
                        return Err(NonStringKeyword(key.type_name().to_owned()));
                    };
                    named.insert(key.clone(), item.clone());
                }
                Ok(Self {
                    positional: Vec::new(),
                    named,
                })
            }
            Value::List(items) | Value::Tuple(items) => Ok(Self {
                positional: items.clone(),
                named: IndexMap::new(),
            }),
            other => Ok(Self {
                positional: vec![other.clone()],
                named: IndexMap::new(),
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }
}

impl From<serde_json::Value> for CallArgs {
    fn from(json: serde_json::Value) -> Self {
        let value = Value::from(json);
        // JSON object keys are always strings
        Self::from_value(&value).unwrap_or_else(|_| Self::new().arg(value))
    }
}

/// Validated arguments handed to the body of a validated callable, keyed by
/// parameter name in declaration order.
///
/// Optional parameters that were omitted and have no default hold
/// [`Value::Empty`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments {
    values: IndexMap<String, Value>,
    receiver: Option<Value>,
}

static EMPTY: Value = Value::Empty;

impl Arguments {
    pub(crate) fn new(values: IndexMap<String, Value>, receiver: Option<Value>) -> Self {
        Self { values, receiver }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Removes and returns a value, leaving `Empty` lookups for it afterwards.
    pub fn take(&mut self, name: &str) -> Value {
        self.values.shift_remove(name).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_map(self) -> IndexMap<String, Value> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The receiver of a method call.
    pub fn receiver(&self) -> Option<&Value> {
        self.receiver.as_ref()
    }
}

impl Index<&str> for Arguments {
    type Output = Value;

    /// Unknown names index to [`Value::Empty`].
    fn index(&self, name: &str) -> &Value {
        self.values.get(name).unwrap_or(&EMPTY)
    }
}
