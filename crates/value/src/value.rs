//! The unified [`Value`] enum.
//!
//! Every argument flowing through sigcast is a `Value`. The model is closed on
//! purpose: casters dispatch over these variants instead of runtime type
//! introspection.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::kind::ValueKind;

// ============================================================================
// CLASS METADATA / OBJECTS
// ============================================================================

/// Metadata shared by every instance of a user-defined nominal type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassMeta {
    name: String,
    bases: Vec<String>,
    methods: Vec<String>,
}

impl ClassMeta {
    /// Creates metadata for a class without bases or declared methods.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bases: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Adds a base class name.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.bases.push(base.into());
        self
    }

    /// Declares a method instances of this class answer to.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.methods.push(method.into());
        self
    }

    /// The class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of all declared base classes.
    #[must_use]
    pub fn bases(&self) -> &[String] {
        &self.bases
    }

    /// Declared method names.
    #[must_use]
    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    /// True when `name` is this class or one of its bases.
    #[must_use]
    pub fn is_subclass_of(&self, name: &str) -> bool {
        self.name == name || self.bases.iter().any(|base| base == name)
    }
}

/// An instance of a user-defined nominal type: class metadata plus ordered fields.
#[derive(Debug, Clone)]
pub struct Object {
    class: Arc<ClassMeta>,
    fields: IndexMap<String, Value>,
}

impl Object {
    /// Creates an instance of `class` holding `fields`.
    pub fn new(class: Arc<ClassMeta>, fields: IndexMap<String, Value>) -> Self {
        Self { class, fields }
    }

    /// The instance's class.
    #[must_use]
    pub fn class(&self) -> &ClassMeta {
        &self.class
    }

    /// All fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &IndexMap<String, Value> {
        &self.fields
    }

    /// Looks up a single field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Consumes the object and returns its fields.
    #[must_use]
    pub fn into_fields(self) -> IndexMap<String, Value> {
        self.fields
    }

    /// Whether the instance answers to `method`.
    #[must_use]
    pub fn has_method(&self, method: &str) -> bool {
        self.class.methods.iter().any(|m| m == method) || ValueKind::Object.has_method(method)
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.class.name == other.class.name && self.fields == other.fields
    }
}

impl Eq for Object {}

impl Hash for Object {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Field order does not take part in equality, so only order-free parts are hashed.
        self.class.name.hash(state);
        self.fields.len().hash(state);
    }
}

// ============================================================================
// VALUE
// ============================================================================

/// A dynamically typed value.
///
/// `Empty` is the "argument omitted" marker. It equals itself and nothing else;
/// in particular it is distinct from `None`, which is an explicitly supplied null.
///
/// Float equality treats all NaNs as equal and `+0.0 == -0.0`, which makes
/// `Value` usable as a set member and dict key.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// No value supplied.
    #[default]
    Empty,
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Set(IndexSet<Value>),
    Dict(IndexMap<Value, Value>),
    Object(Object),
}

impl Value {
    // ==================== Constructors ====================

    /// Builds a list value.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Builds a tuple value.
    pub fn tuple<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Self::Tuple(items.into_iter().map(Into::into).collect())
    }

    /// Builds a set value, dropping duplicates while keeping first-seen order.
    pub fn set<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Self::Set(items.into_iter().map(Into::into).collect())
    }

    /// Builds a dict value from key/value pairs.
    pub fn dict<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        Self::Dict(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    // ==================== Classification ====================

    /// The kind of this value.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Empty => ValueKind::Empty,
            Self::None => ValueKind::None,
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Str(_) => ValueKind::Str,
            Self::List(_) => ValueKind::List,
            Self::Tuple(_) => ValueKind::Tuple,
            Self::Set(_) => ValueKind::Set,
            Self::Dict(_) => ValueKind::Dict,
            Self::Object(_) => ValueKind::Object,
        }
    }

    /// Builtin type name; objects report their class name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::Object(obj) => obj.class().name(),
            other => other.kind().name(),
        }
    }

    /// True for the `Empty` marker.
    #[must_use]
    pub const fn is_empty_marker(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// True for an explicit `None`.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Whether the value answers to `method` (structural checks).
    #[must_use]
    pub fn has_method(&self, method: &str) -> bool {
        match self {
            Self::Object(obj) => obj.has_method(method),
            other => other.kind().has_method(method),
        }
    }

    // ==================== Accessors ====================

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The float payload, widening ints.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Elements of a list or tuple.
    #[must_use]
    pub fn as_slice(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) | Self::Tuple(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_dict(&self) -> Option<&IndexMap<Value, Value>> {
        match self {
            Self::Dict(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Length of sized values (`len(x)`).
    #[must_use]
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::Str(s) => Some(s.chars().count()),
            Self::List(items) | Self::Tuple(items) => Some(items.len()),
            Self::Set(items) => Some(items.len()),
            Self::Dict(map) => Some(map.len()),
            Self::Object(obj) if obj.has_method("len") => Some(obj.fields().len()),
            _ => None,
        }
    }

    /// Truthiness, as `bool(x)` sees it.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Empty | Self::None => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Object(_) => true,
            other => other.len().is_some_and(|len| len > 0),
        }
    }

    /// Partial ordering across comparable values.
    ///
    /// Numbers compare across `bool`/`int`/`float`, strings compare
    /// lexicographically, lists and tuples element-wise. Everything else is
    /// incomparable and yields `None`.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Str(a), Self::Str(b)) => Some(a.cmp(b)),
            (Self::List(a), Self::List(b)) | (Self::Tuple(a), Self::Tuple(b)) => {
                compare_sequences(a, b)
            }
            _ => {
                let (a, b) = (self.as_number()?, other.as_number()?);
                a.partial_cmp(&b)
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn as_number(&self) -> Option<f64> {
        match self {
            Self::Bool(b) => Some(f64::from(u8::from(*b))),
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }
}

fn compare_sequences(a: &[Value], b: &[Value]) -> Option<Ordering> {
    for (left, right) in a.iter().zip(b) {
        match left.compare(right)? {
            Ordering::Equal => {}
            unequal => return Some(unequal),
        }
    }
    Some(a.len().cmp(&b.len()))
}

fn float_eq(a: f64, b: f64) -> bool {
    (a.is_nan() && b.is_nan()) || a == b
}

fn float_bits(f: f64) -> u64 {
    if f.is_nan() {
        f64::NAN.to_bits()
    } else if f == 0.0 {
        0.0f64.to_bits()
    } else {
        f.to_bits()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Empty, Self::Empty) | (Self::None, Self::None) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => float_eq(*a, *b),
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) | (Self::Tuple(a), Self::Tuple(b)) => a == b,
            (Self::Set(a), Self::Set(b)) => a == b,
            (Self::Dict(a), Self::Dict(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Empty | Self::None => {}
            Self::Bool(b) => b.hash(state),
            Self::Int(i) => i.hash(state),
            Self::Float(f) => float_bits(*f).hash(state),
            Self::Str(s) => s.hash(state),
            Self::List(items) | Self::Tuple(items) => items.hash(state),
            // Set and dict equality ignore order; hash only what order can't change.
            Self::Set(items) => items.len().hash(state),
            Self::Dict(map) => map.len().hash(state),
            Self::Object(obj) => obj.hash(state),
        }
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

impl From<IndexMap<Value, Value>> for Value {
    fn from(v: IndexMap<Value, Value>) -> Self {
        Self::Dict(v)
    }
}

impl From<Object> for Value {
    fn from(v: Object) -> Self {
        Self::Object(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::None, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Self::None,
            Json::Bool(b) => Self::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Self::Str(s),
            Json::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Json::Object(map) => Self::Dict(
                map.into_iter()
                    .map(|(k, v)| (Self::Str(k), Self::from(v)))
                    .collect(),
            ),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
