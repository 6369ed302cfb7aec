//! Value kinds and method-presence tables.
//!
//! [`ValueKind`] is a lightweight classification of [`Value`](crate::Value).
//! Each builtin kind also exposes the set of method names a value of that kind
//! answers to, which is what structural (protocol) checks look at.

use std::fmt;

/// Represents the kind of a [`Value`](crate::Value).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ValueKind {
    /// The "argument omitted" marker.
    Empty,
    None,
    Bool,
    Int,
    Float,
    Str,
    List,
    Tuple,
    Set,
    Dict,
    /// An instance of a user-defined nominal type.
    Object,
}

const COMMON: &[&str] = &["eq", "ne", "repr", "str"];
const HASHABLE: &[&str] = &["hash"];
const ORDERED: &[&str] = &["lt", "le", "gt", "ge"];
const NUMERIC: &[&str] = &[
    "add", "sub", "mul", "truediv", "floordiv", "mod", "pow", "neg", "abs", "int", "float", "bool",
    "round",
];
const SIZED_ITERABLE: &[&str] = &["len", "iter", "contains"];
const STR_METHODS: &[&str] = &[
    "getitem", "add", "mul", "upper", "lower", "strip", "split", "join", "startswith",
    "endswith", "replace", "format", "find", "count", "index",
];
const LIST_METHODS: &[&str] = &[
    "getitem", "setitem", "delitem", "add", "mul", "append", "extend", "insert", "pop",
    "remove", "clear", "sort", "reverse", "index", "count", "copy",
];
const TUPLE_METHODS: &[&str] = &["getitem", "add", "mul", "index", "count"];
const SET_METHODS: &[&str] = &[
    "add", "remove", "discard", "pop", "clear", "union", "intersection", "difference",
    "issubset", "issuperset", "copy",
];
const DICT_METHODS: &[&str] = &[
    "getitem", "setitem", "delitem", "keys", "values", "items", "get", "pop", "update",
    "setdefault", "clear", "copy",
];

impl ValueKind {
    /// Builtin type name of the kind (`NoneType`, `int`, `list`, ...).
    ///
    /// Objects report `object`; use [`Value::type_name`](crate::Value::type_name)
    /// to get the class name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Empty => "Empty",
            Self::None => "NoneType",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::List => "list",
            Self::Tuple => "tuple",
            Self::Set => "set",
            Self::Dict => "dict",
            Self::Object => "object",
        }
    }

    /// Returns true for `bool`, `int` and `float`.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Bool | Self::Int | Self::Float)
    }

    /// Returns true for the builtin containers.
    #[must_use]
    pub const fn is_container(self) -> bool {
        matches!(self, Self::List | Self::Tuple | Self::Set | Self::Dict)
    }

    /// Whether a value of this kind answers to `method`.
    ///
    /// Only builtin behaviour is covered; objects additionally expose the
    /// methods declared on their class.
    #[must_use]
    pub fn has_method(self, method: &str) -> bool {
        self.method_tables()
            .iter()
            .any(|table| table.contains(&method))
    }

    fn method_tables(self) -> &'static [&'static [&'static str]] {
        match self {
            Self::Empty => &[],
            Self::None | Self::Object => &[COMMON, HASHABLE],
            Self::Bool | Self::Int | Self::Float => &[COMMON, HASHABLE, ORDERED, NUMERIC],
            Self::Str => &[COMMON, HASHABLE, ORDERED, SIZED_ITERABLE, STR_METHODS],
            Self::List => &[COMMON, ORDERED, SIZED_ITERABLE, LIST_METHODS],
            Self::Tuple => &[COMMON, HASHABLE, ORDERED, SIZED_ITERABLE, TUPLE_METHODS],
            Self::Set => &[COMMON, SIZED_ITERABLE, SET_METHODS],
            Self::Dict => &[COMMON, SIZED_ITERABLE, DICT_METHODS],
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sized_kinds() {
        for kind in [ValueKind::Str, ValueKind::List, ValueKind::Dict, ValueKind::Set] {
            assert!(kind.has_method("len"), "{kind} should be sized");
        }
        assert!(!ValueKind::Int.has_method("len"));
    }

    #[test]
    fn test_empty_has_no_methods() {
        assert!(!ValueKind::Empty.has_method("eq"));
    }

    #[test]
    fn test_names() {
        assert_eq!(ValueKind::None.name(), "NoneType");
        assert_eq!(ValueKind::Tuple.to_string(), "tuple");
    }
}
