//! Container casters: homogeneous sequences and sets, tuples, mappings.
//!
//! Casting a string first tries to read it as a restricted literal, so
//! `"[1, 2]"` casts to `list[int]`. Elements go through the element caster's
//! lenient `call`: already valid elements are kept as they are, and the first
//! element that fails aborts the whole cast.

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use sigcast_value::{Value, convert, parse_literal};

use super::caster::{CastError, Caster, SharedCaster};
use super::decl::TypeDecl;
use super::factory::CasterFactory;
use crate::error::ResolveError;

/// A string holding a container literal is replaced by the parsed container.
fn literal_source(value: &Value) -> Value {
    match value {
        Value::Str(s) => match parse_literal(s) {
            Ok(parsed @ (Value::List(_) | Value::Tuple(_) | Value::Set(_) | Value::Dict(_))) => parsed,
            _ => value.clone(),
        },
        other => other.clone(),
    }
}

fn cast_items(
    items: Vec<Value>,
    mut caster_for: impl FnMut(usize) -> Option<SharedCaster>,
) -> Result<Vec<Value>, CastError> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match caster_for(index) {
            Some(caster) => caster.call(&item, false),
            None => Ok(item),
        })
        .collect()
}

// ============================================================================
// SEQUENCES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SequenceKind {
    List,
    Set,
    /// Abstract: lists, tuples and strings qualify; tuples stay tuples.
    Sequence,
}

/// `list[T]`, `set[T]` and `Sequence[T]`.
#[derive(Debug, Clone)]
pub struct SequenceCaster {
    decl: TypeDecl,
    kind: SequenceKind,
    element: SharedCaster,
}

impl SequenceCaster {
    pub fn build(decl: &TypeDecl, factory: &CasterFactory) -> Result<SharedCaster, ResolveError> {
        let (kind, element) = match decl {
            TypeDecl::List(element) => (SequenceKind::List, factory.resolve(element)?),
            TypeDecl::Set(element) => (SequenceKind::Set, factory.resolve(element)?),
            TypeDecl::Sequence(element) => (SequenceKind::Sequence, factory.resolve(element)?),
            _ => (SequenceKind::List, factory.resolve(&TypeDecl::Any)?),
        };
        Ok(Arc::new(Self {
            decl: decl.clone(),
            kind,
            element,
        }))
    }
}

impl Caster for SequenceCaster {
    fn declaration(&self) -> &TypeDecl {
        &self.decl
    }

    fn validate(&self, value: &Value) -> bool {
        let element = |item: &Value| self.element.validate(item);
        match (self.kind, value) {
            (SequenceKind::List, Value::List(items))
            | (SequenceKind::Sequence, Value::List(items) | Value::Tuple(items)) => items.iter().all(element),
            (SequenceKind::Set, Value::Set(items)) => items.iter().all(element),
            (SequenceKind::Sequence, Value::Str(s)) => {
                s.chars().all(|c| self.element.validate(&Value::Str(c.to_string())))
            }
            _ => false,
        }
    }

    fn cast(&self, value: &Value) -> Result<Value, CastError> {
        // A conforming string is a sequence already; splitting it would change it.
        if self.validate(value) {
            return Ok(value.clone());
        }
        let source = literal_source(value);
        let items = convert::to_items(&source).map_err(|err| CastError::cast(&self.decl, err))?;
        let items = cast_items(items, |_| Some(Arc::clone(&self.element)))?;

        match self.kind {
            SequenceKind::List => Ok(Value::List(items)),
            SequenceKind::Sequence if matches!(source, Value::Tuple(_)) => Ok(Value::Tuple(items)),
            SequenceKind::Sequence => Ok(Value::List(items)),
            SequenceKind::Set => {
                let mut set = IndexSet::with_capacity(items.len());
                for item in items {
                    if !convert::is_hashable(&item) {
                        return Err(CastError::cast(
                            &self.decl,
                            format!("unhashable type: '{}'", item.type_name()),
                        ));
                    }
                    set.insert(item);
                }
                Ok(Value::Set(set))
            }
        }
    }
}

// ============================================================================
// TUPLES
// ============================================================================

/// `tuple[A, B]` (fixed arity) and `tuple[T, ...]` (variadic).
///
/// Fixed tuples accept surplus positions only when
/// `ALLOW_TUPLE_ADDITIONAL_PARAMS` was set when the caster was built; the
/// surplus is unconstrained.
#[derive(Debug, Clone)]
pub struct TupleCaster {
    decl: TypeDecl,
    items: Vec<SharedCaster>,
    variadic: bool,
    allow_additional: bool,
}

impl TupleCaster {
    pub fn build(decl: &TypeDecl, factory: &CasterFactory) -> Result<SharedCaster, ResolveError> {
        let (items, variadic) = match decl {
            TypeDecl::Tuple { items, variadic } => (
                items.iter().map(|item| factory.resolve(item)).collect::<Result<Vec<_>, _>>()?,
                *variadic,
            ),
            _ => (vec![factory.resolve(&TypeDecl::Any)?], true),
        };
        Ok(Arc::new(Self {
            decl: decl.clone(),
            items,
            variadic,
            allow_additional: factory.settings().allow_tuple_additional_params,
        }))
    }

    fn arity_ok(&self, len: usize) -> bool {
        self.variadic || len == self.items.len() || (self.allow_additional && len > self.items.len())
    }

    fn caster_for(&self, index: usize) -> Option<&SharedCaster> {
        if self.variadic {
            self.items.first()
        } else {
            self.items.get(index)
        }
    }
}

impl Caster for TupleCaster {
    fn declaration(&self) -> &TypeDecl {
        &self.decl
    }

    fn validate(&self, value: &Value) -> bool {
        let Value::Tuple(items) = value else {
            return false;
        };
        self.arity_ok(items.len())
            && items.iter().enumerate().all(|(index, item)| {
                self.caster_for(index).is_none_or(|caster| caster.validate(item))
            })
    }

    fn cast(&self, value: &Value) -> Result<Value, CastError> {
        let source = literal_source(value);
        let items = convert::to_items(&source).map_err(|err| CastError::cast(&self.decl, err))?;
        if !self.arity_ok(items.len()) {
            return Err(CastError::cast(
                &self.decl,
                format!("expected {} items, got {}", self.items.len(), items.len()),
            ));
        }
        let items = cast_items(items, |index| self.caster_for(index).cloned())?;
        Ok(Value::Tuple(items))
    }
}

// ============================================================================
// MAPPINGS
// ============================================================================

/// `dict[K, V]` and `Mapping[K, V]`. Both produce dicts.
#[derive(Debug, Clone)]
pub struct MappingCaster {
    decl: TypeDecl,
    key: SharedCaster,
    value: SharedCaster,
}

impl MappingCaster {
    pub fn build(decl: &TypeDecl, factory: &CasterFactory) -> Result<SharedCaster, ResolveError> {
        let (key, value) = match decl {
            TypeDecl::Dict(key, value) | TypeDecl::Mapping(key, value) => {
                (factory.resolve(key)?, factory.resolve(value)?)
            }
            _ => (factory.resolve(&TypeDecl::Any)?, factory.resolve(&TypeDecl::Any)?),
        };
        Ok(Arc::new(Self {
            decl: decl.clone(),
            key,
            value,
        }))
    }
}

impl Caster for MappingCaster {
    fn declaration(&self) -> &TypeDecl {
        &self.decl
    }

    fn validate(&self, value: &Value) -> bool {
        let Value::Dict(map) = value else {
            return false;
        };
        map.iter().all(|(k, v)| self.key.validate(k) && self.value.validate(v))
    }

    fn cast(&self, value: &Value) -> Result<Value, CastError> {
        let source = literal_source(value);
        let pairs = convert::to_pairs(&source).map_err(|err| CastError::cast(&self.decl, err))?;

        let mut out = IndexMap::with_capacity(pairs.len());
        for (key, item) in pairs {
            let key = self.key.call(&key, false)?;
            if !convert::is_hashable(&key) {
                return Err(CastError::cast(
                    &self.decl,
                    format!("unhashable type: '{}'", key.type_name()),
                ));
            }
            let item = self.value.call(&item, false)?;
            out.insert(key, item);
        }
        Ok(Value::Dict(out))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::settings::Settings;
    use crate::typecast::registry::CasterRegistry;

    fn caster(decl: &TypeDecl) -> SharedCaster {
        CasterFactory::default().resolve(decl).unwrap()
    }

    #[rstest]
    #[case(Value::from("[1, 2]"))]
    #[case(Value::tuple([1, 2]))]
    #[case(Value::list(["1", "2"]))]
    #[case(Value::from("(1, '2')"))]
    fn test_list_cast(#[case] input: Value) {
        let list = caster(&TypeDecl::list(TypeDecl::Int));
        assert_eq!(list.call(&input, false), Ok(Value::list([1, 2])));
    }

    #[test]
    fn test_list_validate_checks_elements() {
        let list = caster(&TypeDecl::list(TypeDecl::Int));
        assert!(list.validate(&Value::list([1, 2])));
        assert!(!list.validate(&Value::list([Value::Int(1), Value::from("2")])));
        assert!(!list.validate(&Value::tuple([1, 2])));
    }

    #[test]
    fn test_list_cast_aborts_on_first_bad_element() {
        let list = caster(&TypeDecl::list(TypeDecl::Int));
        let err = list.call(&Value::list(["1", "x", "y"]), false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Couldn't cast to correct type: list[int]. Couldn't cast to correct type: int. \
             invalid literal for int() with base 10: 'x'"
        );
    }

    #[test]
    fn test_string_without_literal_iterates_chars() {
        let list = caster(&TypeDecl::list(TypeDecl::Str));
        assert_eq!(list.call(&Value::from("ab"), false), Ok(Value::list(["a", "b"])));
    }

    #[test]
    fn test_non_iterable_fails() {
        let list = caster(&TypeDecl::list(TypeDecl::Int));
        let err = list.call(&Value::Int(5), false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Couldn't cast to correct type: list[int]. 'int' object is not iterable"
        );
    }

    #[test]
    fn test_set_cast() {
        let set = caster(&TypeDecl::set(TypeDecl::Int));
        assert_eq!(set.call(&Value::list(["1", "1", "2"]), false), Ok(Value::set([1, 2])));
        assert!(set.call(&Value::list([Value::list([1])]), false).is_err());
    }

    #[test]
    fn test_sequence_keeps_tuples() {
        let seq = caster(&TypeDecl::sequence(TypeDecl::Int));
        assert!(seq.validate(&Value::tuple([1, 2])));
        assert_eq!(seq.call(&Value::tuple([Value::from("1"), Value::Int(2)]), false), Ok(Value::tuple([1, 2])));
        assert_eq!(seq.call(&Value::set([3]), false), Ok(Value::list([3])));
    }

    #[test]
    fn test_sequence_cast_keeps_conforming_strings() {
        let seq = caster(&TypeDecl::sequence(TypeDecl::Str));
        assert!(seq.validate(&Value::from("ab")));
        assert_eq!(seq.cast(&Value::from("ab")), Ok(Value::from("ab")));
        assert_eq!(seq.cast(&Value::set(["a"])), Ok(Value::list(["a"])));
    }

    #[test]
    fn test_variadic_tuple_from_set() {
        let tuple = caster(&TypeDecl::tuple_of(TypeDecl::Int));
        let Ok(Value::Tuple(mut items)) = tuple.call(&Value::set([2, 1]), false) else {
            panic!("expected a tuple");
        };
        items.sort_by(|a, b| a.compare(b).unwrap_or(std::cmp::Ordering::Equal));
        assert_eq!(items, vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn test_fixed_tuple_arity() {
        let decl = TypeDecl::tuple([TypeDecl::Int, TypeDecl::Str]);
        let tuple = caster(&decl);
        assert!(tuple.validate(&Value::tuple([Value::Int(1), Value::from("a")])));
        assert!(!tuple.validate(&Value::tuple([Value::Int(1), Value::from("a"), Value::None])));
        assert_eq!(
            tuple.call(&Value::list(["1", "a"]), false),
            Ok(Value::tuple([Value::Int(1), Value::from("a")]))
        );
        let err = tuple.call(&Value::list([1, 2, 3]), false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Couldn't cast to correct type: tuple[int, str]. expected 2 items, got 3"
        );
    }

    #[test]
    fn test_fixed_tuple_allows_additional_when_configured() {
        let settings = Settings {
            allow_tuple_additional_params: true,
            ..Settings::default()
        };
        let factory = CasterFactory::new(Arc::new(CasterRegistry::with_defaults()), settings);
        let tuple = factory.resolve(&TypeDecl::tuple([TypeDecl::Int])).unwrap();
        let value = Value::tuple([Value::Int(1), Value::from("extra")]);
        assert!(tuple.validate(&value));
        assert_eq!(
            tuple.call(&Value::list([Value::from("1"), Value::None]), false),
            Ok(Value::tuple([Value::Int(1), Value::None]))
        );
        assert!(tuple.call(&Value::list(Vec::<Value>::new()), false).is_err());
    }

    #[test]
    fn test_dict_cast() {
        let dict = caster(&TypeDecl::dict(TypeDecl::Str, TypeDecl::Int));
        assert_eq!(
            dict.call(&Value::from("{'a': '1'}"), false),
            Ok(Value::dict([("a", 1)]))
        );
        assert_eq!(
            dict.call(&Value::list([Value::tuple([Value::from("b"), Value::from("2")])]), false),
            Ok(Value::dict([("b", 2)]))
        );
        assert!(dict.validate(&Value::dict([("a", 1)])));
        assert!(!dict.validate(&Value::dict([(1, 1)])));
    }
}
