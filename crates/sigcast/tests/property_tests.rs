//! Property-based tests for casters and validators.

use std::sync::Arc;

use proptest::prelude::*;
use sigcast::prelude::*;
use sigcast::settings::Settings;
use sigcast::typecast::{CasterRegistry, SharedCaster};

fn caster(decl: TypeDecl) -> SharedCaster {
    CasterFactory::default().resolve(&decl).unwrap()
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::None),
        any::<bool>().prop_map(Value::Bool),
        (-1000i64..1000).prop_map(Value::Int),
        (-1.0e6f64..1.0e6).prop_map(Value::Float),
        "[a-z0-9]{0,4}".prop_map(Value::Str),
    ]
}

fn value() -> impl Strategy<Value = Value> {
    scalar().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Tuple),
            prop::collection::vec(scalar(), 0..4).prop_map(Value::set),
            prop::collection::vec((scalar(), inner), 0..4).prop_map(Value::dict),
        ]
    })
}

/// Every non-union declaration, resolved through the default registry and
/// through an empty one (which routes everything to the fallback caster).
fn non_union_casters() -> Vec<SharedCaster> {
    let decls = [
        TypeDecl::Any,
        TypeDecl::None,
        TypeDecl::Bool,
        TypeDecl::Int,
        TypeDecl::Float,
        TypeDecl::Str,
        TypeDecl::list(TypeDecl::Any),
        TypeDecl::list(TypeDecl::Int),
        TypeDecl::set(TypeDecl::Str),
        TypeDecl::sequence(TypeDecl::Str),
        TypeDecl::sequence(TypeDecl::Any),
        TypeDecl::tuple_of(TypeDecl::Any),
        TypeDecl::tuple([TypeDecl::Int, TypeDecl::Str]),
        TypeDecl::dict(TypeDecl::Str, TypeDecl::Any),
        TypeDecl::mapping(TypeDecl::Any, TypeDecl::Float),
        TypeDecl::annotated(TypeDecl::list(TypeDecl::Bool), [Value::from("flags")]),
        TypeDecl::protocol(Protocol::new("Sized", ["len"])),
    ];
    let settings = Settings {
        protocol_handling: ProtocolHandling::Allow,
        ..Settings::default()
    };
    let factories = [
        CasterFactory::new(Arc::new(CasterRegistry::with_defaults()), settings.clone()),
        CasterFactory::new(Arc::new(CasterRegistry::empty()), settings),
    ];
    factories
        .iter()
        .flat_map(|factory| decls.iter().map(|decl| factory.resolve(decl).unwrap()))
        .collect()
}

// ============================================================================
// CAST RESULTS VALIDATE
// ============================================================================

proptest! {
    #[test]
    fn int_cast_from_text_round_trips(n in any::<i64>()) {
        let int = caster(TypeDecl::Int);
        let cast = int.call(&Value::from(n.to_string()), false).unwrap();
        prop_assert!(int.validate(&cast));
        prop_assert_eq!(cast, Value::Int(n));
    }

    #[test]
    fn str_cast_always_validates(n in any::<i64>(), flag in any::<bool>()) {
        let text = caster(TypeDecl::Str);
        for value in [Value::Int(n), Value::Bool(flag), Value::list([n])] {
            let cast = text.call(&value, false).unwrap();
            prop_assert!(text.validate(&cast));
        }
    }

    #[test]
    fn list_cast_validates(items in prop::collection::vec(any::<i32>(), 0..16)) {
        let list = caster(TypeDecl::list(TypeDecl::Float));
        let cast = list.call(&Value::tuple(items.clone()), false).unwrap();
        prop_assert!(list.validate(&cast));
        prop_assert_eq!(cast.len(), Some(items.len()));
    }
}

// ============================================================================
// CONFORMING VALUES: validate(x) => cast(x) == x
// ============================================================================

proptest! {
    #[test]
    fn cast_keeps_conforming_values(value in value()) {
        for caster in non_union_casters() {
            if caster.validate(&value) {
                prop_assert_eq!(
                    caster.cast(&value),
                    Ok(value.clone()),
                    "casting through {}",
                    caster.declaration()
                );
            }
        }
    }
}

// ============================================================================
// IDEMPOTENCY: call(call(x)) == call(x)
// ============================================================================

proptest! {
    #[test]
    fn lenient_call_idempotent(items in prop::collection::vec(0i64..1000, 0..8)) {
        let decl = TypeDecl::list(TypeDecl::union([TypeDecl::Float, TypeDecl::Int]));
        let list = caster(decl);
        let source = Value::list(items.iter().map(ToString::to_string));
        let once = list.call(&source, false).unwrap();
        let twice = list.call(&once, false).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn ge_idempotent(n in any::<i64>()) {
        let v = ge(0);
        let r1 = v.validate(&Value::Int(n));
        let r2 = v.validate(&Value::Int(n));
        prop_assert_eq!(r1.is_ok(), r2.is_ok());
        prop_assert_eq!(r1.is_ok(), n >= 0);
    }

    #[test]
    fn max_length_matches_len(items in prop::collection::vec(any::<i32>(), 0..12)) {
        let v = max_length(5);
        prop_assert_eq!(v.validate(&Value::list(items.clone())).is_ok(), items.len() <= 5);
    }
}

// ============================================================================
// UNION ORDER: validation ignores order, coercion follows it
// ============================================================================

proptest! {
    #[test]
    fn union_validate_is_order_free(n in any::<i64>(), f in -1e9f64..1e9) {
        let int_first = caster(TypeDecl::union([TypeDecl::Int, TypeDecl::Float]));
        let float_first = caster(TypeDecl::union([TypeDecl::Float, TypeDecl::Int]));
        for value in [Value::Int(n), Value::Float(f), Value::from(n.to_string())] {
            prop_assert_eq!(int_first.validate(&value), float_first.validate(&value));
        }
    }

    #[test]
    fn union_cast_takes_first_alternative(n in -1_000_000i64..1_000_000) {
        let int_first = caster(TypeDecl::union([TypeDecl::Int, TypeDecl::Float]));
        let float_first = caster(TypeDecl::union([TypeDecl::Float, TypeDecl::Int]));
        let text = Value::from(n.to_string());
        prop_assert_eq!(int_first.call(&text, false).unwrap(), Value::Int(n));
        #[allow(clippy::cast_precision_loss)]
        let expected = Value::Float(n as f64);
        prop_assert_eq!(float_first.call(&text, false).unwrap(), expected);
    }
}
