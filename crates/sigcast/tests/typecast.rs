//! Caster behavior through parsed declarations.

use pretty_assertions::assert_eq;
use rstest::rstest;
use sigcast::prelude::*;
use sigcast::typecast::SharedCaster;
use sigcast_value::parse_literal;

fn caster(decl: &str) -> SharedCaster {
    CasterFactory::default()
        .resolve(&TypeDecl::parse(decl).unwrap())
        .unwrap()
}

fn lit(text: &str) -> Value {
    parse_literal(text).unwrap()
}

// ============================================================================
// UNIONS
// ============================================================================

#[rstest]
#[case("1", true)]
#[case("1.2", true)]
#[case("'1'", false)]
#[case("[1, 2]", false)]
fn test_union_validate(
    #[values("int | float", "Union[int, float]")] decl: &str,
    #[case] value: &str,
    #[case] ok: bool,
) {
    assert_eq!(caster(decl).validate(&lit(value)), ok);
}

#[rstest]
#[case("[1, 2]", true)]
#[case("1.2", false)]
#[case("['1', 2]", false)]
#[case("(1.3, 2)", true)]
#[case("'(1.3,2)'", false)]
fn test_union_validate_generic(#[case] value: &str, #[case] ok: bool) {
    let c = caster("list[float | int] | tuple[float | int, float | int]");
    assert_eq!(c.validate(&lit(value)), ok);
}

#[rstest]
#[case("int | float", "1", "1")]
#[case("int | float", "'1'", "1")]
#[case("int | float", "'1.2'", "1.2")]
#[case("int | float", "1.2", "1")]
#[case("float | int", "'1'", "1.0")]
#[case("float | int", "'1.2'", "1.2")]
fn test_union_cast_order(#[case] decl: &str, #[case] value: &str, #[case] expected: &str) {
    assert_eq!(caster(decl).cast(&lit(value)).unwrap(), lit(expected));
}

#[rstest]
#[case("[1, 2]", "[1, 2]")]
#[case("'(1.2, 1.2)'", "[1.2, 1.2]")]
#[case("['1', 2]", "[1.0, 2]")]
#[case("(1.3, 2)", "[1.3, 2]")]
#[case("'[1.3, \"2\"]'", "[1.3, 2.0]")]
#[case("{1: 2, 3: 4}", "[1, 3]")]
fn test_union_cast_generic(#[case] value: &str, #[case] expected: &str) {
    let c = caster("list[float | int] | tuple[float | int]");
    assert_eq!(c.call(&lit(value), false).unwrap(), lit(expected));
}

#[rstest]
#[case("int | float", "[1, 3]")]
#[case("list | tuple", "1")]
#[case("dict | list", "5")]
fn test_union_cast_failure(#[case] decl: &str, #[case] value: &str) {
    assert!(caster(decl).cast(&lit(value)).is_err());
}

// ============================================================================
// PRIMITIVES
// ============================================================================

#[rstest]
#[case("None", "None")]
#[case("1", "1")]
#[case("[1, 2]", "[1, 2]")]
#[case("'a'", "a")]
#[case("{'a': 1}", "{'a': 1}")]
fn test_string_cast(#[case] value: &str, #[case] expected: &str) {
    let c = caster("str");
    assert_eq!(c.validate(&lit(value)), matches!(lit(value), Value::Str(_)));
    assert_eq!(c.cast(&lit(value)).unwrap(), Value::from(expected));
}

#[test]
fn test_none_from_literal_string() {
    let c = caster("None");
    assert_eq!(c.call(&Value::from("None"), false).unwrap(), Value::None);
    assert!(c.call(&Value::from("nothing"), false).is_err());
}

// ============================================================================
// CONTAINERS
// ============================================================================

#[rstest]
#[case("list", "[1, 'a']", true)]
#[case("list", "[[1, 2], {'a': 3}]", true)]
#[case("list", "'[1, 2]'", false)]
#[case("list", "(1, 2)", false)]
#[case("tuple", "[1, 2]", false)]
#[case("tuple", "'(1, 2)'", false)]
#[case("tuple", "([1, 2], {'a': 3})", true)]
#[case("tuple", "(1, 2)", true)]
#[case("set", "{1, 2}", true)]
#[case("set", "{'a': 1}", false)]
#[case("set", "(1, 2)", false)]
#[case("dict", "{1, 2}", false)]
#[case("dict", "{'a': 1}", true)]
#[case("dict", "'{1: 2}'", false)]
fn test_container_validate(#[case] decl: &str, #[case] value: &str, #[case] ok: bool) {
    assert_eq!(caster(decl).validate(&lit(value)), ok);
}

#[rstest]
#[case("list[int]", "'[1, \"2\"]'", "[1, 2]")]
#[case("set[str]", "[1, 1, 2]", "{'1', '2'}")]
#[case("tuple[int, ...]", "[1, '2', 3.5]", "(1, 2, 3)")]
#[case("dict[str, float]", "[('a', 1), ('b', '2')]", "{'a': 1.0, 'b': 2.0}")]
#[case("Sequence[int]", "('1', 2)", "(1, 2)")]
fn test_container_cast(#[case] decl: &str, #[case] value: &str, #[case] expected: &str) {
    assert_eq!(caster(decl).call(&lit(value), false).unwrap(), lit(expected));
}

#[test]
fn test_nested_failure_message() {
    let err = caster("list[int]").call(&lit("[1, 'x']"), false).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Couldn't cast to correct type: list[int]. Couldn't cast to correct type: int. invalid literal for int() with base 10: 'x'"
    );
}

#[test]
fn test_annotated_is_transparent() {
    let c = caster("Annotated[list[int], 'ids']");
    assert_eq!(c.call(&lit("('1', 2)"), false).unwrap(), lit("[1, 2]"));
    assert_eq!(c.declaration().to_string(), "Annotated[list[int], 'ids']");
}

#[test]
fn test_strict_mode_never_coerces() {
    let c = caster("list[int]");
    assert_eq!(
        c.call(&lit("['1']"), true).unwrap_err().to_string(),
        "Invalid type, should be list[int]"
    );
}
