//! Builtin constructor semantics.
//!
//! These mirror what `bool(x)`, `int(x)`, `float(x)`, `str(x)`, `list(x)`,
//! `set(x)` and `dict(x)` accept. Lenient casters fall back on them after
//! validation fails.

use indexmap::{IndexMap, IndexSet};

use crate::error::ConvertError;
use crate::value::Value;

/// `bool(x)`: never fails.
#[must_use]
pub fn to_bool(value: &Value) -> bool {
    value.is_truthy()
}

/// `str(x)`: never fails in the closed value model.
#[must_use]
pub fn to_str(value: &Value) -> String {
    value.to_string()
}

/// `int(x)`.
///
/// Floats truncate toward zero. Strings must hold a base-10 integer, optionally
/// signed and surrounded by whitespace; `"1.2"` is rejected.
///
/// # Errors
///
/// Returns [`ConvertError`] for malformed strings, non-finite or out of range
/// floats, and non-numeric kinds.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn to_int(value: &Value) -> Result<i64, ConvertError> {
    match value {
        Value::Int(i) => Ok(*i),
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::Float(f) if f.is_nan() => Err(ConvertError::new(
            "cannot convert float NaN to integer",
        )),
        Value::Float(f) if f.is_infinite() => Err(ConvertError::new(
            "cannot convert float infinity to integer",
        )),
        Value::Float(f) => {
            let truncated = f.trunc();
            if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
                Err(ConvertError::new(format!("float {f} out of integer range")))
            } else {
                Ok(truncated as i64)
            }
        }
        Value::Str(s) => parse_int(s).ok_or_else(|| {
            ConvertError::new(format!(
                "invalid literal for int() with base 10: {}",
                value.repr()
            ))
        }),
        other => Err(ConvertError::new(format!(
            "int() argument must be a string, a bytes-like object or a real number, not '{}'",
            other.type_name()
        ))),
    }
}

fn parse_int(s: &str) -> Option<i64> {
    let trimmed = s.trim();
    let digits = trimmed
        .strip_prefix(['+', '-'])
        .unwrap_or(trimmed);
    if !valid_digit_groups(digits) {
        return None;
    }
    let clean: String = trimmed.chars().filter(|c| *c != '_').collect();
    clean.parse().ok()
}

/// Digits with single underscores between them, as in `1_000`.
fn valid_digit_groups(s: &str) -> bool {
    !s.is_empty()
        && s.split('_')
            .all(|group| !group.is_empty() && group.chars().all(|c| c.is_ascii_digit()))
}

/// `float(x)`.
///
/// Strings accept decimal and exponent notation plus `inf`, `infinity` and
/// `nan` in any case, with an optional sign.
///
/// # Errors
///
/// Returns [`ConvertError`] for malformed strings and non-numeric kinds.
#[allow(clippy::cast_precision_loss)]
pub fn to_float(value: &Value) -> Result<f64, ConvertError> {
    match value {
        Value::Float(f) => Ok(*f),
        Value::Int(i) => Ok(*i as f64),
        Value::Bool(b) => Ok(f64::from(u8::from(*b))),
        Value::Str(s) => parse_float(s).ok_or_else(|| {
            ConvertError::new(format!(
                "could not convert string to float: {}",
                value.repr()
            ))
        }),
        other => Err(ConvertError::new(format!(
            "float() argument must be a string or a real number, not '{}'",
            other.type_name()
        ))),
    }
}

fn parse_float(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let lower = body.to_ascii_lowercase();
    let magnitude = match lower.as_str() {
        "inf" | "infinity" => f64::INFINITY,
        "nan" => f64::NAN,
        _ => {
            if body.is_empty()
                || !body
                    .chars()
                    .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-' | '_'))
                || body.starts_with('_')
                || body.ends_with('_')
                || body.contains("__")
            {
                return None;
            }
            body.replace('_', "").parse::<f64>().ok()?
        }
    };
    Some(if negative { -magnitude } else { magnitude })
}

/// `list(x)`: the items of an iterable.
///
/// Dicts yield their keys and strings yield their characters.
///
/// # Errors
///
/// Returns [`ConvertError`] for non-iterable kinds.
pub fn to_items(value: &Value) -> Result<Vec<Value>, ConvertError> {
    match value {
        Value::List(items) | Value::Tuple(items) => Ok(items.clone()),
        Value::Set(items) => Ok(items.iter().cloned().collect()),
        Value::Dict(map) => Ok(map.keys().cloned().collect()),
        Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
        other => Err(not_iterable(other)),
    }
}

/// `set(x)`: like [`to_items`] but deduplicated, rejecting mutable members.
///
/// # Errors
///
/// Returns [`ConvertError`] for non-iterable input or unhashable items.
pub fn to_set(value: &Value) -> Result<IndexSet<Value>, ConvertError> {
    to_items(value)?
        .into_iter()
        .map(|item| {
            if is_hashable(&item) {
                Ok(item)
            } else {
                Err(unhashable(&item))
            }
        })
        .collect()
}

/// `dict(x)`: a dict, or an iterable of two-item sequences.
///
/// # Errors
///
/// Returns [`ConvertError`] when the input is not iterable, an element is not a
/// sequence of length two, or a key is unhashable.
pub fn to_pairs(value: &Value) -> Result<IndexMap<Value, Value>, ConvertError> {
    if let Value::Dict(map) = value {
        return Ok(map.clone());
    }

    let mut pairs = IndexMap::new();
    for (index, element) in to_items(value)?.into_iter().enumerate() {
        let items = match element {
            Value::List(items) | Value::Tuple(items) => items,
            Value::Str(s) => s.chars().map(|c| Value::Str(c.to_string())).collect(),
            Value::Set(items) => items.into_iter().collect(),
            Value::Dict(map) => map.into_keys().collect(),
            _ => {
                return Err(ConvertError::new(format!(
                    "cannot convert dictionary update sequence element #{index} to a sequence"
                )));
            }
        };
        let [key, value]: [Value; 2] = items.try_into().map_err(|items: Vec<Value>| {
            ConvertError::new(format!(
                "dictionary update sequence element #{index} has length {}; 2 is required",
                items.len()
            ))
        })?;
        if !is_hashable(&key) {
            return Err(unhashable(&key));
        }
        pairs.insert(key, value);
    }
    Ok(pairs)
}

/// Whether a value may be used as a set member or dict key.
#[must_use]
pub fn is_hashable(value: &Value) -> bool {
    match value {
        Value::List(_) | Value::Set(_) | Value::Dict(_) => false,
        Value::Tuple(items) => items.iter().all(is_hashable),
        _ => true,
    }
}

fn not_iterable(value: &Value) -> ConvertError {
    ConvertError::new(format!("'{}' object is not iterable", value.type_name()))
}

fn unhashable(value: &Value) -> ConvertError {
    ConvertError::new(format!("unhashable type: '{}'", value.type_name()))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Value::Int(5), 5)]
    #[case(Value::Bool(true), 1)]
    #[case(Value::Float(2.9), 2)]
    #[case(Value::Float(-2.9), -2)]
    #[case(Value::from(" 42 "), 42)]
    #[case(Value::from("-1_000"), -1000)]
    fn test_to_int(#[case] input: Value, #[case] expected: i64) {
        assert_eq!(to_int(&input).unwrap(), expected);
    }

    #[test]
    fn test_to_int_errors() {
        assert_eq!(
            to_int(&Value::from("a")).unwrap_err().message,
            "invalid literal for int() with base 10: 'a'"
        );
        assert!(to_int(&Value::from("1.2")).is_err());
        assert!(to_int(&Value::from("1__0")).is_err());
        assert!(to_int(&Value::Float(f64::NAN)).is_err());
        assert!(to_int(&Value::list([1])).is_err());
    }

    #[rstest]
    #[case(Value::from("1.5"), 1.5)]
    #[case(Value::from("1e2"), 100.0)]
    #[case(Value::from(" -3 "), -3.0)]
    #[case(Value::from("-Infinity"), f64::NEG_INFINITY)]
    #[case(Value::Int(2), 2.0)]
    fn test_to_float(#[case] input: Value, #[case] expected: f64) {
        assert_eq!(to_float(&input).unwrap(), expected);
    }

    #[test]
    fn test_to_float_errors() {
        assert_eq!(
            to_float(&Value::from("abc")).unwrap_err().message,
            "could not convert string to float: 'abc'"
        );
        assert!(to_float(&Value::from("")).is_err());
        assert!(to_float(&Value::None).is_err());
        assert!(to_float(&Value::from("nan")).unwrap().is_nan());
    }

    #[test]
    fn test_to_items() {
        assert_eq!(
            to_items(&Value::from("ab")).unwrap(),
            vec![Value::from("a"), Value::from("b")]
        );
        assert_eq!(
            to_items(&Value::dict([("k", 1)])).unwrap(),
            vec![Value::from("k")]
        );
        assert_eq!(
            to_items(&Value::Int(1)).unwrap_err().message,
            "'int' object is not iterable"
        );
    }

    #[test]
    fn test_to_set_rejects_unhashable() {
        assert_eq!(to_set(&Value::list([1, 1, 2])).unwrap().len(), 2);
        assert!(to_set(&Value::list([Value::list([1])])).is_err());
    }

    #[test]
    fn test_to_pairs() {
        let pairs = to_pairs(&Value::list([Value::tuple(["a", "b"]), Value::list([1, 2])])).unwrap();
        assert_eq!(pairs.get(&Value::from("a")), Some(&Value::from("b")));
        assert_eq!(pairs.get(&Value::Int(1)), Some(&Value::Int(2)));

        let err = to_pairs(&Value::list([Value::list([1, 2, 3])])).unwrap_err();
        assert_eq!(
            err.message,
            "dictionary update sequence element #0 has length 3; 2 is required"
        );
        assert!(to_pairs(&Value::list([1])).is_err());
    }

    #[test]
    fn test_to_str_and_bool() {
        assert_eq!(to_str(&Value::Int(3)), "3");
        assert_eq!(to_str(&Value::from("x")), "x");
        assert!(!to_bool(&Value::from("")));
    }
}
