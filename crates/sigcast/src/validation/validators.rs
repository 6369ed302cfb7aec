//! Built-in validators.

use std::cmp::Ordering;

use regex::Regex;
use sigcast_value::Value;

use super::Validate;
use crate::error::ValidatorFailed;

fn not_comparable(value: &Value, bound: &Value) -> ValidatorFailed {
    ValidatorFailed::new(format!(
        "Value of type '{}' can't be compared with '{}'",
        value.type_name(),
        bound.type_name()
    ))
}

fn compare(value: &Value, bound: &Value) -> Result<Ordering, ValidatorFailed> {
    value.compare(bound).ok_or_else(|| not_comparable(value, bound))
}

fn length(value: &Value) -> Result<usize, ValidatorFailed> {
    value
        .len()
        .ok_or_else(|| ValidatorFailed::new(format!("Value of type '{}' has no length", value.type_name())))
}

// ============================================================================
// BOUNDS
// ============================================================================

/// `value >= bound`.
#[derive(Debug, Clone, PartialEq)]
pub struct Ge {
    bound: Value,
}

impl Validate for Ge {
    fn validate(&self, value: &Value) -> Result<(), ValidatorFailed> {
        if compare(value, &self.bound)? == Ordering::Less {
            return Err(ValidatorFailed::new(format!(
                "Value should be greater than or equal to {}",
                self.bound
            )));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "ge"
    }
}

pub fn ge(bound: impl Into<Value>) -> Ge {
    Ge { bound: bound.into() }
}

/// `value > bound`.
#[derive(Debug, Clone, PartialEq)]
pub struct Gt {
    bound: Value,
}

impl Validate for Gt {
    fn validate(&self, value: &Value) -> Result<(), ValidatorFailed> {
        if compare(value, &self.bound)? != Ordering::Greater {
            return Err(ValidatorFailed::new(format!("Value should be greater than {}", self.bound)));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "gt"
    }
}

pub fn gt(bound: impl Into<Value>) -> Gt {
    Gt { bound: bound.into() }
}

/// `value <= bound`.
#[derive(Debug, Clone, PartialEq)]
pub struct Le {
    bound: Value,
}

impl Validate for Le {
    fn validate(&self, value: &Value) -> Result<(), ValidatorFailed> {
        if compare(value, &self.bound)? == Ordering::Greater {
            return Err(ValidatorFailed::new(format!(
                "Value should be smaller than or equal to {}",
                self.bound
            )));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "le"
    }
}

pub fn le(bound: impl Into<Value>) -> Le {
    Le { bound: bound.into() }
}

/// `value < bound`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lt {
    bound: Value,
}

impl Validate for Lt {
    fn validate(&self, value: &Value) -> Result<(), ValidatorFailed> {
        if compare(value, &self.bound)? != Ordering::Less {
            return Err(ValidatorFailed::new(format!("Value should be smaller than {}", self.bound)));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "lt"
    }
}

pub fn lt(bound: impl Into<Value>) -> Lt {
    Lt { bound: bound.into() }
}

// ============================================================================
// LENGTH
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinLength {
    min: usize,
}

impl Validate for MinLength {
    fn validate(&self, value: &Value) -> Result<(), ValidatorFailed> {
        if length(value)? < self.min {
            return Err(ValidatorFailed::new("Length too small"));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "min_length"
    }
}

pub const fn min_length(min: usize) -> MinLength {
    MinLength { min }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxLength {
    max: usize,
}

impl Validate for MaxLength {
    fn validate(&self, value: &Value) -> Result<(), ValidatorFailed> {
        if length(value)? > self.max {
            return Err(ValidatorFailed::new("Length too large"));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "max_length"
    }
}

pub const fn max_length(max: usize) -> MaxLength {
    MaxLength { max }
}

// ============================================================================
// MEMBERSHIP / ARITHMETIC / FORMAT
// ============================================================================

/// Rejects any of the listed values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blacklisted {
    values: Vec<Value>,
}

impl Validate for Blacklisted {
    fn validate(&self, value: &Value) -> Result<(), ValidatorFailed> {
        if self.values.contains(value) {
            return Err(ValidatorFailed::new("Value is blacklisted"));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "blacklisted"
    }
}

pub fn blacklisted<I, T>(values: I) -> Blacklisted
where
    I: IntoIterator<Item = T>,
    T: Into<Value>,
{
    Blacklisted {
        values: values.into_iter().map(Into::into).collect(),
    }
}

/// `value % divisor == 0`. Integer arithmetic for ints, float remainder
/// otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct MultipleOf {
    divisor: Value,
}

impl Validate for MultipleOf {
    fn validate(&self, value: &Value) -> Result<(), ValidatorFailed> {
        let is_multiple = match (value, &self.divisor) {
            (_, Value::Int(0)) => return Err(ValidatorFailed::new("Divisor can't be zero")),
            (Value::Int(v), Value::Int(d)) => v.checked_rem(*d).unwrap_or(0) == 0,
            _ => match (value.as_float(), self.divisor.as_float()) {
                (_, Some(d)) if d == 0.0 => return Err(ValidatorFailed::new("Divisor can't be zero")),
                (Some(v), Some(d)) => v % d == 0.0,
                _ => return Err(not_comparable(value, &self.divisor)),
            },
        };
        if is_multiple {
            Ok(())
        } else {
            Err(ValidatorFailed::new(format!(
                "Parameter should be a multiple of {}",
                self.divisor
            )))
        }
    }

    fn name(&self) -> &str {
        "multiple_of"
    }
}

pub fn multiple_of(divisor: impl Into<Value>) -> MultipleOf {
    MultipleOf {
        divisor: divisor.into(),
    }
}

/// At most `places` digits after the decimal point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalPlaces {
    places: usize,
}

impl Validate for DecimalPlaces {
    fn validate(&self, value: &Value) -> Result<(), ValidatorFailed> {
        let places = match value {
            Value::Int(_) | Value::Bool(_) => 0,
            Value::Float(f) if f.is_finite() => fraction_digits(&f.to_string()),
            Value::Float(_) => return Err(ValidatorFailed::new("Value should be a finite number")),
            other => {
                return Err(ValidatorFailed::new(format!(
                    "Value of type '{}' is not a number",
                    other.type_name()
                )));
            }
        };
        if places > self.places {
            return Err(ValidatorFailed::new(format!(
                "Value should have at most {} decimal places",
                self.places
            )));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "decimal_places"
    }
}

/// Digits after the point in Rust's shortest round-trip float formatting.
fn fraction_digits(formatted: &str) -> usize {
    formatted
        .split_once('.')
        .map_or(0, |(_, fraction)| fraction.trim_end_matches('0').len())
}

pub const fn decimal_places(places: usize) -> DecimalPlaces {
    DecimalPlaces { places }
}

/// The string must match `pattern` at its start.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Validate for Pattern {
    fn validate(&self, value: &Value) -> Result<(), ValidatorFailed> {
        let Value::Str(s) = value else {
            return Err(ValidatorFailed::new(format!(
                "Value of type '{}' is not a string",
                value.type_name()
            )));
        };
        if self.regex.is_match(s) {
            Ok(())
        } else {
            Err(ValidatorFailed::new(format!(
                "Value should match the pattern '{}'",
                self.source
            )))
        }
    }

    fn name(&self) -> &str {
        "pattern"
    }
}

/// # Errors
///
/// Returns the regex compilation error for an invalid pattern.
pub fn pattern(source: impl Into<String>) -> Result<Pattern, regex::Error> {
    let source = source.into();
    let regex = Regex::new(&format!(r"\A(?:{source})"))?;
    Ok(Pattern { source, regex })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn message<V: Validate>(validator: &V, value: impl Into<Value>) -> Option<String> {
        validator.validate(&value.into()).err().map(|err| err.to_string())
    }

    #[rstest]
    #[case(-1, Some("Value should be greater than or equal to 0"))]
    #[case(0, None)]
    #[case(5, None)]
    fn test_ge(#[case] value: i64, #[case] expected: Option<&str>) {
        assert_eq!(message(&ge(0), value).as_deref(), expected);
    }

    #[test]
    fn test_bounds() {
        assert_eq!(message(&gt(0), 0).as_deref(), Some("Value should be greater than 0"));
        assert_eq!(message(&le(10), 11).as_deref(), Some("Value should be smaller than or equal to 10"));
        assert_eq!(message(&lt(10), 10).as_deref(), Some("Value should be smaller than 10"));
        assert_eq!(message(&lt(10), 9.5), None);
        assert_eq!(message(&ge(0.5), 1), None);
    }

    #[test]
    fn test_incomparable() {
        assert_eq!(
            message(&ge(0), "a").as_deref(),
            Some("Value of type 'str' can't be compared with 'int'")
        );
    }

    #[test]
    fn test_lengths() {
        assert_eq!(message(&max_length(2), "1AA").as_deref(), Some("Length too large"));
        assert_eq!(message(&max_length(2), "1B"), None);
        assert_eq!(message(&min_length(1), Value::list(Vec::<Value>::new())).as_deref(), Some("Length too small"));
        assert_eq!(message(&min_length(1), 5).as_deref(), Some("Value of type 'int' has no length"));
    }

    #[test]
    fn test_blacklisted() {
        let validator = blacklisted(["root", "admin"]);
        assert_eq!(message(&validator, "root").as_deref(), Some("Value is blacklisted"));
        assert_eq!(message(&validator, "pete"), None);
    }

    #[rstest]
    #[case(Value::Int(4), None)]
    #[case(Value::Int(3), Some("Parameter should be a multiple of 2"))]
    #[case(Value::Float(4.0), None)]
    #[case(Value::Float(4.5), Some("Parameter should be a multiple of 2"))]
    fn test_multiple_of(#[case] value: Value, #[case] expected: Option<&str>) {
        assert_eq!(message(&multiple_of(2), value).as_deref(), expected);
    }

    #[test]
    fn test_multiple_of_zero() {
        assert_eq!(message(&multiple_of(0), 4).as_deref(), Some("Divisor can't be zero"));
    }

    #[rstest]
    #[case(Value::Float(1.25), None)]
    #[case(Value::Float(1.255), Some("Value should have at most 2 decimal places"))]
    #[case(Value::Int(7), None)]
    #[case(Value::Float(1e21), None)]
    fn test_decimal_places(#[case] value: Value, #[case] expected: Option<&str>) {
        assert_eq!(message(&decimal_places(2), value).as_deref(), expected);
    }

    #[test]
    fn test_pattern_anchors_at_start() {
        let validator = pattern(r"[a-z]+\d").unwrap();
        assert_eq!(message(&validator, "abc1"), None);
        assert_eq!(message(&validator, "abc1 trailing"), None);
        assert_eq!(
            message(&validator, "1abc1").as_deref(),
            Some(r"Value should match the pattern '[a-z]+\d'")
        );
        assert!(pattern("(").is_err());
    }
}
