//! Scalar casters: `bool`, `str`, `int`, `float`, `None` and `Any`.

use std::sync::Arc;

use sigcast_value::{Value, convert, parse_literal};

use super::caster::{CastError, Caster, SharedCaster};
use super::decl::TypeDecl;
use super::factory::CasterFactory;
use crate::error::ResolveError;

/// `bool`. Does not accept `int` values as booleans.
#[derive(Debug, Clone)]
pub struct BoolCaster {
    decl: TypeDecl,
}

impl BoolCaster {
    pub fn build(decl: &TypeDecl, _: &CasterFactory) -> Result<SharedCaster, ResolveError> {
        Ok(Arc::new(Self { decl: decl.clone() }))
    }
}

impl Caster for BoolCaster {
    fn declaration(&self) -> &TypeDecl {
        &self.decl
    }

    fn validate(&self, value: &Value) -> bool {
        matches!(value, Value::Bool(_))
    }

    /// Accepts `1`, `0` and the strings `"1"`, `"0"`, `"true"`, `"false"`
    /// (case-insensitive, surrounding whitespace ignored).
    fn cast(&self, value: &Value) -> Result<Value, CastError> {
        let parsed = match value {
            Value::Bool(b) => Some(*b),
            Value::Int(1) => Some(true),
            Value::Int(0) => Some(false),
            Value::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" => Some(true),
                "0" | "false" => Some(false),
                _ => None,
            },
            _ => None,
        };
        parsed
            .map(Value::Bool)
            .ok_or_else(|| CastError::cast(&self.decl, format!("{} can't be interpreted as a boolean", value.repr())))
    }
}

/// `str`. Casting stringifies, which cannot fail.
#[derive(Debug, Clone)]
pub struct StrCaster {
    decl: TypeDecl,
}

impl StrCaster {
    pub fn build(decl: &TypeDecl, _: &CasterFactory) -> Result<SharedCaster, ResolveError> {
        Ok(Arc::new(Self { decl: decl.clone() }))
    }
}

impl Caster for StrCaster {
    fn declaration(&self) -> &TypeDecl {
        &self.decl
    }

    fn validate(&self, value: &Value) -> bool {
        matches!(value, Value::Str(_))
    }

    fn cast(&self, value: &Value) -> Result<Value, CastError> {
        Ok(Value::Str(convert::to_str(value)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Number {
    Int,
    Float,
}

/// `int` or `float`, with exact type checks: an `int` caster rejects floats
/// and vice versa.
#[derive(Debug, Clone)]
pub struct NumberCaster {
    decl: TypeDecl,
    number: Number,
}

impl NumberCaster {
    pub fn build(decl: &TypeDecl, _: &CasterFactory) -> Result<SharedCaster, ResolveError> {
        let number = match decl {
            TypeDecl::Float => Number::Float,
            _ => Number::Int,
        };
        Ok(Arc::new(Self {
            decl: decl.clone(),
            number,
        }))
    }
}

impl Caster for NumberCaster {
    fn declaration(&self) -> &TypeDecl {
        &self.decl
    }

    fn validate(&self, value: &Value) -> bool {
        match self.number {
            Number::Int => matches!(value, Value::Int(_)),
            Number::Float => matches!(value, Value::Float(_)),
        }
    }

    fn cast(&self, value: &Value) -> Result<Value, CastError> {
        let result = match self.number {
            Number::Int => convert::to_int(value).map(Value::Int),
            Number::Float => convert::to_float(value).map(Value::Float),
        };
        result.map_err(|err| CastError::cast(&self.decl, err))
    }
}

/// `None`. A string is read as a literal, so `"None"` casts.
#[derive(Debug, Clone)]
pub struct NoneCaster {
    decl: TypeDecl,
}

impl NoneCaster {
    pub fn build(decl: &TypeDecl, _: &CasterFactory) -> Result<SharedCaster, ResolveError> {
        Ok(Arc::new(Self { decl: decl.clone() }))
    }
}

impl Caster for NoneCaster {
    fn declaration(&self) -> &TypeDecl {
        &self.decl
    }

    fn validate(&self, value: &Value) -> bool {
        value.is_none()
    }

    fn cast(&self, value: &Value) -> Result<Value, CastError> {
        if value.is_none() {
            return Ok(Value::None);
        }
        if let Value::Str(s) = value {
            if let Ok(Value::None) = parse_literal(s.trim()) {
                return Ok(Value::None);
            }
        }
        Err(CastError::cast(&self.decl, format!("{} is not None", value.repr())))
    }
}

/// `Any`: everything validates, casting is the identity.
#[derive(Debug, Clone)]
pub struct AnyCaster {
    decl: TypeDecl,
}

impl AnyCaster {
    pub fn build(decl: &TypeDecl, _: &CasterFactory) -> Result<SharedCaster, ResolveError> {
        Ok(Arc::new(Self { decl: decl.clone() }))
    }
}

impl Caster for AnyCaster {
    fn declaration(&self) -> &TypeDecl {
        &self.decl
    }

    fn validate(&self, _: &Value) -> bool {
        true
    }

    fn cast(&self, value: &Value) -> Result<Value, CastError> {
        Ok(value.clone())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn caster(decl: TypeDecl) -> SharedCaster {
        CasterFactory::default().resolve(&decl).unwrap()
    }

    #[rstest]
    #[case(Value::Int(1), true)]
    #[case(Value::Int(0), false)]
    #[case(Value::from("1"), true)]
    #[case(Value::from("0"), false)]
    #[case(Value::from(" TRUE "), true)]
    #[case(Value::from("False"), false)]
    fn test_bool_cast(#[case] input: Value, #[case] expected: bool) {
        assert_eq!(caster(TypeDecl::Bool).cast(&input), Ok(Value::Bool(expected)));
    }

    #[rstest]
    #[case(Value::Int(2))]
    #[case(Value::from("yes"))]
    #[case(Value::Float(1.0))]
    #[case(Value::None)]
    fn test_bool_cast_rejects(#[case] input: Value) {
        assert!(caster(TypeDecl::Bool).cast(&input).is_err());
    }

    #[test]
    fn test_bool_is_not_int() {
        assert!(!caster(TypeDecl::Bool).validate(&Value::Int(1)));
        assert!(!caster(TypeDecl::Int).validate(&Value::Bool(true)));
    }

    #[test]
    fn test_number_exact_types() {
        let int = caster(TypeDecl::Int);
        let float = caster(TypeDecl::Float);
        assert!(int.validate(&Value::Int(3)));
        assert!(!int.validate(&Value::Float(3.0)));
        assert!(float.validate(&Value::Float(3.0)));
        assert!(!float.validate(&Value::Int(3)));
    }

    #[test]
    fn test_strict_vs_lenient() {
        let int = caster(TypeDecl::Int);
        assert_eq!(
            int.call(&Value::from("10"), true),
            Err(CastError::Type { expected: "int".into() })
        );
        assert_eq!(int.call(&Value::from("10"), false), Ok(Value::Int(10)));
        assert_eq!(int.call(&Value::Float(2.9), false), Ok(Value::Int(2)));
        assert_eq!(caster(TypeDecl::Float).call(&Value::from("1.5"), false), Ok(Value::Float(1.5)));
    }

    #[test]
    fn test_number_cast_failure_message() {
        let err = caster(TypeDecl::Int).cast(&Value::from("a")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Couldn't cast to correct type: int. invalid literal for int() with base 10: 'a'"
        );
    }

    #[test]
    fn test_str_and_none() {
        assert_eq!(caster(TypeDecl::Str).cast(&Value::Int(5)), Ok(Value::from("5")));
        assert_eq!(caster(TypeDecl::None).cast(&Value::from("None")), Ok(Value::None));
        assert!(caster(TypeDecl::None).cast(&Value::from("0")).is_err());
        assert!(caster(TypeDecl::None).cast(&Value::Int(0)).is_err());
        assert_eq!(caster(TypeDecl::None).cast(&Value::None), Ok(Value::None));
    }

    #[test]
    fn test_any_is_identity() {
        let any = caster(TypeDecl::Any);
        assert!(any.validate(&Value::Empty));
        assert_eq!(any.cast(&Value::list([1, 2])), Ok(Value::list([1, 2])));
    }
}
