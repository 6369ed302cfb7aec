//! The per-parameter pipeline.
//!
//! An [`Argument`] is the untyped part of a parameter declaration: required
//! flag, default, validators and alias. Pairing it with a resolved caster gives
//! a [`Field`], which runs the stages on every call:
//!
//! ```text
//! raw ─► default ─► required? ─► present? ─► cast ─► validators ─► value
//!                      │            │          │          │
//!                   Missing       Empty     leaf error  leaf / group
//! ```

use std::fmt;
use std::sync::Arc;

use sigcast_value::Value;
use thiserror::Error;
use tracing::trace;

use crate::default::{DefaultFactory, DefaultProvider, DefaultValue};
use crate::error::{CallError, ErrorKind, ErrorNode, MissingArgument, ValidationError, ValidationErrorGroup};
use crate::typecast::{CastError, SharedCaster, TypeDecl};
use crate::validation::{SharedValidator, Validate};

// ============================================================================
// ARGUMENT
// ============================================================================

/// Declared behavior of one parameter, before its type is resolved.
#[derive(Clone)]
pub struct Argument {
    required: bool,
    default: Arc<dyn DefaultProvider>,
    validators: Vec<SharedValidator>,
    alias: Option<String>,
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let validators: Vec<&str> = self.validators.iter().map(|v| v.name()).collect();
        f.debug_struct("Argument")
            .field("required", &self.required)
            .field("validators", &validators)
            .field("alias", &self.alias)
            .finish_non_exhaustive()
    }
}

/// A required argument with no default, validators or alias.
pub fn arg() -> Argument {
    Argument {
        required: true,
        default: Arc::new(DefaultValue::none_given()),
        validators: Vec::new(),
        alias: None,
    }
}

impl Argument {
    /// Appends a validator; validators run in the order they were added.
    #[must_use]
    pub fn validator(mut self, validator: impl Validate + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    #[must_use]
    pub fn validators<I>(mut self, validators: I) -> Self
    where
        I: IntoIterator<Item = SharedValidator>,
    {
        self.validators.extend(validators);
        self
    }

    #[must_use]
    pub fn default(mut self, provider: impl DefaultProvider + 'static) -> Self {
        self.default = Arc::new(provider);
        self
    }

    #[must_use]
    pub fn default_value(self, value: impl Into<Value>) -> Self {
        self.default(DefaultValue::new(value))
    }

    /// A default rebuilt by `factory` on every call that omits the argument.
    #[must_use]
    pub fn default_factory<F>(self, factory: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default(DefaultFactory::new(factory))
    }

    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Omitting the argument yields [`Value::Empty`] instead of an error.
    #[must_use]
    pub fn optional(self) -> Self {
        self.required(false)
    }

    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn alias_name(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn validator_count(&self) -> usize {
        self.validators.len()
    }

    /// Binds the argument to a resolved caster.
    pub fn typed(self, caster: SharedCaster) -> Field {
        Field { argument: self, caster }
    }
}

// ============================================================================
// FIELD
// ============================================================================

/// Why a field rejected its argument.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// Required and neither given nor defaulted.
    #[error(transparent)]
    Missing(MissingArgument),

    /// A single leaf, or the field's group in lazy mode.
    #[error(transparent)]
    Invalid(ErrorNode),
}

impl From<FieldError> for CallError {
    fn from(err: FieldError) -> Self {
        match err {
            FieldError::Missing(missing) => Self::Missing(missing),
            FieldError::Invalid(node) => Self::Invalid(node),
        }
    }
}

/// An [`Argument`] with its resolved caster.
#[derive(Debug, Clone)]
pub struct Field {
    argument: Argument,
    caster: SharedCaster,
}

impl Field {
    pub fn argument(&self) -> &Argument {
        &self.argument
    }

    pub fn caster(&self) -> &SharedCaster {
        &self.caster
    }

    pub fn declaration(&self) -> &TypeDecl {
        self.caster.declaration()
    }

    /// Runs the pipeline for parameter `name` over the raw argument.
    ///
    /// Returns [`Value::Empty`] for an omitted optional parameter without a
    /// default; casting and validation are skipped in that case.
    pub fn execute(&self, name: &str, value: Value, lazy: bool, strict: bool) -> Result<Value, FieldError> {
        let value = self.argument.default.provide(value);

        if value.is_empty_marker() {
            if self.argument.required {
                return Err(FieldError::Missing(MissingArgument::new(name)));
            }
            trace!(param = name, "optional parameter omitted");
            return Ok(value);
        }

        let value = self
            .caster
            .call(&value, strict)
            .map_err(|err| FieldError::Invalid(cast_failure(name, err)))?;
        trace!(param = name, %value, "cast");

        let mut errors = Vec::new();
        for validator in &self.argument.validators {
            let Err(failed) = validator.validate(&value) else {
                continue;
            };
            trace!(param = name, validator = validator.name(), reason = %failed, "validator rejected value");
            let err = ValidationError::new(name, failed.reason, ErrorKind::ValidatorFailed);
            if !lazy {
                return Err(FieldError::Invalid(err.into()));
            }
            errors.push(err.into());
        }

        if errors.is_empty() {
            Ok(value)
        } else {
            Err(FieldError::Invalid(
                ValidationErrorGroup::new(format!("Errors during validation of '{name}'"), errors).into(),
            ))
        }
    }
}

/// Attributes a caster failure to parameter `name`.
fn cast_failure(name: &str, err: CastError) -> ErrorNode {
    let (reason, kind) = match err {
        CastError::Nested(node) => return *node,
        CastError::Missing(missing) => (missing.to_string(), ErrorKind::MissingArgument),
        err @ CastError::Type { .. } => (
            format!("Type validation failed. message: {err}"),
            ErrorKind::TypeValidation,
        ),
        err @ CastError::Cast { .. } => (
            format!("Couldn't cast to the correct type. message: {err}"),
            ErrorKind::TypeCast,
        ),
        err @ CastError::Uncastable { .. } => (
            format!("Couldn't cast to the correct type. message: {err}"),
            ErrorKind::Uncastable,
        ),
    };
    ValidationError::new(name, reason, kind).into()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::typecast::CasterFactory;
    use crate::validation::{ge, max_length, min_length};

    fn field(decl: TypeDecl, argument: Argument) -> Field {
        argument.typed(CasterFactory::default().resolve(&decl).unwrap())
    }

    fn invalid(err: FieldError) -> ErrorNode {
        match err {
            FieldError::Invalid(node) => node,
            FieldError::Missing(missing) => panic!("unexpected {missing}"),
        }
    }

    #[test]
    fn test_required_without_default_is_missing() {
        let err = field(TypeDecl::Int, arg()).execute("age", Value::Empty, false, false).unwrap_err();
        assert_eq!(err, FieldError::Missing(MissingArgument::new("age")));
        assert_eq!(err.to_string(), "Parameter 'age' is required and no default was provided");
    }

    #[test]
    fn test_optional_returns_empty_untouched() {
        let f = field(TypeDecl::Int, arg().optional().validator(ge(0)));
        assert_eq!(f.execute("age", Value::Empty, false, true).unwrap(), Value::Empty);
    }

    #[test]
    fn test_default_is_cast_and_validated() {
        let f = field(TypeDecl::Int, arg().default_value("5").validator(ge(0)));
        assert_eq!(f.execute("age", Value::Empty, false, false).unwrap(), Value::Int(5));

        let f = field(TypeDecl::Int, arg().default_value(-1).validator(ge(0)));
        assert!(f.execute("age", Value::Empty, false, false).is_err());
    }

    #[test]
    fn test_default_factory_is_fresh_per_call() {
        let f = field(
            TypeDecl::list(TypeDecl::Int),
            arg().default_factory(|| Value::List(Vec::new())),
        );
        assert_eq!(f.execute("xs", Value::Empty, false, false).unwrap(), Value::List(Vec::new()));
        assert_eq!(
            f.execute("xs", Value::list([1]), false, false).unwrap(),
            Value::list([1])
        );
    }

    #[rstest]
    #[case(true, "Parameter 'age' is invalid. Type validation failed. message: Invalid type, should be int.")]
    #[case(
        false,
        "Parameter 'age' is invalid. Couldn't cast to the correct type. message: Couldn't cast to correct type: int. invalid literal for int() with base 10: 'abc'."
    )]
    fn test_cast_failures_become_leaves(#[case] strict: bool, #[case] expected: &str) {
        let f = field(TypeDecl::Int, arg());
        let node = invalid(f.execute("age", Value::from("abc"), false, strict).unwrap_err());
        assert_eq!(node.to_string(), expected);
    }

    #[test]
    fn test_eager_stops_at_first_validator() {
        let f = field(TypeDecl::Str, arg().validator(min_length(5)).validator(max_length(2)));
        let node = invalid(f.execute("name", Value::from("abc"), false, false).unwrap_err());
        assert_eq!(node.to_string(), "Parameter 'name' is invalid. Length too small.");
    }

    #[test]
    fn test_lazy_groups_every_validator_failure() {
        let f = field(TypeDecl::Str, arg().validator(min_length(5)).validator(max_length(2)));
        let node = invalid(f.execute("name", Value::from("abc"), true, false).unwrap_err());
        let ErrorNode::Group(group) = node else {
            panic!("expected a group");
        };
        assert_eq!(group.message, "Errors during validation of 'name'");
        assert_eq!(group.leaf_count(), 2);
        assert!(group.leaves().iter().all(|leaf| leaf.kind == ErrorKind::ValidatorFailed));
    }

    #[test]
    fn test_argument_accessors() {
        let a = arg().optional().alias("Name").validator(ge(0));
        assert!(!a.is_required());
        assert_eq!(a.alias_name(), Some("Name"));
        assert_eq!(a.validator_count(), 1);
        assert!(format!("{a:?}").contains("ge"));
    }
}
