//! The caster contract.

use std::fmt;
use std::sync::Arc;

use sigcast_value::Value;
use thiserror::Error;

use super::decl::TypeDecl;
use crate::error::{ErrorNode, MissingArgument};

/// Why a value could not be brought into a declared shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CastError {
    /// Strict mode: the value does not already conform.
    #[error("Invalid type, should be {expected}")]
    Type { expected: String },

    /// Lenient mode: coercion was attempted and failed.
    #[error("Couldn't cast to correct type: {expected}. {detail}")]
    Cast { expected: String, detail: String },

    /// The declaration does not support coercion at all.
    #[error("Couldn't cast to correct type: {expected}. It's impossible to cast a type of: `{expected}`")]
    Uncastable { expected: String },

    /// A nested validated constructor was missing a required argument.
    #[error(transparent)]
    Missing(MissingArgument),

    /// A nested validated constructor rejected its arguments.
    #[error(transparent)]
    Nested(Box<ErrorNode>),
}

impl CastError {
    pub fn cast(decl: &TypeDecl, detail: impl fmt::Display) -> Self {
        Self::Cast {
            expected: decl.to_string(),
            detail: detail.to_string(),
        }
    }

    pub fn uncastable(decl: &TypeDecl) -> Self {
        Self::Uncastable {
            expected: decl.to_string(),
        }
    }

    /// Re-attributes an inner failure to `decl`.
    ///
    /// Nested constructor failures pass through untouched; a failure already
    /// naming `decl` is kept; anything else becomes the detail of a cast
    /// failure for `decl`.
    #[must_use]
    pub fn within(self, decl: &TypeDecl) -> Self {
        let keep = match &self {
            Self::Missing(_) | Self::Nested(_) => true,
            Self::Cast { expected, .. } | Self::Uncastable { expected } => *expected == decl.to_string(),
            Self::Type { .. } => false,
        };
        if keep { self } else { Self::cast(decl, self) }
    }
}

/// A validate/cast pair bound to one [`TypeDecl`].
///
/// `validate` is a pure predicate. `cast` attempts a best-effort coercion and
/// must either return a value that `validate` accepts or fail.
pub trait Caster: fmt::Debug + Send + Sync {
    /// The declaration this caster was built for.
    fn declaration(&self) -> &TypeDecl;

    /// Whether `value` already conforms.
    fn validate(&self, value: &Value) -> bool;

    /// Best-effort coercion.
    fn cast(&self, value: &Value) -> Result<Value, CastError>;

    /// Validate, then coerce unless `strict`.
    fn call(&self, value: &Value, strict: bool) -> Result<Value, CastError> {
        if self.validate(value) {
            return Ok(value.clone());
        }
        let decl = self.declaration();
        if strict {
            return Err(CastError::Type {
                expected: decl.to_string(),
            });
        }
        self.cast(value).map_err(|err| err.within(decl))
    }
}

/// Casters are shared between fields, composite casters and threads.
pub type SharedCaster = Arc<dyn Caster>;
