//! Single-argument validators.
//!
//! Validators run after casting, in declaration order, and report failures as
//! [`ValidatorFailed`]; the field pipeline attributes them to the parameter.
//!
//! ```rust,ignore
//! use sigcast::validation::{ValidateExt, ge, lt};
//!
//! let age = arg().validator(ge(0)).validator(lt(150).allow_none());
//! ```

pub mod validators;

use std::sync::Arc;

use sigcast_value::Value;

use crate::error::ValidatorFailed;

pub use validators::{
    Blacklisted, DecimalPlaces, Ge, Gt, Le, Lt, MaxLength, MinLength, MultipleOf, Pattern,
    blacklisted, decimal_places, ge, gt, le, lt, max_length, min_length, multiple_of, pattern,
};

/// A rule over one cast argument value.
pub trait Validate: Send + Sync {
    fn validate(&self, value: &Value) -> Result<(), ValidatorFailed>;

    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> Validate for F
where
    F: Fn(&Value) -> Result<(), ValidatorFailed> + Send + Sync,
{
    fn validate(&self, value: &Value) -> Result<(), ValidatorFailed> {
        self(value)
    }
}

pub type SharedValidator = Arc<dyn Validate>;

/// Lets `None` through without consulting the inner validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowNone<V> {
    inner: V,
}

impl<V> AllowNone<V> {
    pub const fn new(inner: V) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &V {
        &self.inner
    }
}

impl<V: Validate> Validate for AllowNone<V> {
    fn validate(&self, value: &Value) -> Result<(), ValidatorFailed> {
        if value.is_none() {
            return Ok(());
        }
        self.inner.validate(value)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Combinators available on every validator.
pub trait ValidateExt: Validate + Sized {
    /// The optional variant: `None` always passes.
    fn allow_none(self) -> AllowNone<Self> {
        AllowNone::new(self)
    }
}

impl<V: Validate> ValidateExt for V {}
