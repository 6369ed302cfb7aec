//! Related (cross-parameter) validators.
//!
//! A [`Related`] validator sees the cast values of the parameters it covers
//! and checks an invariant over them. Failures are attributed to every covered
//! parameter, since a multi-argument invariant has no single culprit.
//!
//! ```rust,ignore
//! use sigcast::related::{Related, mutually_exclusive};
//!
//! let either = mutually_exclusive(["email", "phone"], true);
//! let ordered = Related::new("ordered", |args| {
//!     match args["low"].compare(&args["high"]) {
//!         Some(Ordering::Greater) => Err(ValidatorFailed::new("low must not exceed high")),
//!         _ => Ok(()),
//!     }
//! })
//! .renamed("low", "start")
//! .renamed("high", "end");
//! ```

pub mod presets;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use sigcast_value::Value;
use thiserror::Error;

use crate::error::{CallError, ErrorKind, ValidationError, ValidatorFailed};

pub use presets::{complementary, exactly, hierarchical, is_provided, mutually_exclusive};

/// The invariant, over the covered values keyed by the names it expects.
pub type RelatedCheck = Arc<dyn Fn(&IndexMap<String, Value>) -> Result<(), ValidatorFailed> + Send + Sync>;

/// Outcome of a failed [`Related::run`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelatedError {
    /// A covered parameter does not exist on the callable. Caller bug.
    #[error("{validator} applies to argument '{argument}' but it wasn't found in the function arguments")]
    Misconfigured { validator: String, argument: String },

    /// The invariant does not hold.
    #[error(transparent)]
    Failed(ValidationError),
}

impl From<RelatedError> for CallError {
    fn from(err: RelatedError) -> Self {
        match err {
            RelatedError::Misconfigured { validator, argument } => {
                Self::RelatedMisconfigured { validator, argument }
            }
            RelatedError::Failed(err) => err.into(),
        }
    }
}

/// A cross-parameter validator.
#[derive(Clone)]
pub struct Related {
    name: String,
    check: RelatedCheck,
    params: Vec<String>,
    /// `(name the check expects, parameter name)`.
    renamed: Vec<(String, String)>,
}

impl fmt::Debug for Related {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Related")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("renamed", &self.renamed)
            .finish_non_exhaustive()
    }
}

impl Related {
    pub fn new<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&IndexMap<String, Value>) -> Result<(), ValidatorFailed> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            check: Arc::new(check),
            params: Vec::new(),
            renamed: Vec::new(),
        }
    }

    /// Covers `param`, passed to the check under its own name.
    #[must_use]
    pub fn param(mut self, param: impl Into<String>) -> Self {
        self.params.push(param.into());
        self
    }

    #[must_use]
    pub fn params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params.extend(params.into_iter().map(Into::into));
        self
    }

    /// Covers `param`, passed to the check as `check_arg`.
    #[must_use]
    pub fn renamed(mut self, check_arg: impl Into<String>, param: impl Into<String>) -> Self {
        self.renamed.push((check_arg.into(), param.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every covered parameter: plain ones first, then renamed ones.
    pub fn covered(&self) -> Vec<&str> {
        self.params
            .iter()
            .map(String::as_str)
            .chain(self.renamed.iter().map(|(_, param)| param.as_str()))
            .collect()
    }

    /// Runs the check over the call's cast arguments.
    pub fn run(&self, arguments: &IndexMap<String, Value>) -> Result<(), RelatedError> {
        let mut subset = IndexMap::with_capacity(self.params.len() + self.renamed.len());
        let plain = self.params.iter().map(|param| (param, param));
        let renamed = self.renamed.iter().map(|(check_arg, param)| (check_arg, param));
        for (key, param) in plain.chain(renamed) {
            let value = arguments.get(param).ok_or_else(|| RelatedError::Misconfigured {
                validator: self.name.clone(),
                argument: param.clone(),
            })?;
            subset.insert(key.clone(), value.clone());
        }

        (self.check)(&subset).map_err(|failed| {
            RelatedError::Failed(ValidationError::for_params(
                self.covered(),
                failed.reason,
                ErrorKind::ValidatorFailed,
            ))
        })
    }
}
