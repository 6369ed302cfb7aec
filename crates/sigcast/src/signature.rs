//! Validated callables.
//!
//! A [`Validated`] wraps a body function with a precomputed field table. Every
//! call maps its arguments onto declared parameters, runs each parameter's
//! [`Field`] pipeline, checks the related validators and only then invokes the
//! body with the cast [`Arguments`].
//!
//! # Examples
//!
//! ```rust,ignore
//! use sigcast::prelude::*;
//!
//! let add = validated("add")
//!     .param("a", TypeDecl::Int)
//!     .param_default("b", TypeDecl::Int, 1)
//!     .build(|args| args["a"].clone())?;
//!
//! assert_eq!(add.call(CallArgs::new().arg("41"))?, Value::Int(41));
//! ```
//!
//! Casters are resolved once, when the callable is built. Registry or settings
//! changes made afterwards do not affect callables that already exist.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use sigcast_value::Value;
use tracing::{debug, trace};

use crate::alias::{check_alias_collisions, process_aliases};
use crate::args::{Arguments, CallArgs};
use crate::error::{BuildError, CallError, ErrorNode, ValidationErrorGroup};
use crate::field::{Argument, Field, FieldError, arg};
use crate::related::{Related, RelatedError};
use crate::typecast::{CasterFactory, TypeDecl};

type Body<R> = Arc<dyn Fn(Arguments) -> R + Send + Sync>;

// ============================================================================
// BUILDER
// ============================================================================

/// Collects the parameter declarations of a validated callable.
#[derive(Debug, Clone)]
pub struct ValidatedBuilder {
    name: String,
    params: Vec<(String, TypeDecl, Argument)>,
    lazy: bool,
    type_strict: bool,
    related: Vec<Related>,
    receiver: Option<String>,
}

/// Shorthand for [`ValidatedBuilder::new`].
pub fn validated(name: impl Into<String>) -> ValidatedBuilder {
    ValidatedBuilder::new(name)
}

impl ValidatedBuilder {
    /// A builder for a callable reported as `name` in errors.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            lazy: false,
            type_strict: false,
            related: Vec::new(),
            receiver: None,
        }
    }

    /// A required parameter without validators.
    #[must_use]
    pub fn param(self, name: impl Into<String>, decl: TypeDecl) -> Self {
        self.param_with(name, decl, arg())
    }

    #[must_use]
    pub fn param_with(mut self, name: impl Into<String>, decl: TypeDecl, argument: Argument) -> Self {
        self.params.push((name.into(), decl, argument));
        self
    }

    /// A parameter with a plain default value.
    #[must_use]
    pub fn param_default(self, name: impl Into<String>, decl: TypeDecl, default: impl Into<Value>) -> Self {
        self.param_with(name, decl, arg().default_value(default))
    }

    /// Collect every failure instead of stopping at the first one.
    #[must_use]
    pub fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    /// Require values to already conform; never coerce.
    #[must_use]
    pub fn type_strict(mut self, type_strict: bool) -> Self {
        self.type_strict = type_strict;
        self
    }

    #[must_use]
    pub fn related(mut self, related: Related) -> Self {
        self.related.push(related);
        self
    }

    /// Makes the callable a method: the first positional argument of
    /// [`Validated::call`] is the receiver, named `receiver`.
    #[must_use]
    pub fn method(mut self, receiver: impl Into<String>) -> Self {
        self.receiver = Some(receiver.into());
        self
    }

    /// Builds against the process-wide registry and settings.
    pub fn build<R, F>(self, body: F) -> Result<Validated<R>, BuildError>
    where
        F: Fn(Arguments) -> R + Send + Sync + 'static,
    {
        self.build_with(&CasterFactory::global(), body)
    }

    /// Builds against an explicit factory.
    pub fn build_with<R, F>(self, factory: &CasterFactory, body: F) -> Result<Validated<R>, BuildError>
    where
        F: Fn(Arguments) -> R + Send + Sync + 'static,
    {
        let mut fields = IndexMap::with_capacity(self.params.len());
        for (name, decl, argument) in self.params {
            if fields.contains_key(&name) || self.receiver.as_ref() == Some(&name) {
                return Err(BuildError::DuplicateParameter(name));
            }
            let caster = factory.resolve(&decl).map_err(|source| BuildError::Resolve {
                param: name.clone(),
                source,
            })?;
            fields.insert(name, argument.typed(caster));
        }

        for related in &self.related {
            if let Some(missing) = related.covered().into_iter().find(|param| !fields.contains_key(*param)) {
                return Err(BuildError::RelatedMisconfigured {
                    validator: related.name().to_owned(),
                    argument: missing.to_owned(),
                });
            }
        }

        check_alias_collisions(
            fields.keys().map(String::as_str),
            fields.values().map(|field| field.argument().alias_name()),
        )?;
        let aliases = fields
            .iter()
            .filter_map(|(name, field)| {
                field
                    .argument()
                    .alias_name()
                    .map(|alias| (name.clone(), alias.to_owned()))
            })
            .collect();

        debug!(
            callable = %self.name,
            params = fields.len(),
            related = self.related.len(),
            lazy = self.lazy,
            type_strict = self.type_strict,
            "built validated callable"
        );

        Ok(Validated {
            name: self.name,
            fields,
            aliases,
            lazy: self.lazy,
            type_strict: self.type_strict,
            related: self.related,
            receiver: self.receiver,
            body: Arc::new(body),
        })
    }
}

// ============================================================================
// VALIDATED CALLABLE
// ============================================================================

/// A body function guarded by argument validation.
pub struct Validated<R> {
    name: String,
    fields: IndexMap<String, Field>,
    /// `(parameter, alias)`.
    aliases: Vec<(String, String)>,
    lazy: bool,
    type_strict: bool,
    related: Vec<Related>,
    receiver: Option<String>,
    body: Body<R>,
}

impl<R> Clone for Validated<R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            fields: self.fields.clone(),
            aliases: self.aliases.clone(),
            lazy: self.lazy,
            type_strict: self.type_strict,
            related: self.related.clone(),
            receiver: self.receiver.clone(),
            body: Arc::clone(&self.body),
        }
    }
}

impl<R> fmt::Debug for Validated<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validated")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("lazy", &self.lazy)
            .field("type_strict", &self.type_strict)
            .field("related", &self.related)
            .field("receiver", &self.receiver)
            .finish_non_exhaustive()
    }
}

impl<R> Validated<R> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &IndexMap<String, Field> {
        &self.fields
    }

    pub fn is_lazy(&self) -> bool {
        self.lazy
    }

    pub fn is_type_strict(&self) -> bool {
        self.type_strict
    }

    pub fn is_method(&self) -> bool {
        self.receiver.is_some()
    }

    /// Validates `args` and invokes the body.
    ///
    /// For methods the first positional argument is taken as the receiver.
    pub fn call(&self, args: CallArgs) -> Result<R, CallError> {
        let arguments = self.bind(args)?;
        Ok((self.body)(arguments))
    }

    /// Invokes with an explicit receiver; every positional argument in `args`
    /// maps to a declared parameter.
    pub fn call_method(&self, receiver: impl Into<Value>, args: CallArgs) -> Result<R, CallError> {
        let arguments = self.bind_with_receiver(Some(receiver.into()), args)?;
        Ok((self.body)(arguments))
    }

    /// Runs the whole validation without invoking the body.
    pub fn bind(&self, mut args: CallArgs) -> Result<Arguments, CallError> {
        let receiver = match &self.receiver {
            Some(_) if args.positional.is_empty() => {
                return Err(CallError::MissingReceiver {
                    callable: self.name.clone(),
                });
            }
            Some(_) => Some(args.positional.remove(0)),
            None => None,
        };
        self.bind_with_receiver(receiver, args)
    }

    fn bind_with_receiver(&self, receiver: Option<Value>, args: CallArgs) -> Result<Arguments, CallError> {
        let mut named = self.map_arguments(args)?;

        let mut values = IndexMap::with_capacity(self.fields.len());
        let mut errors = Vec::new();
        for (name, field) in &self.fields {
            let raw = named.shift_remove(name).unwrap_or_default();
            match field.execute(name, raw, self.lazy, self.type_strict) {
                Ok(value) => {
                    values.insert(name.clone(), value);
                }
                Err(FieldError::Invalid(node)) if self.lazy => errors.push(node),
                Err(err) => {
                    debug!(callable = %self.name, error = %err, "validated call rejected");
                    return Err(err.into());
                }
            }
        }
        if !errors.is_empty() {
            return Err(self.reject(format!("Parameter validation for {} failed", self.name), errors));
        }

        for related in &self.related {
            match related.run(&values) {
                Ok(()) => {}
                Err(RelatedError::Failed(err)) if self.lazy => errors.push(err.into()),
                Err(err) => {
                    debug!(callable = %self.name, related = related.name(), error = %err, "validated call rejected");
                    return Err(err.into());
                }
            }
        }
        if !errors.is_empty() {
            return Err(self.reject(format!("Related parameter validation for {} failed", self.name), errors));
        }

        trace!(callable = %self.name, "arguments validated");
        Ok(Arguments::new(values, receiver))
    }

    /// Resolves aliases and maps positional arguments onto parameter names.
    fn map_arguments(&self, args: CallArgs) -> Result<IndexMap<String, Value>, CallError> {
        let CallArgs { positional, named } = args;
        let mut named = process_aliases(
            self.aliases.iter().map(|(param, alias)| (param.as_str(), alias.as_str())),
            named,
        );

        if positional.len() > self.fields.len() {
            return Err(CallError::TooManyPositional {
                callable: self.name.clone(),
                expected: self.fields.len(),
                given: positional.len(),
            });
        }
        for (name, value) in self.fields.keys().zip(positional) {
            if named.contains_key(name) {
                return Err(CallError::DuplicateArgument {
                    argument: name.clone(),
                    callable: self.name.clone(),
                });
            }
            named.insert(name.clone(), value);
        }

        if let Some(unknown) = named.keys().find(|name| !self.fields.contains_key(*name)) {
            return Err(CallError::UnrecognizedArgument {
                argument: unknown.clone(),
                callable: self.name.clone(),
            });
        }
        Ok(named)
    }

    fn reject(&self, message: String, errors: Vec<ErrorNode>) -> CallError {
        let group = ValidationErrorGroup::new(message, errors);
        debug!(callable = %self.name, leaves = group.leaf_count(), "validated call rejected");
        group.into()
    }
}
