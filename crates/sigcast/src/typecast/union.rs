//! Union and `Annotated` casters.

use std::sync::Arc;

use sigcast_value::Value;

use super::caster::{CastError, Caster, SharedCaster};
use super::decl::TypeDecl;
use super::factory::CasterFactory;
use crate::error::ResolveError;

/// Ordered alternatives.
///
/// Both `validate` and `cast` are first-match in declaration order, and they
/// are independent: `int | float` validates `1.2` through `float`, but
/// casting `1.2` directly yields `1` because `int` is tried first.
#[derive(Debug, Clone)]
pub struct UnionCaster {
    decl: TypeDecl,
    alternatives: Vec<SharedCaster>,
}

impl UnionCaster {
    pub fn build(decl: &TypeDecl, factory: &CasterFactory) -> Result<SharedCaster, ResolveError> {
        let TypeDecl::Union(alternatives) = decl else {
            return Err(ResolveError::Rejected {
                declaration: decl.to_string(),
                reason: "not a union".to_owned(),
            });
        };
        let alternatives = alternatives
            .iter()
            .map(|alternative| factory.resolve(alternative))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Arc::new(Self {
            decl: decl.clone(),
            alternatives,
        }))
    }
}

impl Caster for UnionCaster {
    fn declaration(&self) -> &TypeDecl {
        &self.decl
    }

    fn validate(&self, value: &Value) -> bool {
        self.alternatives.iter().any(|alternative| alternative.validate(value))
    }

    fn cast(&self, value: &Value) -> Result<Value, CastError> {
        let mut failures = Vec::with_capacity(self.alternatives.len());
        let mut nested = None;
        for alternative in &self.alternatives {
            match alternative.cast(value) {
                Ok(cast) => return Ok(cast),
                Err(err @ (CastError::Nested(_) | CastError::Missing(_))) => {
                    failures.push(err.to_string());
                    nested.get_or_insert(err);
                }
                Err(err) => failures.push(err.to_string()),
            }
        }
        // A nested constructor's own report beats a flattened summary.
        Err(nested.unwrap_or_else(|| CastError::cast(&self.decl, failures.join("; "))))
    }
}

/// `Annotated[T, ...]`: metadata is inert, everything delegates to `T`.
#[derive(Debug, Clone)]
pub struct AnnotatedCaster {
    decl: TypeDecl,
    inner: SharedCaster,
}

impl AnnotatedCaster {
    pub fn build(decl: &TypeDecl, factory: &CasterFactory) -> Result<SharedCaster, ResolveError> {
        let TypeDecl::Annotated(inner, _) = decl else {
            return Err(ResolveError::Rejected {
                declaration: decl.to_string(),
                reason: "not an Annotated declaration".to_owned(),
            });
        };
        Ok(Arc::new(Self {
            decl: decl.clone(),
            inner: factory.resolve(inner)?,
        }))
    }
}

impl Caster for AnnotatedCaster {
    fn declaration(&self) -> &TypeDecl {
        &self.decl
    }

    fn validate(&self, value: &Value) -> bool {
        self.inner.validate(value)
    }

    fn cast(&self, value: &Value) -> Result<Value, CastError> {
        self.inner.cast(value)
    }

    fn call(&self, value: &Value, strict: bool) -> Result<Value, CastError> {
        self.inner.call(value, strict)
    }
}
