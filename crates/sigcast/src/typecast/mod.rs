//! The typecasting engine.
//!
//! A [`TypeDecl`] describes an expected shape; the [`CasterFactory`] resolves
//! it to a [`Caster`] through the [`CasterRegistry`]:
//!
//! ```text
//! TypeDecl ──► strict registry (exact origin)
//!          ──► type variables rejected
//!          ──► lenient registry (first subtype match)
//!          ──► FallbackCaster (construct by signature)
//! ```
//!
//! Composite casters resolve their contained declarations through the same
//! factory.

pub mod caster;
pub mod container;
pub mod decl;
pub mod factory;
pub mod fallback;
pub mod parse;
pub mod primitive;
pub mod protocol;
pub mod registry;
pub mod union;

pub use caster::{CastError, Caster, SharedCaster};
pub use decl::{ConstructError, NominalType, Protocol, TypeDecl, TypeKey};
pub use factory::{CasterFactory, resolve};
pub use parse::{DeclParseError, TypeNamespace};
pub use registry::{
    CasterCtor, CasterRegistry, OverrideWarning, ctor, register, reset_registry, unregister,
    unregister_strict,
};
