//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use sigcast::prelude::*;
//!
//! let greet = validated("greet")
//!     .param_with("name", TypeDecl::Str, arg().validator(min_length(1)))
//!     .build(|args| args["name"].clone())?;
//! ```

// ============================================================================
// VALUES / CALLS
// ============================================================================

pub use sigcast_value::{ClassMeta, Object, Value};

pub use crate::args::{Arguments, CallArgs};
pub use crate::class::{Class, ClassBuilder};
pub use crate::field::{Argument, Field, arg};
pub use crate::signature::{Validated, ValidatedBuilder, validated};

// ============================================================================
// ERRORS
// ============================================================================

pub use crate::error::{
    BuildError, CallError, ErrorKind, ErrorNode, MissingArgument, ValidationError,
    ValidationErrorGroup, ValidatorFailed,
};

// ============================================================================
// TYPECASTING
// ============================================================================

pub use crate::typecast::{CastError, Caster, CasterFactory, NominalType, Protocol, TypeDecl, TypeKey};

// ============================================================================
// DEFAULTS / VALIDATORS
// ============================================================================

pub use crate::default::{DefaultFactory, DefaultProvider, DefaultValue, empty_dict, empty_list, zero};
pub use crate::related::{Related, complementary, exactly, hierarchical, mutually_exclusive};
pub use crate::validation::{
    Validate, ValidateExt, blacklisted, decimal_places, ge, gt, le, lt, max_length, min_length,
    multiple_of, pattern,
};

pub use crate::settings::ProtocolHandling;
