//! # sigcast
//!
//! Runtime argument validation and type coercion for dynamically typed call
//! sites.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sigcast::prelude::*;
//!
//! let book = validated("book")
//!     .param_with("guests", TypeDecl::Int, arg().validator(ge(1)))
//!     .param_with("rooms", TypeDecl::list(TypeDecl::Str), arg().default(empty_list()))
//!     .lazy(true)
//!     .build(|args| args["guests"].clone())?;
//!
//! // "2" is coerced to 2 before the validators run.
//! assert_eq!(book.call(CallArgs::new().arg("2"))?, Value::Int(2));
//! ```
//!
//! ## Pipeline
//!
//! Each call goes through alias resolution, positional mapping, one
//! [`Field`](field::Field) per parameter (default, required check, cast,
//! validators) and finally the [related validators](related). Eager callables
//! fail on the first problem; lazy ones return a
//! [`ValidationErrorGroup`](error::ValidationErrorGroup) tree with every
//! failure.
//!
//! ## Modules
//!
//! - [`typecast`]: type declarations, casters, the caster registry
//! - [`field`] / [`signature`] / [`class`]: validated callables and classes
//! - [`validation`] / [`related`]: single and cross-parameter validators
//! - [`default`]: default providers
//! - [`settings`]: process-wide toggles, loadable from `SIGCAST_*` variables
//! - [`error`]: the error tree and its structured form

// A rejected call carries the whole error tree by value.
#![allow(clippy::result_large_err)]

pub mod alias;
pub mod args;
pub mod class;
pub mod default;
pub mod error;
pub mod field;
pub mod prelude;
pub mod related;
pub mod settings;
pub mod signature;
pub mod typecast;
pub mod validation;

pub use sigcast_value as value;
