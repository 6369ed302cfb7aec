//! # sigcast-value
//!
//! The dynamic value model that sigcast validates and coerces.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sigcast_value::{Value, parse_literal};
//!
//! let parsed = parse_literal("[1, 2, 'three']")?;
//! assert_eq!(parsed, Value::list([Value::from(1), Value::from(2), Value::from("three")]));
//!
//! // `Empty` marks an omitted argument and is distinct from `None`.
//! assert_ne!(Value::Empty, Value::None);
//! ```
//!
//! ## Modules
//!
//! - [`value`]: the [`Value`] enum, [`Object`] instances and their [`ClassMeta`]
//! - [`kind`]: [`ValueKind`] classification and method-presence tables
//! - [`literal`]: a restricted literal parser (no expression evaluation)
//! - [`convert`]: builtin constructor semantics (`int(x)`, `float(x)`, ...)

pub mod convert;
mod display;
pub mod error;
pub mod kind;
pub mod literal;
pub mod value;

pub use error::{ConvertError, LiteralError};
pub use kind::ValueKind;
pub use literal::parse_literal;
pub use value::{ClassMeta, Object, Value};
