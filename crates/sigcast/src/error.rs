//! Error types for argument validation.
//!
//! Failures form a tree: [`ValidationError`] leaves attributed to one or more
//! parameters, grouped by [`ValidationErrorGroup`]s that carry a context
//! message. Nested validated constructors produce nested groups; nothing is
//! flattened.
//!
//! ```text
//! Parameter validation for load_students failed (2 sub-exceptions)
//! ├── Parameter validation for Student failed (1 sub-exception)
//! │   └── Errors during validation of 'age' (1 sub-exception)
//! │       └── Parameter 'age' is invalid. Value should be greater than or equal to 0.
//! └── Parameter 'budget' is invalid. Type validation failed. message: Invalid type, should be float.
//! ```

use std::fmt;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use thiserror::Error;

// ============================================================================
// LEAF ERRORS
// ============================================================================

/// Which parameter(s) a [`ValidationError`] is attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    Param(String),
    /// Related validators attribute failures to every parameter they cover.
    Params(Vec<String>),
}

impl Subject {
    /// All parameter names of the subject.
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::Param(name) => vec![name.as_str()],
            Self::Params(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

/// The pipeline stage a [`ValidationError`] originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Strict mode shape mismatch.
    TypeValidation,
    /// Lenient coercion failed.
    TypeCast,
    /// The target type does not support coercion at all.
    Uncastable,
    /// A nested validated constructor was missing a required argument.
    MissingArgument,
    /// A single-argument or related validator rejected the value.
    ValidatorFailed,
}

impl ErrorKind {
    /// Stable machine-readable code.
    pub const fn code(self) -> &'static str {
        match self {
            Self::TypeValidation => "type_validation",
            Self::TypeCast => "type_cast",
            Self::Uncastable => "uncastable",
            Self::MissingArgument => "missing_argument",
            Self::ValidatorFailed => "validator_failed",
        }
    }
}

/// A failure attributed to one or more parameters.
///
/// Displays as `Parameter 'a' is invalid. <reason>.` or
/// `Parameters 'a', 'b' are invalid. <reason>.`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationError {
    pub subject: Subject,
    pub reason: String,
    pub kind: ErrorKind,
}

impl ValidationError {
    pub fn new(param: impl Into<String>, reason: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            subject: Subject::Param(param.into()),
            reason: reason.into(),
            kind,
        }
    }

    /// A failure attributed to a group of parameters.
    pub fn for_params<I, S>(params: I, reason: impl Into<String>, kind: ErrorKind) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            subject: Subject::Params(params.into_iter().map(Into::into).collect()),
            reason: reason.into(),
            kind,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subject {
            Subject::Param(name) => write!(f, "Parameter '{name}' is invalid. {}.", self.reason),
            Subject::Params(names) => {
                f.write_str("Parameters ")?;
                for (i, name) in names.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "'{name}'")?;
                }
                write!(f, " are invalid. {}.", self.reason)
            }
        }
    }
}

/// A required parameter received neither a value nor a default.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Parameter '{param}' is required and no default was provided")]
pub struct MissingArgument {
    pub param: String,
}

impl MissingArgument {
    pub fn new(param: impl Into<String>) -> Self {
        Self {
            param: param.into(),
        }
    }
}

/// Raised by validators; the field pipeline attributes it to the parameter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct ValidatorFailed {
    pub reason: String,
}

impl ValidatorFailed {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

// ============================================================================
// GROUPS
// ============================================================================

/// An aggregation node: a context message plus ordered children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrorGroup {
    pub message: String,
    pub errors: Vec<ErrorNode>,
}

/// A node of the error tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorNode {
    #[error(transparent)]
    Error(ValidationError),
    #[error(transparent)]
    Group(ValidationErrorGroup),
}

impl ValidationErrorGroup {
    pub fn new(message: impl Into<String>, errors: Vec<ErrorNode>) -> Self {
        Self {
            message: message.into(),
            errors,
        }
    }

    /// Number of leaf errors in the whole subtree.
    pub fn leaf_count(&self) -> usize {
        self.errors
            .iter()
            .map(|node| match node {
                ErrorNode::Error(_) => 1,
                ErrorNode::Group(group) => group.leaf_count(),
            })
            .sum()
    }

    /// All leaf errors, depth first.
    pub fn leaves(&self) -> Vec<&ValidationError> {
        let mut out = Vec::with_capacity(self.errors.len());
        collect_leaves(self, &mut out);
        out
    }

    /// `{"<group display>": [leaf-string | nested object, ...]}`.
    pub fn to_structured(&self) -> serde_json::Value {
        let entries = self
            .errors
            .iter()
            .map(|node| match node {
                ErrorNode::Error(err) => serde_json::Value::String(err.to_string()),
                ErrorNode::Group(group) => group.to_structured(),
            })
            .collect();
        let mut map = serde_json::Map::with_capacity(1);
        map.insert(self.to_string(), serde_json::Value::Array(entries));
        serde_json::Value::Object(map)
    }
}

fn collect_leaves<'a>(group: &'a ValidationErrorGroup, out: &mut Vec<&'a ValidationError>) {
    for node in &group.errors {
        match node {
            ErrorNode::Error(err) => out.push(err),
            ErrorNode::Group(inner) => collect_leaves(inner, out),
        }
    }
}

impl fmt::Display for ValidationErrorGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.errors.len();
        let plural = if count == 1 { "" } else { "s" };
        write!(f, "{} ({count} sub-exception{plural})", self.message)
    }
}

impl std::error::Error for ValidationErrorGroup {}

impl Serialize for ValidationErrorGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Children<'a>(&'a [ErrorNode]);

        impl Serialize for Children<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
                for node in self.0 {
                    seq.serialize_element(node)?;
                }
                seq.end()
            }
        }

        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.to_string(), &Children(&self.errors))?;
        map.end()
    }
}

impl Serialize for ErrorNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Error(err) => serializer.collect_str(err),
            Self::Group(group) => group.serialize(serializer),
        }
    }
}

impl ErrorNode {
    /// Structured form; leaves become plain strings.
    pub fn to_structured(&self) -> serde_json::Value {
        match self {
            Self::Error(err) => serde_json::Value::String(err.to_string()),
            Self::Group(group) => group.to_structured(),
        }
    }

    /// Number of leaves under this node.
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Error(_) => 1,
            Self::Group(group) => group.leaf_count(),
        }
    }
}

impl From<ValidationError> for ErrorNode {
    fn from(err: ValidationError) -> Self {
        Self::Error(err)
    }
}

impl From<ValidationErrorGroup> for ErrorNode {
    fn from(group: ValidationErrorGroup) -> Self {
        Self::Group(group)
    }
}

// ============================================================================
// CALL / BUILD ERRORS
// ============================================================================

/// Why a validated call did not reach its body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// A required parameter was omitted. Never batched.
    #[error(transparent)]
    Missing(#[from] MissingArgument),

    /// Validation failed: a single leaf in eager mode, a group in lazy mode.
    #[error(transparent)]
    Invalid(ErrorNode),

    #[error("Unrecognized argument '{argument}' for '{callable}'")]
    UnrecognizedArgument { argument: String, callable: String },

    #[error("'{callable}' takes {expected} positional arguments but {given} were given")]
    TooManyPositional {
        callable: String,
        expected: usize,
        given: usize,
    },

    #[error("'{callable}' got multiple values for argument '{argument}'")]
    DuplicateArgument { argument: String, callable: String },

    #[error("Method '{callable}' needs a receiver as its first positional argument")]
    MissingReceiver { callable: String },

    #[error("{validator} applies to argument '{argument}' but it wasn't found in the function arguments")]
    RelatedMisconfigured { validator: String, argument: String },
}

impl CallError {
    /// The validation tree, if this is a validation failure.
    pub fn as_node(&self) -> Option<&ErrorNode> {
        match self {
            Self::Invalid(node) => Some(node),
            _ => None,
        }
    }

    /// The top-level group, if validation failed in lazy mode.
    pub fn into_group(self) -> Option<ValidationErrorGroup> {
        match self {
            Self::Invalid(ErrorNode::Group(group)) => Some(group),
            _ => None,
        }
    }

    /// True for failures caused by argument values rather than call shape.
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Missing(_) | Self::Invalid(_))
    }
}

impl From<ValidationError> for CallError {
    fn from(err: ValidationError) -> Self {
        Self::Invalid(ErrorNode::Error(err))
    }
}

impl From<ValidationErrorGroup> for CallError {
    fn from(group: ValidationErrorGroup) -> Self {
        Self::Invalid(ErrorNode::Group(group))
    }
}

/// A caster could not be resolved for a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Type variable '{0}' is not supported as a parameter type")]
    Unsupported(String),

    #[error("Protocol '{0}' is not allowed (PROTOCOL_HANDLING is DISALLOW)")]
    ProtocolDisallowed(String),

    /// A user-registered caster constructor rejected the declaration.
    #[error("No caster for '{declaration}': {reason}")]
    Rejected { declaration: String, reason: String },
}

/// Building a validated callable failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("Couldn't resolve a caster for parameter '{param}'")]
    Resolve {
        param: String,
        #[source]
        source: ResolveError,
    },

    #[error("Aliases and argument names should be unique, '{name}' is used twice")]
    AliasCollision { name: String },

    #[error("Parameter '{0}' is declared twice")]
    DuplicateParameter(String),

    #[error("{validator} applies to argument '{argument}' but it wasn't found in the function arguments")]
    RelatedMisconfigured { validator: String, argument: String },
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn leaf(param: &str, reason: &str) -> ErrorNode {
        ValidationError::new(param, reason, ErrorKind::ValidatorFailed).into()
    }

    #[test]
    fn test_leaf_display() {
        let err = ValidationError::new("cost", "Value should be greater than or equal to 0", ErrorKind::ValidatorFailed);
        assert_eq!(
            err.to_string(),
            "Parameter 'cost' is invalid. Value should be greater than or equal to 0."
        );

        let err = ValidationError::for_params(["a", "b"], "Params are mutually exclusive", ErrorKind::ValidatorFailed);
        assert_eq!(
            err.to_string(),
            "Parameters 'a', 'b' are invalid. Params are mutually exclusive."
        );
    }

    #[test]
    fn test_group_display_pluralises() {
        let one = ValidationErrorGroup::new("Errors during validation of 'x'", vec![leaf("x", "bad")]);
        assert_eq!(one.to_string(), "Errors during validation of 'x' (1 sub-exception)");

        let two = ValidationErrorGroup::new("outer", vec![leaf("x", "a"), leaf("y", "b")]);
        assert_eq!(two.to_string(), "outer (2 sub-exceptions)");
    }

    #[test]
    fn test_structured_form() {
        let inner = ValidationErrorGroup::new("inner", vec![leaf("a", "r1"), leaf("a", "r2")]);
        let outer = ValidationErrorGroup::new("outer", vec![inner.into(), leaf("b", "r3")]);

        let expected = json!({
            "outer (2 sub-exceptions)": [
                {"inner (2 sub-exceptions)": [
                    "Parameter 'a' is invalid. r1.",
                    "Parameter 'a' is invalid. r2.",
                ]},
                "Parameter 'b' is invalid. r3.",
            ]
        });
        assert_eq!(outer.to_structured(), expected);
        assert_eq!(serde_json::to_value(&outer).unwrap(), expected);
        assert_eq!(outer.leaf_count(), 3);
        assert_eq!(outer.leaves().len(), 3);
    }

    #[test]
    fn test_call_error_accessors() {
        let group = ValidationErrorGroup::new("g", vec![leaf("a", "r")]);
        let err = CallError::from(group.clone());
        assert!(err.is_validation());
        assert_eq!(err.as_node().map(ErrorNode::leaf_count), Some(1));
        assert_eq!(err.into_group(), Some(group));

        let err = CallError::UnrecognizedArgument {
            argument: "zz".into(),
            callable: "f".into(),
        };
        assert!(!err.is_validation());
        assert_eq!(err.to_string(), "Unrecognized argument 'zz' for 'f'");
    }
}
