//! Type declarations.
//!
//! A [`TypeDecl`] is the closed description of an expected value shape. The
//! registry dispatches on its [`TypeKey`] origin, and composite casters recurse
//! into the contained declarations.

use std::fmt;
use std::sync::Arc;

use sigcast_value::Value;
use thiserror::Error;

use crate::args::CallArgs;
use crate::error::{CallError, ErrorNode, MissingArgument};

// ============================================================================
// TYPE KEYS
// ============================================================================

/// Registry key: the outer kind of a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKey {
    Any,
    None,
    Bool,
    Int,
    Float,
    Str,
    List,
    Set,
    Sequence,
    Tuple,
    Dict,
    Mapping,
    Union,
    Annotated,
    Protocol,
    TypeVar,
    /// A user-defined nominal type, by name.
    Nominal(String),
}

impl TypeKey {
    /// Builtin subtype relation: identity, `list`/`tuple` under `Sequence`,
    /// `dict` under `Mapping` and `bool` under `int`.
    pub fn is_subtype_of(&self, other: &TypeKey) -> bool {
        self == other
            || matches!(
                (self, other),
                (Self::List | Self::Tuple, Self::Sequence)
                    | (Self::Dict, Self::Mapping)
                    | (Self::Bool, Self::Int)
            )
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Any => "Any",
            Self::None => "None",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::List => "list",
            Self::Set => "set",
            Self::Sequence => "Sequence",
            Self::Tuple => "tuple",
            Self::Dict => "dict",
            Self::Mapping => "Mapping",
            Self::Union => "Union",
            Self::Annotated => "Annotated",
            Self::Protocol => "Protocol",
            Self::TypeVar => "TypeVar",
            Self::Nominal(name) => name,
        })
    }
}

// ============================================================================
// NOMINAL TYPES / PROTOCOLS
// ============================================================================

/// Failure while constructing a nominal type from call arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructError {
    /// The constructor validated its arguments and rejected them.
    #[error(transparent)]
    Invalid(ErrorNode),
    /// The constructor was missing a required argument.
    #[error(transparent)]
    Missing(MissingArgument),
    /// Any other construction failure.
    #[error("{0}")]
    Failed(String),
}

impl From<CallError> for ConstructError {
    fn from(err: CallError) -> Self {
        match err {
            CallError::Invalid(node) => Self::Invalid(node),
            CallError::Missing(missing) => Self::Missing(missing),
            other => Self::Failed(other.to_string()),
        }
    }
}

/// A user-defined type that can be checked and constructed.
///
/// [`Class`](crate::class::Class) is the built-in implementation; anything
/// else with a name and a constructor can participate in casting too.
pub trait NominalType: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Declared supertypes, used for lenient registry matching.
    fn bases(&self) -> &[TypeKey] {
        &[]
    }

    /// `isinstance(value, Self)`.
    fn is_instance(&self, value: &Value) -> bool {
        matches!(value, Value::Object(obj) if obj.class().is_subclass_of(self.name()))
    }

    /// Builds an instance from positional/keyword arguments.
    fn construct(&self, args: CallArgs) -> Result<Value, ConstructError>;
}

/// A structural contract: the set of method names a value must answer to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Protocol {
    pub name: String,
    pub methods: Vec<String>,
}

impl Protocol {
    pub fn new<I, S>(name: impl Into<String>, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            methods: methods.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `value` exposes every method of the protocol.
    pub fn is_satisfied_by(&self, value: &Value) -> bool {
        self.methods.iter().all(|method| value.has_method(method))
    }
}

// ============================================================================
// DECLARATIONS
// ============================================================================

/// An expected value shape.
#[derive(Debug, Clone)]
pub enum TypeDecl {
    /// Unconstrained.
    Any,
    None,
    Bool,
    Int,
    Float,
    Str,
    List(Box<TypeDecl>),
    Set(Box<TypeDecl>),
    /// Abstract sequence; `list`, `tuple` and `str` values qualify.
    Sequence(Box<TypeDecl>),
    /// Fixed-arity tuple, or a homogeneous one when `variadic` (`tuple[int, ...]`).
    Tuple {
        items: Vec<TypeDecl>,
        variadic: bool,
    },
    Dict(Box<TypeDecl>, Box<TypeDecl>),
    /// Abstract mapping; `dict` values qualify.
    Mapping(Box<TypeDecl>, Box<TypeDecl>),
    /// Ordered alternatives. Built through [`TypeDecl::union`].
    Union(Vec<TypeDecl>),
    /// Inner declaration plus metadata that casting ignores.
    Annotated(Box<TypeDecl>, Vec<Value>),
    Protocol(Protocol),
    Nominal(Arc<dyn NominalType>),
    /// An open type variable; resolving one fails unless a strict caster is registered.
    TypeVar(String),
}

impl TypeDecl {
    pub fn list(element: TypeDecl) -> Self {
        Self::List(Box::new(element))
    }

    pub fn set(element: TypeDecl) -> Self {
        Self::Set(Box::new(element))
    }

    pub fn sequence(element: TypeDecl) -> Self {
        Self::Sequence(Box::new(element))
    }

    /// Fixed-arity tuple.
    pub fn tuple(items: impl IntoIterator<Item = TypeDecl>) -> Self {
        Self::Tuple {
            items: items.into_iter().collect(),
            variadic: false,
        }
    }

    /// `tuple[element, ...]`.
    pub fn tuple_of(element: TypeDecl) -> Self {
        Self::Tuple {
            items: vec![element],
            variadic: true,
        }
    }

    pub fn dict(key: TypeDecl, value: TypeDecl) -> Self {
        Self::Dict(Box::new(key), Box::new(value))
    }

    pub fn mapping(key: TypeDecl, value: TypeDecl) -> Self {
        Self::Mapping(Box::new(key), Box::new(value))
    }

    /// A union of `alternatives`, flattening nested unions and dropping
    /// duplicates. A single remaining alternative is returned as is.
    pub fn union(alternatives: impl IntoIterator<Item = TypeDecl>) -> Self {
        let mut flat: Vec<TypeDecl> = Vec::new();
        for alternative in alternatives {
            let members = match alternative {
                Self::Union(inner) => inner,
                other => vec![other],
            };
            for member in members {
                if !flat.contains(&member) {
                    flat.push(member);
                }
            }
        }
        if flat.len() == 1 {
            flat.remove(0)
        } else {
            Self::Union(flat)
        }
    }

    /// `inner | None`.
    pub fn optional(inner: TypeDecl) -> Self {
        Self::union([inner, Self::None])
    }

    pub fn annotated(inner: TypeDecl, metadata: impl IntoIterator<Item = Value>) -> Self {
        Self::Annotated(Box::new(inner), metadata.into_iter().collect())
    }

    pub fn protocol(protocol: Protocol) -> Self {
        Self::Protocol(protocol)
    }

    pub fn nominal(ty: Arc<dyn NominalType>) -> Self {
        Self::Nominal(ty)
    }

    pub fn type_var(name: impl Into<String>) -> Self {
        Self::TypeVar(name.into())
    }

    /// The registry key of this declaration.
    pub fn origin(&self) -> TypeKey {
        match self {
            Self::Any => TypeKey::Any,
            Self::None => TypeKey::None,
            Self::Bool => TypeKey::Bool,
            Self::Int => TypeKey::Int,
            Self::Float => TypeKey::Float,
            Self::Str => TypeKey::Str,
            Self::List(_) => TypeKey::List,
            Self::Set(_) => TypeKey::Set,
            Self::Sequence(_) => TypeKey::Sequence,
            Self::Tuple { .. } => TypeKey::Tuple,
            Self::Dict(..) => TypeKey::Dict,
            Self::Mapping(..) => TypeKey::Mapping,
            Self::Union(_) => TypeKey::Union,
            Self::Annotated(..) => TypeKey::Annotated,
            Self::Protocol(_) => TypeKey::Protocol,
            Self::Nominal(ty) => TypeKey::Nominal(ty.name().to_owned()),
            Self::TypeVar(_) => TypeKey::TypeVar,
        }
    }

    /// Subclass-style match of this declaration's origin against `key`.
    ///
    /// Nominal types match their own name and anything their bases match.
    pub fn is_subtype_of(&self, key: &TypeKey) -> bool {
        let origin = self.origin();
        if origin.is_subtype_of(key) {
            return true;
        }
        match self {
            Self::Nominal(ty) => ty.bases().iter().any(|base| base.is_subtype_of(key)),
            _ => false,
        }
    }
}

impl PartialEq for TypeDecl {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Any, Self::Any)
            | (Self::None, Self::None)
            | (Self::Bool, Self::Bool)
            | (Self::Int, Self::Int)
            | (Self::Float, Self::Float)
            | (Self::Str, Self::Str) => true,
            (Self::List(a), Self::List(b))
            | (Self::Set(a), Self::Set(b))
            | (Self::Sequence(a), Self::Sequence(b)) => a == b,
            (
                Self::Tuple {
                    items: a,
                    variadic: va,
                },
                Self::Tuple {
                    items: b,
                    variadic: vb,
                },
            ) => va == vb && a == b,
            (Self::Dict(ka, va), Self::Dict(kb, vb))
            | (Self::Mapping(ka, va), Self::Mapping(kb, vb)) => ka == kb && va == vb,
            (Self::Union(a), Self::Union(b)) => a == b,
            (Self::Annotated(a, ma), Self::Annotated(b, mb)) => a == b && ma == mb,
            (Self::Protocol(a), Self::Protocol(b)) => a == b,
            (Self::Nominal(a), Self::Nominal(b)) => a.name() == b.name(),
            (Self::TypeVar(a), Self::TypeVar(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for TypeDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("Any"),
            Self::None => f.write_str("None"),
            Self::Bool => f.write_str("bool"),
            Self::Int => f.write_str("int"),
            Self::Float => f.write_str("float"),
            Self::Str => f.write_str("str"),
            Self::List(elem) => write!(f, "list[{elem}]"),
            Self::Set(elem) => write!(f, "set[{elem}]"),
            Self::Sequence(elem) => write!(f, "Sequence[{elem}]"),
            Self::Tuple { items, variadic } => {
                if items.is_empty() {
                    return f.write_str("tuple[()]");
                }
                f.write_str("tuple[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                if *variadic {
                    f.write_str(", ...")?;
                }
                f.write_str("]")
            }
            Self::Dict(k, v) => write!(f, "dict[{k}, {v}]"),
            Self::Mapping(k, v) => write!(f, "Mapping[{k}, {v}]"),
            Self::Union(alternatives) => {
                for (i, alternative) in alternatives.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{alternative}")?;
                }
                Ok(())
            }
            Self::Annotated(inner, metadata) => {
                write!(f, "Annotated[{inner}")?;
                for item in metadata {
                    write!(f, ", {}", item.repr())?;
                }
                f.write_str("]")
            }
            Self::Protocol(protocol) => f.write_str(&protocol.name),
            Self::Nominal(ty) => f.write_str(ty.name()),
            Self::TypeVar(name) => write!(f, "~{name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(TypeDecl::list(TypeDecl::Int), "list[int]")]
    #[case(TypeDecl::tuple_of(TypeDecl::Int), "tuple[int, ...]")]
    #[case(TypeDecl::tuple([TypeDecl::Int, TypeDecl::Str]), "tuple[int, str]")]
    #[case(TypeDecl::tuple(Vec::<TypeDecl>::new()), "tuple[()]")]
    #[case(TypeDecl::dict(TypeDecl::Str, TypeDecl::Float), "dict[str, float]")]
    #[case(TypeDecl::optional(TypeDecl::Int), "int | None")]
    #[case(TypeDecl::annotated(TypeDecl::Int, [Value::from("meta")]), "Annotated[int, 'meta']")]
    #[case(TypeDecl::type_var("T"), "~T")]
    fn test_display(#[case] decl: TypeDecl, #[case] expected: &str) {
        assert_eq!(decl.to_string(), expected);
    }

    #[test]
    fn test_union_flattens_and_dedups() {
        let decl = TypeDecl::union([
            TypeDecl::Int,
            TypeDecl::union([TypeDecl::Str, TypeDecl::Int]),
            TypeDecl::None,
        ]);
        assert_eq!(
            decl,
            TypeDecl::Union(vec![TypeDecl::Int, TypeDecl::Str, TypeDecl::None])
        );
        assert_eq!(TypeDecl::union([TypeDecl::Int, TypeDecl::Int]), TypeDecl::Int);
    }

    #[test]
    fn test_subtype_relation() {
        assert!(TypeDecl::list(TypeDecl::Int).is_subtype_of(&TypeKey::Sequence));
        assert!(TypeDecl::tuple_of(TypeDecl::Any).is_subtype_of(&TypeKey::Sequence));
        assert!(TypeDecl::dict(TypeDecl::Any, TypeDecl::Any).is_subtype_of(&TypeKey::Mapping));
        assert!(TypeDecl::Bool.is_subtype_of(&TypeKey::Int));
        assert!(!TypeDecl::Int.is_subtype_of(&TypeKey::Bool));
        assert!(!TypeDecl::set(TypeDecl::Any).is_subtype_of(&TypeKey::Sequence));
    }

    #[test]
    fn test_protocol_check() {
        let sized = Protocol::new("Sized", ["len"]);
        assert!(sized.is_satisfied_by(&Value::from("abc")));
        assert!(!sized.is_satisfied_by(&Value::Int(1)));
    }
}
