//! Construct-by-signature fallback.
//!
//! Used when neither registry table matches: user-defined nominal types, and
//! builtin origins whose default caster was unregistered. Checks are shallow
//! (`isinstance` against the origin) and casting calls the type's
//! constructor: a dict expands to keyword arguments, a list or tuple to
//! positional arguments, anything else is passed as the single argument.

use sigcast_value::{Value, convert};

use super::caster::{CastError, Caster};
use super::decl::{ConstructError, NominalType, TypeDecl};
use crate::args::CallArgs;

#[derive(Debug, Clone)]
pub struct FallbackCaster {
    decl: TypeDecl,
}

impl FallbackCaster {
    pub fn new(decl: TypeDecl) -> Self {
        Self { decl }
    }
}

impl Caster for FallbackCaster {
    fn declaration(&self) -> &TypeDecl {
        &self.decl
    }

    fn validate(&self, value: &Value) -> bool {
        is_instance(&self.decl, value)
    }

    fn cast(&self, value: &Value) -> Result<Value, CastError> {
        if is_instance(&self.decl, value) {
            return Ok(value.clone());
        }
        construct_as(&self.decl, value)
    }
}

fn is_instance(decl: &TypeDecl, value: &Value) -> bool {
    match decl {
        TypeDecl::Any => true,
        TypeDecl::None => value.is_none(),
        TypeDecl::Bool => matches!(value, Value::Bool(_)),
        // bool is a subclass of int
        TypeDecl::Int => matches!(value, Value::Int(_) | Value::Bool(_)),
        TypeDecl::Float => matches!(value, Value::Float(_)),
        TypeDecl::Str => matches!(value, Value::Str(_)),
        TypeDecl::List(_) => matches!(value, Value::List(_)),
        TypeDecl::Set(_) => matches!(value, Value::Set(_)),
        TypeDecl::Sequence(_) => matches!(value, Value::List(_) | Value::Tuple(_) | Value::Str(_)),
        TypeDecl::Tuple { .. } => matches!(value, Value::Tuple(_)),
        TypeDecl::Dict(..) | TypeDecl::Mapping(..) => matches!(value, Value::Dict(_)),
        TypeDecl::Union(alternatives) => alternatives.iter().any(|alt| is_instance(alt, value)),
        TypeDecl::Annotated(inner, _) => is_instance(inner, value),
        TypeDecl::Protocol(protocol) => protocol.is_satisfied_by(value),
        TypeDecl::Nominal(ty) => ty.is_instance(value),
        TypeDecl::TypeVar(_) => false,
    }
}

fn construct_as(decl: &TypeDecl, value: &Value) -> Result<Value, CastError> {
    let converted = match decl {
        TypeDecl::Nominal(ty) => return construct_nominal(decl, ty.as_ref(), value),
        TypeDecl::Protocol(_) | TypeDecl::TypeVar(_) => return Err(CastError::uncastable(decl)),
        TypeDecl::Annotated(inner, _) => return construct_as(inner, value),
        TypeDecl::Union(alternatives) => {
            let mut failures = Vec::with_capacity(alternatives.len());
            for alternative in alternatives {
                match construct_as(alternative, value) {
                    Ok(cast) => return Ok(cast),
                    Err(err) => failures.push(err.to_string()),
                }
            }
            return Err(CastError::cast(decl, failures.join("; ")));
        }
        TypeDecl::None => return Err(CastError::cast(decl, "NoneType takes no arguments")),
        TypeDecl::Any => Ok(value.clone()),
        TypeDecl::Bool => Ok(Value::Bool(convert::to_bool(value))),
        TypeDecl::Int => convert::to_int(value).map(Value::Int),
        TypeDecl::Float => convert::to_float(value).map(Value::Float),
        TypeDecl::Str => Ok(Value::Str(convert::to_str(value))),
        TypeDecl::List(_) | TypeDecl::Sequence(_) => convert::to_items(value).map(Value::List),
        TypeDecl::Tuple { .. } => convert::to_items(value).map(Value::Tuple),
        TypeDecl::Set(_) => convert::to_set(value).map(Value::Set),
        TypeDecl::Dict(..) | TypeDecl::Mapping(..) => convert::to_pairs(value).map(Value::Dict),
    };
    converted.map_err(|err| CastError::cast(decl, err))
}

fn construct_nominal(decl: &TypeDecl, ty: &dyn NominalType, value: &Value) -> Result<Value, CastError> {
    let args = CallArgs::from_value(value).map_err(|err| CastError::cast(decl, err))?;
    ty.construct(args).map_err(|err| match err {
        ConstructError::Invalid(node) => CastError::Nested(Box::new(node)),
        ConstructError::Missing(missing) => CastError::Missing(missing),
        ConstructError::Failed(reason) => CastError::cast(decl, reason),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;
    use sigcast_value::{ClassMeta, Object};

    use super::*;
    use crate::error::MissingArgument;

    /// A point built from `x` and `y`, both required ints.
    #[derive(Debug)]
    struct Point {
        meta: Arc<ClassMeta>,
    }

    impl NominalType for Point {
        fn name(&self) -> &str {
            "Point"
        }

        fn construct(&self, args: CallArgs) -> Result<Value, ConstructError> {
            let mut values = args.positional.into_iter();
            let mut field = |name: &str| {
                args.named
                    .get(name)
                    .cloned()
                    .or_else(|| values.next())
                    .ok_or_else(|| ConstructError::Missing(MissingArgument::new(name)))
            };
            let x = field("x")?;
            let y = field("y")?;
            let mut fields = IndexMap::new();
            fields.insert("x".to_owned(), x);
            fields.insert("y".to_owned(), y);
            Ok(Value::Object(Object::new(Arc::clone(&self.meta), fields)))
        }
    }

    fn point() -> TypeDecl {
        TypeDecl::nominal(Arc::new(Point {
            meta: Arc::new(ClassMeta::new("Point")),
        }))
    }

    #[test]
    fn test_construct_from_mapping_and_sequence() {
        let caster = FallbackCaster::new(point());
        let from_dict = caster.call(&Value::dict([("x", 1), ("y", 2)]), false).unwrap();
        let from_list = caster.call(&Value::list([1, 2]), false).unwrap();
        assert_eq!(from_dict, from_list);
        assert!(caster.validate(&from_dict));
        assert_eq!(from_dict.repr(), "Point(x=1, y=2)");
    }

    #[test]
    fn test_missing_passes_through() {
        let caster = FallbackCaster::new(point());
        let err = caster.call(&Value::dict([("x", 1)]), false).unwrap_err();
        assert_eq!(err, CastError::Missing(MissingArgument::new("y")));
    }

    #[test]
    fn test_non_string_keywords() {
        let caster = FallbackCaster::new(point());
        let err = caster.call(&Value::dict([(1, 1)]), false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Couldn't cast to correct type: Point. keywords must be strings, got int"
        );
    }

    #[test]
    fn test_builtin_origins() {
        let int = FallbackCaster::new(TypeDecl::Int);
        assert!(int.validate(&Value::Bool(true)));
        assert_eq!(int.call(&Value::from("4"), false), Ok(Value::Int(4)));

        let list = FallbackCaster::new(TypeDecl::list(TypeDecl::Int));
        assert_eq!(list.call(&Value::from("ab"), false), Ok(Value::list(["a", "b"])));

        let none = FallbackCaster::new(TypeDecl::None);
        assert!(none.call(&Value::Int(0), false).is_err());
    }

    #[test]
    fn test_cast_keeps_instances() {
        assert_eq!(FallbackCaster::new(TypeDecl::None).cast(&Value::None), Ok(Value::None));
        assert_eq!(FallbackCaster::new(TypeDecl::Int).cast(&Value::Bool(true)), Ok(Value::Bool(true)));

        let caster = FallbackCaster::new(point());
        let p = caster.call(&Value::list([1, 2]), false).unwrap();
        assert_eq!(caster.cast(&p), Ok(p.clone()));
    }
}
