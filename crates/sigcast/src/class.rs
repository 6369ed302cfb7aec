//! Validated classes.
//!
//! A [`Class`] is a nominal type whose constructor is a validated callable:
//! constructing an instance runs the full field pipeline over the constructor
//! arguments and produces a [`Value::Object`]. Used as a parameter type through
//! [`Class::decl`], it lets dicts and sequences be cast into instances, with
//! the constructor's own failures nested under the outer call's error group.
//!
//! ```rust,ignore
//! let student = Class::builder("Student")
//!     .field("name", TypeDecl::Str)
//!     .field_with("age", TypeDecl::Int, arg().validator(ge(0)))
//!     .lazy(true)
//!     .build()?;
//!
//! let pete = student.instantiate(CallArgs::new().kwarg("name", "Pete").kwarg("age", "27"))?;
//! ```

use std::sync::Arc;

use sigcast_value::{ClassMeta, Object, Value};
use tracing::debug;

use crate::args::CallArgs;
use crate::error::{BuildError, CallError};
use crate::field::Argument;
use crate::related::Related;
use crate::signature::{Validated, ValidatedBuilder};
use crate::typecast::{CasterFactory, ConstructError, NominalType, TypeDecl, TypeKey};

/// Builder for [`Class`].
#[derive(Debug, Clone)]
pub struct ClassBuilder {
    meta: ClassMeta,
    bases: Vec<TypeKey>,
    constructor: ValidatedBuilder,
}

impl ClassBuilder {
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, decl: TypeDecl) -> Self {
        self.constructor = self.constructor.param(name, decl);
        self
    }

    #[must_use]
    pub fn field_with(mut self, name: impl Into<String>, decl: TypeDecl, argument: Argument) -> Self {
        self.constructor = self.constructor.param_with(name, decl, argument);
        self
    }

    #[must_use]
    pub fn field_default(mut self, name: impl Into<String>, decl: TypeDecl, default: impl Into<Value>) -> Self {
        self.constructor = self.constructor.param_default(name, decl, default);
        self
    }

    /// Declares a supertype. Instances also count as instances of `base`, and
    /// lenient casters registered for `base` apply to this class.
    #[must_use]
    pub fn base(mut self, base: TypeKey) -> Self {
        self.meta = self.meta.with_base(base.to_string());
        self.bases.push(base);
        self
    }

    /// Declares a method instances answer to, for protocol checks.
    #[must_use]
    pub fn method(mut self, name: impl Into<String>) -> Self {
        self.meta = self.meta.with_method(name);
        self
    }

    #[must_use]
    pub fn lazy(mut self, lazy: bool) -> Self {
        self.constructor = self.constructor.lazy(lazy);
        self
    }

    #[must_use]
    pub fn type_strict(mut self, type_strict: bool) -> Self {
        self.constructor = self.constructor.type_strict(type_strict);
        self
    }

    #[must_use]
    pub fn related(mut self, related: Related) -> Self {
        self.constructor = self.constructor.related(related);
        self
    }

    pub fn build(self) -> Result<Arc<Class>, BuildError> {
        self.build_with(&CasterFactory::global())
    }

    pub fn build_with(self, factory: &CasterFactory) -> Result<Arc<Class>, BuildError> {
        let meta = Arc::new(self.meta);
        let instance_meta = Arc::clone(&meta);
        let constructor = self.constructor.build_with(factory, move |args| {
            Value::Object(Object::new(Arc::clone(&instance_meta), args.into_map()))
        })?;
        debug!(class = meta.name(), bases = self.bases.len(), "built validated class");
        Ok(Arc::new(Class {
            meta,
            bases: self.bases,
            constructor,
        }))
    }
}

/// A nominal type with a validated constructor.
#[derive(Debug)]
pub struct Class {
    meta: Arc<ClassMeta>,
    bases: Vec<TypeKey>,
    constructor: Validated<Value>,
}

impl Class {
    pub fn builder(name: impl Into<String>) -> ClassBuilder {
        let name = name.into();
        ClassBuilder {
            meta: ClassMeta::new(name.clone()),
            bases: Vec::new(),
            constructor: ValidatedBuilder::new(name),
        }
    }

    pub fn meta(&self) -> &Arc<ClassMeta> {
        &self.meta
    }

    pub fn constructor(&self) -> &Validated<Value> {
        &self.constructor
    }

    /// Constructs an instance, reporting the same errors a validated call does.
    pub fn instantiate(&self, args: CallArgs) -> Result<Value, CallError> {
        self.constructor.call(args)
    }

    /// The declaration to use for parameters of this type.
    pub fn decl(self: &Arc<Self>) -> TypeDecl {
        TypeDecl::nominal(Arc::clone(self) as Arc<dyn NominalType>)
    }
}

impl NominalType for Class {
    fn name(&self) -> &str {
        self.meta.name()
    }

    fn bases(&self) -> &[TypeKey] {
        &self.bases
    }

    fn construct(&self, args: CallArgs) -> Result<Value, ConstructError> {
        self.instantiate(args).map_err(ConstructError::from)
    }
}
