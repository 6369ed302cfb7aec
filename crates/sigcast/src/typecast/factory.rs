//! Caster resolution.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use super::caster::SharedCaster;
use super::decl::TypeDecl;
use super::fallback::FallbackCaster;
use super::registry::{self, CasterRegistry};
use crate::error::ResolveError;
use crate::settings::{self, Settings};

/// Resolves declarations to casters against a registry and a settings snapshot.
#[derive(Clone)]
pub struct CasterFactory {
    registry: Arc<CasterRegistry>,
    settings: Settings,
}

impl fmt::Debug for CasterFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CasterFactory")
            .field("registry", &self.registry)
            .field("settings", &self.settings)
            .finish()
    }
}

impl CasterFactory {
    pub fn new(registry: Arc<CasterRegistry>, settings: Settings) -> Self {
        Self { registry, settings }
    }

    /// Snapshots the process-wide registry and settings.
    pub fn global() -> Self {
        Self::new(registry::global(), settings::current())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &CasterRegistry {
        &self.registry
    }

    /// Resolves `decl`:
    ///
    /// 1. strict registry, exact origin match;
    /// 2. type variables are rejected;
    /// 3. lenient registry, first subtype match;
    /// 4. the fallback caster.
    ///
    /// Composite casters call back into the factory for their contained
    /// declarations.
    pub fn resolve(&self, decl: &TypeDecl) -> Result<SharedCaster, ResolveError> {
        let origin = decl.origin();

        if let Some(ctor) = self.registry.strict_ctor(&origin) {
            trace!(%decl, %origin, "resolved strict caster");
            return ctor(decl, self);
        }

        if let TypeDecl::TypeVar(name) = decl {
            return Err(ResolveError::Unsupported(name.clone()));
        }

        if let Some(ctor) = self.registry.lenient_ctor(decl) {
            trace!(%decl, %origin, "resolved lenient caster");
            return ctor(decl, self);
        }

        trace!(%decl, "falling back to construct-by-signature");
        Ok(Arc::new(FallbackCaster::new(decl.clone())))
    }
}

impl Default for CasterFactory {
    fn default() -> Self {
        Self::new(Arc::new(CasterRegistry::with_defaults()), Settings::default())
    }
}

/// Resolves against the process-wide registry and settings.
pub fn resolve(decl: &TypeDecl) -> Result<SharedCaster, ResolveError> {
    CasterFactory::global().resolve(decl)
}
