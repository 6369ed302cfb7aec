//! Caster registry.
//!
//! Two tables map a [`TypeKey`] to a caster constructor:
//!
//! - **strict**: exact origin match;
//! - **lenient**: ordered; the first key the declaration is a subtype of wins.
//!
//! A process-wide default registry backs [`CasterFactory::global`]. It is
//! copy-on-write: readers hold an `Arc` snapshot, so mutation never blocks a
//! resolution in progress, but registrations are only seen by factories
//! created afterwards.

use std::fmt;
use std::sync::{Arc, LazyLock};

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::{debug, warn};

use super::caster::SharedCaster;
use super::container::{MappingCaster, SequenceCaster, TupleCaster};
use super::decl::{TypeDecl, TypeKey};
use super::factory::CasterFactory;
use super::primitive::{AnyCaster, BoolCaster, NoneCaster, NumberCaster, StrCaster};
use super::protocol::ProtocolCaster;
use super::union::{AnnotatedCaster, UnionCaster};
use crate::error::ResolveError;
use crate::settings;

/// Builds a caster for a declaration, recursing through the factory for
/// contained declarations.
pub type CasterCtor =
    Arc<dyn Fn(&TypeDecl, &CasterFactory) -> Result<SharedCaster, ResolveError> + Send + Sync>;

/// Wraps a closure or function as a [`CasterCtor`].
pub fn ctor<F>(f: F) -> CasterCtor
where
    F: Fn(&TypeDecl, &CasterFactory) -> Result<SharedCaster, ResolveError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Emitted when a registration replaces an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideWarning {
    pub key: TypeKey,
    pub strict: bool,
}

impl fmt::Display for OverrideWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler for '{}' already exists, will override", self.key)
    }
}

/// Strict and lenient caster tables.
#[derive(Clone, Default)]
pub struct CasterRegistry {
    strict: IndexMap<TypeKey, CasterCtor>,
    lenient: Vec<(TypeKey, CasterCtor)>,
}

impl fmt::Debug for CasterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CasterRegistry")
            .field("strict", &self.strict_keys())
            .field("lenient", &self.lenient_keys())
            .finish()
    }
}

impl CasterRegistry {
    /// A registry with no entries; everything resolves to the fallback caster.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The builtin casters.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        let strict: [(TypeKey, CasterCtor); 9] = [
            (TypeKey::Bool, ctor(BoolCaster::build)),
            (TypeKey::Str, ctor(StrCaster::build)),
            (TypeKey::Int, ctor(NumberCaster::build)),
            (TypeKey::Float, ctor(NumberCaster::build)),
            (TypeKey::None, ctor(NoneCaster::build)),
            (TypeKey::Any, ctor(AnyCaster::build)),
            (TypeKey::Annotated, ctor(AnnotatedCaster::build)),
            (TypeKey::Union, ctor(UnionCaster::build)),
            (TypeKey::Protocol, ctor(ProtocolCaster::build)),
        ];
        for (key, ctor) in strict {
            registry.register_ctor([key], true, ctor, false);
        }

        let lenient: [(TypeKey, CasterCtor); 6] = [
            (TypeKey::List, ctor(SequenceCaster::build)),
            (TypeKey::Tuple, ctor(TupleCaster::build)),
            (TypeKey::Set, ctor(SequenceCaster::build)),
            (TypeKey::Dict, ctor(MappingCaster::build)),
            (TypeKey::Sequence, ctor(SequenceCaster::build)),
            (TypeKey::Mapping, ctor(MappingCaster::build)),
        ];
        for (key, ctor) in lenient {
            registry.register_ctor([key], false, ctor, false);
        }
        registry
    }

    /// Registers `ctor` for every key. The new registration always wins.
    ///
    /// Replacing an existing entry logs a warning unless
    /// `WARN_ON_HANDLER_OVERRIDE` is off; the emitted warnings are returned.
    pub fn register<I>(&mut self, keys: I, strict: bool, ctor: CasterCtor) -> Vec<OverrideWarning>
    where
        I: IntoIterator<Item = TypeKey>,
    {
        let warn_on_override = settings::current().warn_on_handler_override;
        self.register_ctor(keys, strict, ctor, warn_on_override)
    }

    /// [`register`](Self::register) with an explicit override-warning flag.
    pub fn register_ctor<I>(
        &mut self,
        keys: I,
        strict: bool,
        ctor: CasterCtor,
        warn_on_override: bool,
    ) -> Vec<OverrideWarning>
    where
        I: IntoIterator<Item = TypeKey>,
    {
        let mut warnings = Vec::new();
        for key in keys {
            let replaced = if strict {
                self.strict.insert(key.clone(), Arc::clone(&ctor)).is_some()
            } else if let Some(entry) = self.lenient.iter_mut().find(|(k, _)| *k == key) {
                entry.1 = Arc::clone(&ctor);
                true
            } else {
                self.lenient.push((key.clone(), Arc::clone(&ctor)));
                false
            };

            debug!(%key, strict, replaced, "registered caster");
            if replaced && warn_on_override {
                let warning = OverrideWarning { key, strict };
                warn!("{warning}");
                warnings.push(warning);
            }
        }
        warnings
    }

    /// Removes `key` from the strict table, or failing that from the lenient
    /// list. Returns whether anything was removed.
    pub fn unregister(&mut self, key: &TypeKey) -> bool {
        if self.unregister_strict(key) {
            return true;
        }
        let before = self.lenient.len();
        self.lenient.retain(|(k, _)| k != key);
        let removed = self.lenient.len() != before;
        if removed {
            debug!(%key, "unregistered lenient caster");
        }
        removed
    }

    /// Removes `key` from the strict table only.
    pub fn unregister_strict(&mut self, key: &TypeKey) -> bool {
        let removed = self.strict.shift_remove(key).is_some();
        if removed {
            debug!(%key, "unregistered strict caster");
        }
        removed
    }

    pub fn strict_keys(&self) -> Vec<TypeKey> {
        self.strict.keys().cloned().collect()
    }

    /// Lenient keys in lookup order.
    pub fn lenient_keys(&self) -> Vec<TypeKey> {
        self.lenient.iter().map(|(k, _)| k.clone()).collect()
    }

    /// Exact-match lookup.
    pub fn strict_ctor(&self, key: &TypeKey) -> Option<&CasterCtor> {
        self.strict.get(key)
    }

    /// First lenient entry `decl` is a subtype of.
    pub fn lenient_ctor(&self, decl: &TypeDecl) -> Option<&CasterCtor> {
        self.lenient
            .iter()
            .find(|(key, _)| decl.is_subtype_of(key))
            .map(|(_, ctor)| ctor)
    }
}

// ============================================================================
// PROCESS-WIDE REGISTRY
// ============================================================================

static REGISTRY: LazyLock<RwLock<Arc<CasterRegistry>>> =
    LazyLock::new(|| RwLock::new(Arc::new(CasterRegistry::with_defaults())));

/// Snapshot of the process-wide registry.
pub fn global() -> Arc<CasterRegistry> {
    Arc::clone(&REGISTRY.read())
}

/// Registers a caster in the process-wide registry.
///
/// Must be serialized by the caller against concurrent building of validated
/// callables; already-built callables keep the casters they resolved.
pub fn register<I>(keys: I, strict: bool, ctor: CasterCtor) -> Vec<OverrideWarning>
where
    I: IntoIterator<Item = TypeKey>,
{
    let mut guard = REGISTRY.write();
    Arc::make_mut(&mut guard).register(keys, strict, ctor)
}

/// See [`CasterRegistry::unregister`].
pub fn unregister(key: &TypeKey) -> bool {
    let mut guard = REGISTRY.write();
    Arc::make_mut(&mut guard).unregister(key)
}

/// See [`CasterRegistry::unregister_strict`].
pub fn unregister_strict(key: &TypeKey) -> bool {
    let mut guard = REGISTRY.write();
    Arc::make_mut(&mut guard).unregister_strict(key)
}

/// Restores the builtin registrations.
pub fn reset_registry() {
    *REGISTRY.write() = Arc::new(CasterRegistry::with_defaults());
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_tables() {
        let registry = CasterRegistry::with_defaults();
        assert_eq!(
            registry.strict_keys(),
            vec![
                TypeKey::Bool,
                TypeKey::Str,
                TypeKey::Int,
                TypeKey::Float,
                TypeKey::None,
                TypeKey::Any,
                TypeKey::Annotated,
                TypeKey::Union,
                TypeKey::Protocol,
            ]
        );
        assert_eq!(
            registry.lenient_keys(),
            vec![
                TypeKey::List,
                TypeKey::Tuple,
                TypeKey::Set,
                TypeKey::Dict,
                TypeKey::Sequence,
                TypeKey::Mapping,
            ]
        );
    }

    #[test]
    fn test_override_reports_warning() {
        let mut registry = CasterRegistry::with_defaults();
        let warnings = registry.register_ctor([TypeKey::Int], true, ctor(StrCaster::build), true);
        assert_eq!(
            warnings,
            vec![OverrideWarning {
                key: TypeKey::Int,
                strict: true
            }]
        );
        assert_eq!(warnings[0].to_string(), "Handler for 'int' already exists, will override");

        let silent = registry.register_ctor([TypeKey::Int], true, ctor(StrCaster::build), false);
        assert!(silent.is_empty());
    }

    #[test]
    fn test_lenient_override_keeps_position() {
        let mut registry = CasterRegistry::with_defaults();
        registry.register_ctor([TypeKey::Tuple], false, ctor(SequenceCaster::build), false);
        assert_eq!(registry.lenient_keys()[1], TypeKey::Tuple);
    }

    #[test]
    fn test_unregister_prefers_strict() {
        let mut registry = CasterRegistry::with_defaults();
        registry.register_ctor([TypeKey::List], true, ctor(SequenceCaster::build), false);

        assert!(registry.unregister(&TypeKey::List));
        assert!(registry.strict_ctor(&TypeKey::List).is_none());
        assert!(registry.lenient_keys().contains(&TypeKey::List));

        assert!(registry.unregister(&TypeKey::List));
        assert!(!registry.lenient_keys().contains(&TypeKey::List));
        assert!(!registry.unregister(&TypeKey::List));
        assert!(!registry.unregister_strict(&TypeKey::Dict));
    }

    #[test]
    fn test_lenient_lookup_first_match() {
        let registry = CasterRegistry::with_defaults();
        let decl = TypeDecl::tuple_of(TypeDecl::Int);
        let found = registry.lenient_ctor(&decl).unwrap();
        let (_, tuple) = registry.lenient.iter().find(|(k, _)| *k == TypeKey::Tuple).unwrap();
        assert!(Arc::ptr_eq(found, tuple));
        assert!(registry.lenient_ctor(&TypeDecl::Int).is_none());
    }
}
