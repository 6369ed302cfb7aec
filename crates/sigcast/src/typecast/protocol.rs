//! Structural (protocol) caster.

use std::sync::Arc;

use sigcast_value::Value;
use tracing::warn;

use super::caster::{CastError, Caster, SharedCaster};
use super::decl::{Protocol, TypeDecl};
use super::factory::CasterFactory;
use crate::error::ResolveError;
use crate::settings::ProtocolHandling;

/// Checks method presence only; signatures are not verified. Never casts.
///
/// Construction honours `PROTOCOL_HANDLING`: `DISALLOW` refuses to build the
/// caster, `WARN` logs on every validation.
#[derive(Debug, Clone)]
pub struct ProtocolCaster {
    decl: TypeDecl,
    protocol: Protocol,
    handling: ProtocolHandling,
}

impl ProtocolCaster {
    pub fn build(decl: &TypeDecl, factory: &CasterFactory) -> Result<SharedCaster, ResolveError> {
        let TypeDecl::Protocol(protocol) = decl else {
            return Err(ResolveError::Rejected {
                declaration: decl.to_string(),
                reason: "not a protocol".to_owned(),
            });
        };
        let handling = factory.settings().protocol_handling;
        if handling == ProtocolHandling::Disallow {
            return Err(ResolveError::ProtocolDisallowed(protocol.name.clone()));
        }
        Ok(Arc::new(Self {
            decl: decl.clone(),
            protocol: protocol.clone(),
            handling,
        }))
    }
}

impl Caster for ProtocolCaster {
    fn declaration(&self) -> &TypeDecl {
        &self.decl
    }

    fn validate(&self, value: &Value) -> bool {
        if self.handling == ProtocolHandling::Warn {
            warn!(
                protocol = %self.protocol.name,
                "Protocol validation only checks method presence, not signatures"
            );
        }
        self.protocol.is_satisfied_by(value)
    }

    fn cast(&self, value: &Value) -> Result<Value, CastError> {
        if self.protocol.is_satisfied_by(value) {
            return Ok(value.clone());
        }
        Err(CastError::uncastable(&self.decl))
    }
}
