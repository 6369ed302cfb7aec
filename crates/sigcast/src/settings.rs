//! Process-wide settings.
//!
//! Settings are plain data ([`Settings`]) plus one global instance behind a
//! `parking_lot::RwLock`. Named access is case-insensitive:
//!
//! ```rust,ignore
//! use sigcast::settings::{self, ProtocolHandling};
//!
//! settings::set("warn_on_handler_override", false)?;
//! settings::set("PROTOCOL_HANDLING", ProtocolHandling::Disallow)?;
//! assert!(!settings::current().warn_on_handler_override);
//! settings::reset();
//! ```
//!
//! Mutating settings while validated calls run on other threads is not
//! coordinated: the change is visible to casters resolved afterwards only.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Prefix of environment variables read by [`Settings::from_env`].
pub const ENV_PREFIX: &str = "SIGCAST_";

const WARN_ON_HANDLER_OVERRIDE: &str = "WARN_ON_HANDLER_OVERRIDE";
const PROTOCOL_HANDLING: &str = "PROTOCOL_HANDLING";
const ALLOW_TUPLE_ADDITIONAL_PARAMS: &str = "ALLOW_TUPLE_ADDITIONAL_PARAMS";

/// How structural (protocol) declarations are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolHandling {
    /// Protocol casters are built and used silently.
    Allow,
    /// Every protocol validation logs a warning.
    #[default]
    Warn,
    /// Resolving a protocol declaration fails.
    Disallow,
}

impl fmt::Display for ProtocolHandling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Allow => "ALLOW",
            Self::Warn => "WARN",
            Self::Disallow => "DISALLOW",
        })
    }
}

impl FromStr for ProtocolHandling {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(Self::Allow),
            "warn" => Ok(Self::Warn),
            "disallow" => Ok(Self::Disallow),
            _ => Err("expected one of allow, warn, disallow".to_owned()),
        }
    }
}

/// Typed value of a single named setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingValue {
    Bool(bool),
    Protocol(ProtocolHandling),
}

impl SettingValue {
    const fn type_name(self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Protocol(_) => "ProtocolHandling",
        }
    }
}

impl From<bool> for SettingValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<ProtocolHandling> for SettingValue {
    fn from(v: ProtocolHandling) -> Self {
        Self::Protocol(v)
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Protocol(p) => write!(f, "{p}"),
        }
    }
}

/// Errors from named setting access and environment loading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("Setting {0} doesn't exist")]
    Unknown(String),

    #[error("Setting {name} expects a {expected} value, got {got}")]
    WrongType {
        name: String,
        expected: &'static str,
        got: &'static str,
    },

    #[error("Invalid value '{value}' for setting {name}: {reason}")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },
}

/// The full set of toggles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Log a warning when a registration replaces an existing caster.
    pub warn_on_handler_override: bool,
    /// Policy for structural (protocol) declarations.
    pub protocol_handling: ProtocolHandling,
    /// Let fixed-arity tuples accept positions beyond the declared ones.
    pub allow_tuple_additional_params: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            warn_on_handler_override: true,
            protocol_handling: ProtocolHandling::Warn,
            allow_tuple_additional_params: false,
        }
    }
}

impl Settings {
    /// Reads a setting by (case-insensitive) name.
    pub fn get(&self, name: &str) -> Result<SettingValue, SettingsError> {
        match name.to_ascii_uppercase().as_str() {
            WARN_ON_HANDLER_OVERRIDE => Ok(self.warn_on_handler_override.into()),
            PROTOCOL_HANDLING => Ok(self.protocol_handling.into()),
            ALLOW_TUPLE_ADDITIONAL_PARAMS => Ok(self.allow_tuple_additional_params.into()),
            _ => Err(SettingsError::Unknown(name.to_owned())),
        }
    }

    /// Changes a setting by (case-insensitive) name.
    pub fn set(&mut self, name: &str, value: SettingValue) -> Result<(), SettingsError> {
        let key = name.to_ascii_uppercase();
        match (key.as_str(), value) {
            (WARN_ON_HANDLER_OVERRIDE, SettingValue::Bool(v)) => self.warn_on_handler_override = v,
            (ALLOW_TUPLE_ADDITIONAL_PARAMS, SettingValue::Bool(v)) => {
                self.allow_tuple_additional_params = v;
            }
            (PROTOCOL_HANDLING, SettingValue::Protocol(v)) => self.protocol_handling = v,
            (WARN_ON_HANDLER_OVERRIDE | ALLOW_TUPLE_ADDITIONAL_PARAMS, other) => {
                return Err(SettingsError::WrongType {
                    name: key,
                    expected: "bool",
                    got: other.type_name(),
                });
            }
            (PROTOCOL_HANDLING, other) => {
                return Err(SettingsError::WrongType {
                    name: key,
                    expected: "ProtocolHandling",
                    got: other.type_name(),
                });
            }
            _ => return Err(SettingsError::Unknown(name.to_owned())),
        }
        Ok(())
    }

    /// Loads settings from `SIGCAST_*` environment variables on top of the defaults.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_vars(std::env::vars())
    }

    /// Loads settings from an explicit set of `(key, value)` pairs.
    ///
    /// Keys without the [`ENV_PREFIX`] are ignored; prefixed keys that name no
    /// setting are skipped with a warning.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut settings = Self::default();
        for (key, raw) in vars {
            let Some(name) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match settings.set_from_str(name, raw.as_ref()) {
                Ok(()) => {
                    trace!(setting = name, value = raw.as_ref(), "loaded setting from environment");
                }
                Err(SettingsError::Unknown(_)) => {
                    warn!(setting = name, "ignoring unknown sigcast environment setting");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(settings)
    }

    fn set_from_str(&mut self, name: &str, raw: &str) -> Result<(), SettingsError> {
        let invalid = |reason: String| SettingsError::InvalidValue {
            name: name.to_ascii_uppercase(),
            value: raw.to_owned(),
            reason,
        };
        let value = match self.get(name)? {
            SettingValue::Bool(_) => SettingValue::Bool(parse_bool(raw).ok_or_else(|| {
                invalid("expected one of true, false, 1, 0, yes, no, on, off".to_owned())
            })?),
            SettingValue::Protocol(_) => SettingValue::Protocol(raw.parse().map_err(invalid)?),
        };
        self.set(name, value)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ============================================================================
// GLOBAL INSTANCE
// ============================================================================

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

/// Snapshot of the process-wide settings.
pub fn current() -> Settings {
    SETTINGS.read().clone()
}

/// Reads a process-wide setting by name.
pub fn get(name: &str) -> Result<SettingValue, SettingsError> {
    SETTINGS.read().get(name)
}

/// Changes a process-wide setting by name.
pub fn set(name: &str, value: impl Into<SettingValue>) -> Result<(), SettingsError> {
    let value = value.into();
    SETTINGS.write().set(name, value)?;
    debug!(setting = name, %value, "setting changed");
    Ok(())
}

/// Replaces all process-wide settings, returning the previous ones.
pub fn replace(settings: Settings) -> Settings {
    std::mem::replace(&mut *SETTINGS.write(), settings)
}

/// Restores the defaults.
pub fn reset() {
    replace(Settings::default());
}
