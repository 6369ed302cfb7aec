//! Parameter aliases.
//!
//! An alias is an alternative keyword a caller may use for a parameter, e.g.
//! when arguments come from a dict with external naming. Aliases and
//! parameter names share one namespace.

use std::collections::HashSet;

use indexmap::IndexMap;
use sigcast_value::Value;
use tracing::trace;

use crate::error::BuildError;

/// Fails if any parameter name or alias appears twice.
pub fn check_alias_collisions<'a, N, A>(names: N, aliases: A) -> Result<(), BuildError>
where
    N: IntoIterator<Item = &'a str>,
    A: IntoIterator<Item = Option<&'a str>>,
{
    let mut seen = HashSet::new();
    for name in names.into_iter().chain(aliases.into_iter().flatten()) {
        if !seen.insert(name) {
            return Err(BuildError::AliasCollision { name: name.to_owned() });
        }
    }
    Ok(())
}

/// Moves every aliased keyword to its parameter name.
///
/// `aliases` yields `(parameter, alias)`. When a call passes both the alias
/// and the plain name, the alias wins and the plain value is dropped.
pub fn process_aliases<'a, I>(aliases: I, mut named: IndexMap<String, Value>) -> IndexMap<String, Value>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    for (param, alias) in aliases {
        if let Some(value) = named.shift_remove(alias) {
            trace!(param, alias, "resolved alias");
            named.insert(param.to_owned(), value);
        }
    }
    named
}
