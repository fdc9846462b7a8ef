//! Name-unique binding table owned by one environment.

use rustc_hash::FxHashMap;
use scopekit_ir::Name;

use crate::errors::{EnvError, EnvResult};
use crate::value::Value;

/// Mutable, unordered map from [`Name`] to [`Value`].
///
/// Two lookups are offered on purpose: [`get`](Self::get) treats absence as a
/// normal outcome, [`get_strict`](Self::get_strict) turns it into
/// [`EnvError::NameNotFound`]. Setting a name to [`Value::null`] keeps the
/// binding; only [`remove`](Self::remove) unbinds.
#[derive(Clone, Debug, Default)]
pub struct BindingTable {
    bindings: FxHashMap<Name, Value>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, name: Name) -> Option<&Value> {
        self.bindings.get(&name)
    }

    #[inline]
    pub fn get_strict(&self, name: Name) -> EnvResult<&Value> {
        self.bindings
            .get(&name)
            .ok_or(EnvError::NameNotFound { name })
    }

    /// Bind or rebind `name`, returning the value it replaced.
    #[inline]
    pub fn set(&mut self, name: Name, value: Value) -> Option<Value> {
        self.bindings.insert(name, value)
    }

    /// Unbind `name`, returning the value it held.
    #[inline]
    pub fn remove(&mut self, name: Name) -> Option<Value> {
        self.bindings.remove(&name)
    }

    #[inline]
    pub fn has(&self, name: Name) -> bool {
        self.bindings.contains_key(&name)
    }

    /// Bound names, sorted by handle so listings are deterministic.
    pub fn names(&self) -> Vec<Name> {
        let mut names: Vec<Name> = self.bindings.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bindings in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (Name, &Value)> {
        self.bindings.iter().map(|(name, value)| (*name, value))
    }
}

impl FromIterator<(Name, Value)> for BindingTable {
    fn from_iter<I: IntoIterator<Item = (Name, Value)>>(iter: I) -> Self {
        BindingTable {
            bindings: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for BindingTable {
    type Item = (Name, Value);
    type IntoIter = std::collections::hash_map::IntoIter<Name, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.bindings.into_iter()
    }
}

impl Extend<(Name, Value)> for BindingTable {
    fn extend<I: IntoIterator<Item = (Name, Value)>>(&mut self, iter: I) {
        self.bindings.extend(iter);
    }
}

#[cfg(test)]
mod tests;
