//! Environment handles held by values.
//!
//! An [`EnvId`] alone does not keep its environment alive. An [`EnvRef`]
//! does: every `EnvRef` is registered (weakly) when made, and the collector
//! walks the registry to find handles that are held from outside the
//! environment graph, such as a closure the host still owns.

use std::fmt;

use parking_lot::Mutex;

use super::heap::{Heap, WeakHeap};
use crate::graph::EnvId;

/// Every handle made so far, held weakly. Dead entries are pruned as the
/// vector fills and on every scan.
static TRACKED: Mutex<Vec<WeakHeap<EnvId>>> = parking_lot::const_mutex(Vec::new());

/// Owning handle to an environment, stored in [`Object::Env`](super::Object::Env)
/// and in a closure's enclosing slot.
///
/// Cloning shares the handle. Equality and hashing go by the environment.
#[derive(Clone)]
pub struct EnvRef(Heap<EnvId>);

impl EnvRef {
    pub fn new(env: EnvId) -> Self {
        let handle = Heap::new(env);
        // The empty environment is always a root.
        if !env.is_empty_env() {
            let mut tracked = TRACKED.lock();
            if tracked.len() == tracked.capacity() {
                tracked.retain(WeakHeap::is_live);
            }
            tracked.push(Heap::downgrade(&handle));
        }
        EnvRef(handle)
    }

    #[inline]
    pub fn env(&self) -> EnvId {
        *self.0
    }

    /// Identity of the handle allocation, shared by clones.
    pub(crate) fn token(&self) -> usize {
        self.0.addr()
    }

    /// Objects (and standalone closures) currently sharing this handle.
    pub(crate) fn holders(&self) -> usize {
        self.0.holders()
    }
}

/// Live handles whose environment satisfies `owned`.
///
/// Each returned handle adds one holder for as long as it is kept.
pub(crate) fn live_env_refs(owned: impl Fn(EnvId) -> bool) -> Vec<EnvRef> {
    let mut tracked = TRACKED.lock();
    tracked.retain(WeakHeap::is_live);
    tracked
        .iter()
        .filter_map(WeakHeap::upgrade)
        .map(EnvRef)
        .filter(|handle| owned(handle.env()))
        .collect()
}

impl PartialEq for EnvRef {
    fn eq(&self, other: &Self) -> bool {
        self.env() == other.env()
    }
}

impl Eq for EnvRef {}

impl std::hash::Hash for EnvRef {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.env().hash(state);
    }
}

impl fmt::Debug for EnvRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EnvRef({:?})", self.env())
    }
}

impl fmt::Display for EnvRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.env(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::BindingTable;
    use crate::graph::EnvGraph;

    #[test]
    fn test_registry_sees_only_live_handles() {
        let graph = EnvGraph::new();
        let env = graph.new_env(EnvId::EMPTY, BindingTable::new()).unwrap();
        let held = EnvRef::new(env);
        let shared = held.clone();
        drop(EnvRef::new(env));

        let found = live_env_refs(|candidate| candidate == env);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].token(), held.token());
        // `held`, `shared` and the upgraded entry.
        assert_eq!(found[0].holders(), 3);
        drop(shared);
    }

    #[test]
    fn test_empty_env_is_not_tracked() {
        let handle = EnvRef::new(EnvId::EMPTY);
        assert!(live_env_refs(EnvId::is_empty_env).is_empty());
        assert_eq!(handle.env(), EnvId::EMPTY);
    }
}
