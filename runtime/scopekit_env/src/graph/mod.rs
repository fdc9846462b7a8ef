//! The environment graph.
//!
//! Environments live in an arena and are addressed by [`EnvId`], a generational
//! handle. Handles are plain data: they can be stored in values, including in
//! the binding table of the environment they name, without creating an
//! ownership cycle. Environments are never copied; every mutation happens on
//! the single node behind the handle and is visible through every holder.
//!
//! # Locking
//!
//! Each node sits behind its own `RwLock`, so writes are serialized per
//! environment while distinct environments stay independent. The arena lock
//! is held only long enough to fetch or insert a node handle, and no code path
//! holds two node locks at once, which is what keeps self-containment
//! (`set(e, n, Value::env(e))`) deadlock-free.

// Arc is the implementation of SharedEnv.
#![expect(
    clippy::disallowed_types,
    reason = "Arc is the implementation of SharedEnv"
)]

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use rustc_hash::FxHashSet;
use scopekit_ir::Name;

use crate::bindings::BindingTable;
use crate::errors::{EnvError, EnvResult, ParentViolation};
use crate::reach::reachable_from;
use crate::value::Value;

/// Source of graph tags; 0 is reserved for the shared empty environment.
static NEXT_GRAPH: AtomicU32 = AtomicU32::new(1);

/// Generational handle to an environment.
///
/// Equality is identity: two environments with identical bindings and the
/// same parent are different environments unless their handles are equal.
/// Handles also carry the tag of the graph that issued them, so a handle
/// from another graph is rejected instead of aliasing a local slot.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct EnvId {
    index: u32,
    generation: u32,
    graph: u32,
}

impl EnvId {
    /// The empty environment: no parent, no bindings, root of every chain.
    /// Shared by every graph.
    pub const EMPTY: EnvId = EnvId {
        index: 0,
        generation: 0,
        graph: 0,
    };

    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }

    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }

    #[inline]
    pub fn is_empty_env(self) -> bool {
        self == EnvId::EMPTY
    }
}

impl fmt::Display for EnvId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.generation == 0 {
            write!(f, "<env {}>", self.index)
        } else {
            write!(f, "<env {}#{}>", self.index, self.generation)
        }
    }
}

/// One environment: its bindings, its parent and an optional label.
#[derive(Debug)]
struct EnvNode {
    bindings: BindingTable,
    parent: Option<EnvId>,
    label: Option<String>,
}

/// Lock-wrapped node shared between the arena and in-flight operations.
#[derive(Clone)]
struct SharedEnv(Arc<RwLock<EnvNode>>);

impl SharedEnv {
    fn new(node: EnvNode) -> Self {
        SharedEnv(Arc::new(RwLock::new(node)))
    }

    fn read(&self) -> RwLockReadGuard<'_, EnvNode> {
        self.0.read()
    }

    fn write(&self) -> RwLockWriteGuard<'_, EnvNode> {
        self.0.write()
    }
}

struct Slot {
    generation: u32,
    /// Birth serial of the current occupant.
    born: u64,
    node: Option<SharedEnv>,
}

struct Arena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    /// Serial handed to the next environment created.
    births: u64,
    /// Bumped by every creation and parent edit.
    version: u64,
}

impl Arena {
    fn slot_node(&self, index: usize, generation: u32) -> Option<&SharedEnv> {
        self.slots
            .get(index)
            .filter(|slot| slot.generation == generation)
            .and_then(|slot| slot.node.as_ref())
    }
}

/// Point in an arena's history, taken before computing a live set.
///
/// [`EnvGraph::reclaim_since`] never reclaims an environment created at or
/// after the watermark, nor anything such an environment reaches.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Watermark(u64);

/// Arena of environments.
pub struct EnvGraph {
    arena: RwLock<Arena>,
    /// Serializes parent edits so the cycle check and the write are atomic.
    parent_edit: Mutex<()>,
    tag: u32,
}

impl EnvGraph {
    /// Create a graph holding only the empty environment.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity.max(1));
        slots.push(Slot {
            generation: 0,
            born: 0,
            node: Some(SharedEnv::new(EnvNode {
                bindings: BindingTable::new(),
                parent: None,
                label: Some("empty".to_owned()),
            })),
        });
        EnvGraph {
            arena: RwLock::new(Arena {
                slots,
                free: Vec::new(),
                live: 1,
                births: 1,
                version: 0,
            }),
            parent_edit: Mutex::new(()),
            tag: NEXT_GRAPH.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Whether `env` was issued by this graph (the empty environment counts).
    #[inline]
    fn issued(&self, env: EnvId) -> bool {
        env.is_empty_env() || env.graph == self.tag
    }

    /// Handle for the occupant of slot `index`.
    fn id_at(&self, index: u32, generation: u32) -> EnvId {
        if index == 0 {
            EnvId::EMPTY
        } else {
            EnvId {
                index,
                generation,
                graph: self.tag,
            }
        }
    }

    fn node_in<'a>(&self, arena: &'a Arena, env: EnvId) -> Option<&'a SharedEnv> {
        if !self.issued(env) {
            return None;
        }
        arena.slot_node(env.index(), env.generation)
    }

    fn node(&self, env: EnvId) -> EnvResult<SharedEnv> {
        let arena = self.arena.read();
        self.node_in(&arena, env)
            .cloned()
            .ok_or(EnvError::StaleEnvironment { env })
    }

    /// Whether `env` is a non-empty environment issued by this graph, live
    /// or not.
    pub(crate) fn owns(&self, env: EnvId) -> bool {
        !env.is_empty_env() && env.graph == self.tag
    }

    /// Create an environment with the given parent and initial bindings.
    ///
    /// The parent is checked under the same lock that inserts the new node,
    /// so a concurrent reclaim cannot free it in between.
    pub fn new_env(&self, parent: EnvId, bindings: BindingTable) -> EnvResult<EnvId> {
        let node = SharedEnv::new(EnvNode {
            bindings,
            parent: Some(parent),
            label: None,
        });

        let mut arena = self.arena.write();
        if self.node_in(&arena, parent).is_none() {
            return Err(EnvError::StaleEnvironment { env: parent });
        }
        let born = arena.births;
        let (index, generation) = if let Some(index) = arena.free.pop() {
            let slot = &mut arena.slots[index as usize];
            slot.node = Some(node);
            slot.born = born;
            (index, slot.generation)
        } else {
            let index = u32::try_from(arena.slots.len())
                .map_err(|_| EnvError::raised("environment arena is full"))?;
            arena.slots.push(Slot {
                generation: 0,
                born,
                node: Some(node),
            });
            (index, 0)
        };
        arena.births += 1;
        arena.version += 1;
        arena.live += 1;
        Ok(self.id_at(index, generation))
    }

    /// Current watermark; take it before computing a live set.
    pub fn watermark(&self) -> Watermark {
        Watermark(self.arena.read().births)
    }

    /// Create a labelled environment, the way search-path entries are made.
    pub fn new_labelled_env(&self, parent: EnvId, label: impl Into<String>) -> EnvResult<EnvId> {
        let env = self.new_env(parent, BindingTable::new())?;
        self.set_label(env, label)?;
        Ok(env)
    }

    /// Whether `env` names a live environment.
    pub fn contains(&self, env: EnvId) -> bool {
        self.node(env).is_ok()
    }

    /// Number of live environments, the empty environment included.
    pub fn len(&self) -> usize {
        self.arena.read().live
    }

    /// Always false: the empty environment is always live.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Handles of every live environment, in arena order.
    pub fn live_envs(&self) -> Vec<EnvId> {
        let arena = self.arena.read();
        arena
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.node.is_some())
            .filter_map(|(index, slot)| Some(self.id_at(u32::try_from(index).ok()?, slot.generation)))
            .collect()
    }

    #[inline]
    pub fn identity_equal(a: EnvId, b: EnvId) -> bool {
        a == b
    }

    /// Parent of `env`; `None` only for the empty environment.
    pub fn parent_of(&self, env: EnvId) -> EnvResult<Option<EnvId>> {
        Ok(self.node(env)?.read().parent)
    }

    /// Re-parent `env`.
    ///
    /// Fails with [`EnvError::InvalidParent`] for the empty environment and
    /// when `parent`'s own chain already reaches `env`, so every chain keeps
    /// ending at the empty environment.
    pub fn set_parent(&self, env: EnvId, parent: EnvId) -> EnvResult<()> {
        if env.is_empty_env() {
            return Err(EnvError::InvalidParent {
                env,
                reason: ParentViolation::EmptyHasNoParent,
            });
        }
        let _edit = self.parent_edit.lock();
        let node = self.node(env)?;
        let mut cursor = Some(parent);
        while let Some(ancestor) = cursor {
            if ancestor == env {
                return Err(EnvError::InvalidParent {
                    env,
                    reason: ParentViolation::Cycle,
                });
            }
            cursor = self.parent_of(ancestor)?;
        }
        node.write().parent = Some(parent);
        self.arena.write().version += 1;
        Ok(())
    }

    /// Chain from `env` up to and including the empty environment.
    pub fn ancestors(&self, env: EnvId) -> EnvResult<Vec<EnvId>> {
        let mut chain = Vec::new();
        let mut cursor = Some(env);
        while let Some(current) = cursor {
            chain.push(current);
            cursor = self.parent_of(current)?;
        }
        Ok(chain)
    }

    /// Number of parent links between `env` and the empty environment.
    pub fn depth(&self, env: EnvId) -> EnvResult<usize> {
        Ok(self.ancestors(env)?.len() - 1)
    }

    pub fn label(&self, env: EnvId) -> EnvResult<Option<String>> {
        Ok(self.node(env)?.read().label.clone())
    }

    pub fn set_label(&self, env: EnvId, label: impl Into<String>) -> EnvResult<()> {
        self.node(env)?.write().label = Some(label.into());
        Ok(())
    }

    /// Run `f` against the binding table of `env` under its read lock.
    pub fn with_bindings<R>(&self, env: EnvId, f: impl FnOnce(&BindingTable) -> R) -> EnvResult<R> {
        let node = self.node(env)?;
        let guard = node.read();
        Ok(f(&guard.bindings))
    }

    pub fn get(&self, env: EnvId, name: Name) -> EnvResult<Option<Value>> {
        self.with_bindings(env, |table| table.get(name).cloned())
    }

    pub fn get_strict(&self, env: EnvId, name: Name) -> EnvResult<Value> {
        self.with_bindings(env, |table| table.get_strict(name).cloned())?
    }

    /// Bind `name` in `env`, replacing any previous binding.
    pub fn set(&self, env: EnvId, name: Name, value: Value) -> EnvResult<()> {
        if env.is_empty_env() {
            return Err(EnvError::EmptyEnvironment);
        }
        self.node(env)?.write().bindings.set(name, value);
        Ok(())
    }

    pub fn remove(&self, env: EnvId, name: Name) -> EnvResult<Option<Value>> {
        Ok(self.node(env)?.write().bindings.remove(name))
    }

    pub fn has(&self, env: EnvId, name: Name) -> EnvResult<bool> {
        self.with_bindings(env, |table| table.has(name))
    }

    pub fn names(&self, env: EnvId) -> EnvResult<Vec<Name>> {
        self.with_bindings(env, BindingTable::names)
    }

    /// Copy of the bindings of `env`, sorted by name handle.
    pub fn snapshot(&self, env: EnvId) -> EnvResult<Vec<(Name, Value)>> {
        self.with_bindings(env, |table| {
            let mut entries: Vec<(Name, Value)> =
                table.iter().map(|(name, value)| (name, value.clone())).collect();
            entries.sort_unstable_by_key(|(name, _)| *name);
            entries
        })
    }

    /// Reclaim every environment not in `live`.
    ///
    /// Hook for the external collector, which computes `live` from the roots.
    /// The empty environment is never reclaimed. Reclaimed slots bump their
    /// generation, so old handles fail with [`EnvError::StaleEnvironment`]
    /// instead of aliasing a reused slot.
    ///
    /// Environments created while this call runs are spared; use
    /// [`reclaim_since`](Self::reclaim_since) when `live` was computed
    /// earlier.
    pub fn reclaim(&self, live: &FxHashSet<EnvId>) -> usize {
        self.reclaim_since(live, self.watermark())
    }

    /// Reclaim every environment not in `live` that was created before
    /// `since`.
    ///
    /// Environments born at or after `since`, and everything they reach,
    /// are spared, so a collector can compute `live` without stopping
    /// creation. Binding writes racing with the collection are not tracked:
    /// run it while no other thread rebinds environment handles.
    pub fn reclaim_since(&self, live: &FxHashSet<EnvId>, since: Watermark) -> usize {
        loop {
            let (version, newborn) = {
                let arena = self.arena.read();
                let newborn: Vec<EnvId> = arena
                    .slots
                    .iter()
                    .enumerate()
                    .filter(|(_, slot)| slot.node.is_some() && slot.born >= since.0)
                    .filter_map(|(index, slot)| {
                        Some(self.id_at(u32::try_from(index).ok()?, slot.generation))
                    })
                    .collect();
                (arena.version, newborn)
            };
            let spared = if newborn.is_empty() {
                FxHashSet::default()
            } else {
                reachable_from(self, newborn, &[])
            };

            let mut dropped = Vec::new();
            let mut arena = self.arena.write();
            if arena.version != version {
                tracing::trace!("arena changed during reclaim; retrying");
                continue;
            }
            let mut freed = Vec::new();
            for (index, slot) in arena.slots.iter_mut().enumerate().skip(1) {
                let Ok(index) = u32::try_from(index) else {
                    break;
                };
                let env = EnvId {
                    index,
                    generation: slot.generation,
                    graph: self.tag,
                };
                if slot.node.is_some()
                    && slot.born < since.0
                    && !live.contains(&env)
                    && !spared.contains(&env)
                {
                    dropped.extend(slot.node.take());
                    slot.generation = slot.generation.wrapping_add(1);
                    freed.push(index);
                }
            }
            arena.live -= freed.len();
            arena.version += 1;
            let reclaimed = freed.len();
            arena.free.extend(freed);
            drop(arena);

            // Nodes drop here, after the arena lock is released.
            drop(dropped);
            tracing::debug!(reclaimed, "reclaimed unreachable environments");
            return reclaimed;
        }
    }
}

impl Default for EnvGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EnvGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvGraph").field("live", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests;
