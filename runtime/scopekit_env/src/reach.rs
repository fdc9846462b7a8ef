//! Reachability over the environment graph.
//!
//! An environment is reachable from a root environment through its parent
//! link and through every value bound in it: environment handles, closure
//! enclosing environments, and vector elements, transitively. The walk keeps
//! visited sets keyed by [`EnvId`] and [`ValueId`], so self-containing and
//! mutually-referencing environments terminate.
//!
//! Values held outside the graph (by the host, a call frame or a closure
//! body) are roots too. [`held_outside`] finds them by trial deletion: it
//! tallies every reference the graph's own binding tables and vectors make,
//! and whatever has more holders than that tally is held from elsewhere.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::graph::{EnvGraph, EnvId};
use crate::value::{live_env_refs, Object, Value, ValueId};

/// Every live environment reachable from `env_roots` or `value_roots`.
///
/// Handles to reclaimed environments are skipped.
pub fn reachable_from(
    graph: &EnvGraph,
    env_roots: impl IntoIterator<Item = EnvId>,
    value_roots: &[Value],
) -> FxHashSet<EnvId> {
    let mut reached: FxHashSet<EnvId> = FxHashSet::default();
    let mut seen_values: FxHashSet<ValueId> = FxHashSet::default();
    let mut envs: Vec<EnvId> = env_roots.into_iter().collect();
    let mut values: Vec<Value> = value_roots.to_vec();

    loop {
        if let Some(value) = values.pop() {
            if !seen_values.insert(value.id()) {
                continue;
            }
            match value.object() {
                Object::Env(env) => envs.push(env.env()),
                Object::Closure(closure) => envs.push(closure.enclosing()),
                Object::Vector(items) => values.extend(items.iter().cloned()),
                Object::Null | Object::Bool(_) | Object::Int(_) | Object::Float(_) | Object::Str(_) => {}
            }
            continue;
        }

        let Some(env) = envs.pop() else { break };
        if reached.contains(&env) {
            continue;
        }
        let (Ok(parent), Ok(bindings)) = (graph.parent_of(env), graph.snapshot(env)) else {
            tracing::trace!(%env, "skipping reclaimed environment");
            continue;
        };
        reached.insert(env);
        envs.extend(parent);
        values.extend(bindings.into_iter().map(|(_, value)| value));
    }
    reached
}

/// Roots held from outside `graph`'s binding tables.
///
/// Returns the environments named by handles that some holder outside the
/// graph keeps (a handle inside a value the graph does not contain), and
/// the values inside the graph that also have holders outside it. Feeding
/// both to [`reachable_from`] yields everything those holders can still
/// reach. Counts are exact only while no other thread is rebinding.
pub(crate) fn held_outside(graph: &EnvGraph) -> (Vec<EnvId>, Vec<Value>) {
    // One clone per distinct value, plus the number of graph slots naming it.
    let mut tally: FxHashMap<ValueId, (Value, usize)> = FxHashMap::default();
    let mut nested: Vec<Value> = Vec::new();
    let mut note = |value: &Value, nested: &mut Vec<Value>| {
        tally
            .entry(value.id())
            .and_modify(|(_, slots)| *slots += 1)
            .or_insert_with(|| {
                if matches!(value.object(), Object::Vector(_)) {
                    nested.push(value.clone());
                }
                (value.clone(), 1)
            });
    };

    for env in graph.live_envs() {
        // A concurrently reclaimed environment holds nothing.
        let _ = graph.with_bindings(env, |table| {
            for (_, value) in table.iter() {
                note(value, &mut nested);
            }
        });
        while let Some(vector) = nested.pop() {
            if let Object::Vector(items) = vector.object() {
                for item in items {
                    note(item, &mut nested);
                }
            }
        }
    }

    // Objects inside the graph holding each environment handle.
    let mut handle_objects: FxHashMap<usize, usize> = FxHashMap::default();
    for (value, _) in tally.values() {
        let handle = match value.object() {
            Object::Env(env) => env,
            Object::Closure(closure) => closure.enclosing_ref(),
            _ => continue,
        };
        *handle_objects.entry(handle.token()).or_insert(0) += 1;
    }

    // The tally keeps one holder of each value alive.
    let values = tally
        .into_values()
        .filter(|(value, slots)| value.holders() > slots + 1)
        .map(|(value, _)| value)
        .collect();

    // Each upgraded handle is itself one holder.
    let envs = live_env_refs(|env| graph.owns(env))
        .into_iter()
        .filter(|handle| {
            let inside = handle_objects.get(&handle.token()).copied().unwrap_or(0);
            handle.holders() > inside + 1
        })
        .map(|handle| handle.env())
        .collect();

    (envs, values)
}
