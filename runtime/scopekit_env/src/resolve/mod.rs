//! Lexical name resolution over parent links.
//!
//! Resolution is a pure function of the binding tables along the chain at the
//! moment of the call. Nothing is cached, so a `set` or `remove` anywhere on
//! the chain is observed by the very next lookup. The call-frame stack is
//! never consulted here; see [`Runtime::dynamic_lookup`](crate::Runtime::dynamic_lookup)
//! for the opt-in dynamic variant.

use scopekit_ir::Name;

use crate::errors::{EnvError, EnvResult};
use crate::graph::{EnvGraph, EnvId};
use crate::stack::ensure_sufficient_stack;
use crate::value::Value;

/// Nearest environment at or above `start` that binds `name`.
///
/// Walks parent links iteratively. Fails with [`EnvError::NameNotFound`] once
/// the walk reaches the empty environment, immediately if `start` is it.
pub fn resolve(graph: &EnvGraph, name: Name, start: EnvId) -> EnvResult<EnvId> {
    let mut env = start;
    loop {
        if env.is_empty_env() {
            return Err(EnvError::NameNotFound { name });
        }
        if graph.has(env, name)? {
            tracing::trace!(?name, %env, "resolved");
            return Ok(env);
        }
        // Only the empty environment lacks a parent, and it was handled above.
        env = graph.parent_of(env)?.unwrap_or(EnvId::EMPTY);
    }
}

/// Recursive form of [`resolve`]; same result for every input.
///
/// Kept as the direct statement of the three cases. Each step runs under
/// [`ensure_sufficient_stack`], so deep chains grow the native stack instead
/// of overflowing it.
pub fn resolve_recursive(graph: &EnvGraph, name: Name, start: EnvId) -> EnvResult<EnvId> {
    if start.is_empty_env() {
        return Err(EnvError::NameNotFound { name });
    }
    if graph.has(start, name)? {
        return Ok(start);
    }
    let parent = graph.parent_of(start)?.unwrap_or(EnvId::EMPTY);
    ensure_sufficient_stack(|| resolve_recursive(graph, name, parent))
}

/// Value of `name` as seen from `start`.
pub fn lookup(graph: &EnvGraph, name: Name, start: EnvId) -> EnvResult<Value> {
    let env = resolve(graph, name, start)?;
    graph.get_strict(env, name)
}

/// Like [`lookup`], but absence is `Ok(None)`. Other failures still surface.
pub fn lookup_optional(graph: &EnvGraph, name: Name, start: EnvId) -> EnvResult<Option<Value>> {
    match lookup(graph, name, start) {
        Ok(value) => Ok(Some(value)),
        Err(EnvError::NameNotFound { .. }) => Ok(None),
        Err(err) => Err(err),
    }
}

/// Super-assignment: rebind `name` where it already lives, above `start`.
///
/// The search begins at the parent of `start`. If no ancestor binds `name`,
/// the value is bound in `fallback` (the global environment for a runtime).
/// Returns the environment that received the binding.
pub fn assign_existing(
    graph: &EnvGraph,
    name: Name,
    value: Value,
    start: EnvId,
    fallback: EnvId,
) -> EnvResult<EnvId> {
    let from = graph.parent_of(start)?.unwrap_or(EnvId::EMPTY);
    let target = match resolve(graph, name, from) {
        Ok(env) => env,
        Err(EnvError::NameNotFound { .. }) => fallback,
        Err(err) => return Err(err),
    };
    graph.set(target, name, value)?;
    Ok(target)
}
