//! Size estimation for sets of values.
//!
//! The estimator is a collaborator: the engine only promises to hand it every
//! value of a query together, so that anything the values share is counted
//! once. [`HeapSizeEstimator`] is the default.

use rustc_hash::FxHashSet;

use crate::graph::{EnvGraph, EnvId};
use crate::value::{Object, Value, ValueId};

/// Estimates the memory held by a set of values.
pub trait SizeEstimator: Send + Sync {
    /// Bytes held by `values` jointly. Shared objects count once.
    fn estimate(&self, values: &[Value], graph: &EnvGraph) -> usize;
}

/// Header charged for every object.
const OBJECT_HEADER: usize = 48;
/// Payload of a scalar object.
const SCALAR_PAYLOAD: usize = 8;
/// One element slot of a vector.
const POINTER: usize = 8;
/// An environment node, charged once per environment reached.
const ENV_NODE: usize = 56;
/// One binding cell in an environment or closure parameter list.
const BINDING_CELL: usize = 56;

/// Default estimator.
///
/// Walks values, vector elements, closure enclosing environments and
/// environment bindings with visited sets keyed by [`ValueId`] and [`EnvId`],
/// so shared objects and cyclic environments are charged once and the walk
/// terminates. Text payloads are charged once per distinct text, as if every
/// string went through one interning pool. Labelled environments (the empty,
/// base, library and global environments of a runtime) belong to nobody and
/// are not charged.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeapSizeEstimator;

impl HeapSizeEstimator {
    fn text_payload(text: &str) -> usize {
        (text.len() + 1).next_multiple_of(8)
    }
}

impl SizeEstimator for HeapSizeEstimator {
    fn estimate(&self, values: &[Value], graph: &EnvGraph) -> usize {
        let mut seen_values: FxHashSet<ValueId> = FxHashSet::default();
        let mut seen_envs: FxHashSet<EnvId> = FxHashSet::default();
        let mut seen_text: FxHashSet<String> = FxHashSet::default();
        let mut pending: Vec<Value> = values.to_vec();
        let mut total = 0usize;

        while let Some(value) = pending.pop() {
            if !seen_values.insert(value.id()) {
                continue;
            }
            total += OBJECT_HEADER;
            let env = match value.object() {
                Object::Null => None,
                Object::Bool(_) | Object::Int(_) | Object::Float(_) => {
                    total += SCALAR_PAYLOAD;
                    None
                }
                Object::Str(text) => {
                    if seen_text.insert(text.to_string()) {
                        total += Self::text_payload(text);
                    }
                    None
                }
                Object::Vector(items) => {
                    total += POINTER * items.len();
                    pending.extend(items.iter().cloned());
                    None
                }
                Object::Env(env) => Some(env.env()),
                Object::Closure(closure) => {
                    total += BINDING_CELL * closure.arity();
                    Some(closure.enclosing())
                }
            };

            let Some(env) = env else { continue };
            if !seen_envs.insert(env) || !matches!(graph.label(env), Ok(None)) {
                continue;
            }
            if let Ok(bindings) = graph.snapshot(env) {
                total += ENV_NODE + BINDING_CELL * bindings.len();
                pending.extend(bindings.into_iter().map(|(_, value)| value));
            }
        }
        total
    }
}
