//! Value store: identity, size and interning in one place.
//!
//! Values own no global state; the store exists so that a runtime has a
//! single seam where the size-estimation and interning collaborators plug in.

use std::fmt;

use crate::graph::EnvGraph;
use crate::pool::StringPool;
use crate::size::{HeapSizeEstimator, SizeEstimator};
use crate::value::{Object, Value, ValueId};

pub struct ValueStore {
    pool: StringPool,
    estimator: Box<dyn SizeEstimator>,
}

impl ValueStore {
    pub fn new(estimator: Box<dyn SizeEstimator>) -> Self {
        ValueStore {
            pool: StringPool::new(),
            estimator,
        }
    }

    /// Allocate `object` as a value with a fresh identity.
    pub fn create(&self, object: Object) -> Value {
        Value::new(object)
    }

    pub fn identity_of(&self, value: &Value) -> ValueId {
        value.id()
    }

    /// Joint size of `values`; whatever they share is counted once.
    pub fn size_of(&self, values: &[Value], graph: &EnvGraph) -> usize {
        self.estimator.estimate(values, graph)
    }

    /// Pooled text value: identical text, identical value.
    pub fn intern(&self, text: &str) -> Value {
        self.pool.intern(text)
    }

    pub fn pool(&self) -> &StringPool {
        &self.pool
    }
}

impl Default for ValueStore {
    fn default() -> Self {
        ValueStore::new(Box::new(HeapSizeEstimator))
    }
}

impl fmt::Debug for ValueStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueStore")
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}
