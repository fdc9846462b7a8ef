//! Closures: a body paired for life with the environment it was created in.
//!
//! The enclosing environment is fixed at construction. Binding the closure
//! under other names, in other environments, never changes it; those binding
//! environments are simply wherever a binding table holds the closure value.

// Arc is the implementation of ClosureBody.
#![expect(
    clippy::disallowed_types,
    reason = "Arc is the implementation of ClosureBody"
)]

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use scopekit_ir::Name;

use crate::errors::{EnvError, EnvResult};
use crate::graph::EnvId;
use crate::runtime::Runtime;
use crate::value::{EnvRef, Value};

type BodyFn = dyn Fn(&mut Runtime) -> EnvResult<Value> + Send + Sync;

/// Native code run when a closure is invoked.
///
/// The body receives the runtime with the call's frame already pushed, so
/// `runtime.current_env()` is the fresh execution environment holding the
/// parameters.
#[derive(Clone)]
pub struct ClosureBody(Arc<BodyFn>);

impl ClosureBody {
    pub fn new(f: impl Fn(&mut Runtime) -> EnvResult<Value> + Send + Sync + 'static) -> Self {
        ClosureBody(Arc::new(f))
    }

    #[inline]
    pub fn call(&self, runtime: &mut Runtime) -> EnvResult<Value> {
        (self.0)(runtime)
    }

    fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl fmt::Debug for ClosureBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<native body>")
    }
}

/// Callable with a captured enclosing environment.
#[derive(Clone, Debug)]
pub struct Closure {
    params: Vec<Name>,
    body: ClosureBody,
    enclosing: EnvRef,
}

impl Closure {
    /// Fails with [`EnvError::DuplicateParameter`] when a name repeats.
    pub fn new(params: Vec<Name>, body: ClosureBody, enclosing: EnvId) -> EnvResult<Self> {
        let mut seen = FxHashSet::default();
        if let Some(name) = params.iter().find(|name| !seen.insert(**name)) {
            return Err(EnvError::DuplicateParameter { name: *name });
        }
        Ok(Closure {
            params,
            body,
            enclosing: EnvRef::new(enclosing),
        })
    }

    /// Environment captured at creation; never changes.
    #[inline]
    pub fn enclosing(&self) -> EnvId {
        self.enclosing.env()
    }

    /// The handle keeping the enclosing environment alive.
    pub(crate) fn enclosing_ref(&self) -> &EnvRef {
        &self.enclosing
    }

    pub fn params(&self) -> &[Name] {
        &self.params
    }

    pub fn body(&self) -> &ClosureBody {
        &self.body
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub(crate) fn check_arity(&self, got: usize) -> EnvResult<()> {
        if got == self.params.len() {
            Ok(())
        } else {
            Err(EnvError::ArityMismatch {
                expected: self.params.len(),
                got,
            })
        }
    }

    /// Same body, same parameters and same enclosing environment.
    pub fn same(a: &Closure, b: &Closure) -> bool {
        a.enclosing == b.enclosing
            && a.params == b.params
            && ClosureBody::ptr_eq(&a.body, &b.body)
    }
}

/// Build a closure value capturing `enclosing`.
pub fn make_closure(params: Vec<Name>, body: ClosureBody, enclosing: EnvId) -> EnvResult<Value> {
    Closure::new(params, body, enclosing).map(Value::closure)
}
