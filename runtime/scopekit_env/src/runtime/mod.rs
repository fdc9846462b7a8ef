//! The runtime: environment graph, call stack and collaborators together.
//!
//! A [`Runtime`] starts with the search path `global -> base -> empty`.
//! Library environments are attached between `global` and its parent, the
//! way packages are attached to a search path. Name resolution from any
//! environment is lexical ([`Runtime::resolve`]); caller introspection
//! ([`Runtime::caller_env`], [`Runtime::dynamic_lookup`]) is a separate,
//! explicit channel over the call stack.

mod builder;
mod frame_guard;

use rustc_hash::{FxHashMap, FxHashSet};
use scopekit_ir::{Name, SharedInterner};

pub use builder::RuntimeBuilder;
pub use frame_guard::FrameGuard;

use crate::bindings::BindingTable;
use crate::closure::{make_closure, ClosureBody};
use crate::config::RuntimeConfig;
use crate::errors::{EnvError, EnvResult};
use crate::frames::{CallFrame, CallStack, FrameId};
use crate::graph::{EnvGraph, EnvId};
use crate::reach::{held_outside, reachable_from};
use crate::resolve;
use crate::size::SizeEstimator;
use crate::stack::ensure_sufficient_stack;
use crate::store::ValueStore;
use crate::value::Value;

/// Outcome of [`Runtime::invoke`].
#[derive(Clone, Debug)]
pub struct Invocation {
    /// Value returned by the closure body.
    pub value: Value,
    /// Execution environment created for the call. It outlives the call only
    /// if something reachable still refers to it.
    pub env: EnvId,
}

/// Environment engine with a search path and a call stack.
pub struct Runtime {
    graph: EnvGraph,
    stack: CallStack,
    store: ValueStore,
    interner: SharedInterner,
    base: EnvId,
    global: EnvId,
    /// Host-held roots with their pin counts.
    pinned: FxHashMap<EnvId, usize>,
}

impl Runtime {
    /// Runtime with default configuration.
    pub fn new() -> Self {
        RuntimeBuilder::new().build()
    }

    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    fn from_parts(
        config: RuntimeConfig,
        interner: SharedInterner,
        estimator: Box<dyn SizeEstimator>,
    ) -> Self {
        let graph = EnvGraph::with_capacity(config.initial_capacity);
        #[expect(
            clippy::expect_used,
            reason = "a fresh graph always has a live empty environment to parent on"
        )]
        let (base, global) = {
            let base = graph
                .new_labelled_env(EnvId::EMPTY, "base")
                .expect("base environment");
            let global = graph
                .new_labelled_env(base, "global")
                .expect("global environment");
            (base, global)
        };
        Runtime {
            graph,
            stack: CallStack::new(config.max_depth),
            store: ValueStore::new(estimator),
            interner,
            base,
            global,
            pinned: FxHashMap::default(),
        }
    }

    #[inline]
    pub fn graph(&self) -> &EnvGraph {
        &self.graph
    }

    #[inline]
    pub fn stack(&self) -> &CallStack {
        &self.stack
    }

    #[inline]
    pub fn store(&self) -> &ValueStore {
        &self.store
    }

    #[inline]
    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    /// Intern `text` as a binding name.
    #[inline]
    pub fn name(&self, text: &str) -> Name {
        self.interner.intern(text)
    }

    #[inline]
    pub fn global(&self) -> EnvId {
        self.global
    }

    #[inline]
    pub fn base(&self) -> EnvId {
        self.base
    }

    #[inline]
    pub fn empty(&self) -> EnvId {
        EnvId::EMPTY
    }

    /// Execution environment of the innermost frame, or global at top level.
    pub fn current_env(&self) -> EnvId {
        self.stack
            .current()
            .and_then(|frame| self.stack.frame(frame))
            .map_or(self.global, CallFrame::env)
    }

    /// Create an environment. `parent` defaults to [`current_env`](Self::current_env);
    /// pass `Some(EnvId::EMPTY)` for an isolated environment that inherits
    /// nothing.
    pub fn new_env(
        &self,
        parent: Option<EnvId>,
        bindings: impl IntoIterator<Item = (Name, Value)>,
    ) -> EnvResult<EnvId> {
        let parent = parent.unwrap_or_else(|| self.current_env());
        self.graph.new_env(parent, bindings.into_iter().collect())
    }

    #[inline]
    pub fn identity_equal(&self, a: EnvId, b: EnvId) -> bool {
        EnvGraph::identity_equal(a, b)
    }

    // Lexical resolution

    /// Nearest environment at or above `start` binding `name`.
    pub fn resolve(&self, name: Name, start: EnvId) -> EnvResult<EnvId> {
        resolve::resolve(&self.graph, name, start)
    }

    /// Value of `name` seen from `start`.
    pub fn lookup(&self, name: Name, start: EnvId) -> EnvResult<Value> {
        resolve::lookup(&self.graph, name, start)
    }

    /// Value of `name` seen from the current environment.
    pub fn lookup_here(&self, name: Name) -> EnvResult<Value> {
        self.lookup(name, self.current_env())
    }

    pub fn lookup_optional(&self, name: Name, start: EnvId) -> EnvResult<Option<Value>> {
        resolve::lookup_optional(&self.graph, name, start)
    }

    /// Bind `name` in the current environment.
    pub fn assign(&self, name: Name, value: Value) -> EnvResult<()> {
        self.graph.set(self.current_env(), name, value)
    }

    /// Super-assignment from the current environment: rebind `name` in the
    /// nearest enclosing environment that has it, else in global.
    pub fn assign_existing(&self, name: Name, value: Value) -> EnvResult<EnvId> {
        resolve::assign_existing(&self.graph, name, value, self.current_env(), self.global)
    }

    // Closures and calls

    /// Closure over the current environment. Parameter names must be
    /// distinct.
    pub fn make_closure(
        &self,
        params: &[&str],
        body: impl Fn(&mut Runtime) -> EnvResult<Value> + Send + Sync + 'static,
    ) -> EnvResult<Value> {
        self.make_closure_in(self.current_env(), params, body)
    }

    /// Closure over an explicit enclosing environment.
    pub fn make_closure_in(
        &self,
        enclosing: EnvId,
        params: &[&str],
        body: impl Fn(&mut Runtime) -> EnvResult<Value> + Send + Sync + 'static,
    ) -> EnvResult<Value> {
        let params = params.iter().map(|p| self.name(p)).collect();
        make_closure(params, ClosureBody::new(body), enclosing)
    }

    /// Call a closure value.
    ///
    /// Creates the execution environment (parent: the closure's enclosing
    /// environment), binds the parameters, pushes a frame whose caller is the
    /// current frame, runs the body, and pops the frame on every exit path.
    #[tracing::instrument(level = "debug", skip_all, fields(depth = self.stack.depth(), args = args.len()))]
    pub fn invoke(&mut self, callee: &Value, args: &[Value]) -> EnvResult<Invocation> {
        let Some(closure) = callee.as_closure() else {
            return Err(EnvError::NotCallable {
                kind: callee.kind(),
            });
        };
        closure.check_arity(args.len())?;
        if let Err(err) = self.stack.check_room() {
            tracing::debug!(%err, "refusing call");
            return Err(err);
        }

        let bindings: BindingTable = closure
            .params()
            .iter()
            .copied()
            .zip(args.iter().cloned())
            .collect();
        let env = self.graph.new_env(closure.enclosing(), bindings)?;
        let body = closure.body().clone();
        let caller = self.stack.current();

        let mut frame = self.enter_frame(CallFrame::new(env, callee.clone(), caller))?;
        let value = ensure_sufficient_stack(|| body.call(&mut frame))?;
        Ok(Invocation { value, env })
    }

    // Call frames

    pub fn current_frame(&self) -> Option<FrameId> {
        self.stack.current()
    }

    pub fn caller_frame(&self, of: FrameId) -> Option<FrameId> {
        self.stack.caller_frame(of)
    }

    /// Environment `of` was called from: the caller frame's environment, or
    /// global for a call made at top level.
    pub fn caller_env(&self, of: FrameId) -> EnvId {
        self.stack.caller_env(of).unwrap_or(self.global)
    }

    /// Active frames, innermost first.
    pub fn frames(&self) -> impl Iterator<Item = (FrameId, &CallFrame)> {
        self.stack.frames()
    }

    /// Dynamic lookup: search the callers' environments, not the lexical
    /// chain.
    ///
    /// Starting from the caller of the current frame, each caller's execution
    /// environment is checked on its own (no parents), ending with global.
    /// Returns `Ok(None)` at top level or when no caller binds `name`. This
    /// is an opt-in channel and never participates in [`resolve`](Self::resolve).
    pub fn dynamic_lookup(&self, name: Name) -> EnvResult<Option<Value>> {
        let Some(mut frame) = self.stack.current() else {
            return Ok(None);
        };
        while let Some(caller) = self.stack.caller_frame(frame) {
            if let Some(env) = self.stack.frame(caller).map(CallFrame::env) {
                if let Some(value) = self.graph.get(env, name)? {
                    return Ok(Some(value));
                }
            }
            frame = caller;
        }
        self.graph.get(self.global, name)
    }

    /// Every `(environment, name)` whose binding holds exactly `value`.
    ///
    /// For a closure these are its binding environments, which are unrelated
    /// to its enclosing environment.
    pub fn bindings_of(&self, value: &Value) -> EnvResult<Vec<(EnvId, Name)>> {
        let mut found = Vec::new();
        for env in self.graph.live_envs() {
            for (name, bound) in self.graph.snapshot(env)? {
                if Value::same(&bound, value) {
                    found.push((env, name));
                }
            }
        }
        Ok(found)
    }

    // Search path

    /// Attach a pre-built library environment just below global.
    pub fn attach(
        &self,
        label: &str,
        bindings: impl IntoIterator<Item = (Name, Value)>,
    ) -> EnvResult<EnvId> {
        let below = self.graph.parent_of(self.global)?.unwrap_or(self.base);
        let library = self.graph.new_labelled_env(below, label)?;
        for (name, value) in bindings {
            self.graph.set(library, name, value)?;
        }
        self.graph.set_parent(self.global, library)?;
        tracing::debug!(label, env = %library, "attached");
        Ok(library)
    }

    /// Remove the nearest library environment labelled `label` from the
    /// search path. The environment itself lives on while reachable.
    pub fn detach(&self, label: &str) -> EnvResult<Option<EnvId>> {
        let mut below_of = self.global;
        while let Some(env) = self.graph.parent_of(below_of)? {
            if env == self.base || env.is_empty_env() {
                break;
            }
            if self.graph.label(env)?.as_deref() == Some(label) {
                let next = self.graph.parent_of(env)?.unwrap_or(self.base);
                self.graph.set_parent(below_of, next)?;
                tracing::debug!(label, %env, "detached");
                return Ok(Some(env));
            }
            below_of = env;
        }
        Ok(None)
    }

    /// Global, attached libraries, base and empty, in lookup order.
    pub fn search_path(&self) -> EnvResult<Vec<EnvId>> {
        self.graph.ancestors(self.global)
    }

    // Roots and collection

    /// Keep `env` alive as a host-held root. Pins nest.
    pub fn pin(&mut self, env: EnvId) -> EnvResult<()> {
        if !self.graph.contains(env) {
            return Err(EnvError::StaleEnvironment { env });
        }
        *self.pinned.entry(env).or_insert(0) += 1;
        Ok(())
    }

    /// Drop one pin of `env`; returns whether a pin was held.
    pub fn unpin(&mut self, env: EnvId) -> bool {
        let Some(count) = self.pinned.get_mut(&env) else {
            return false;
        };
        *count -= 1;
        if *count == 0 {
            self.pinned.remove(&env);
        }
        true
    }

    /// Every environment reachable from the roots: empty, base, the search
    /// path, active frames (their environments and callees), pins, and every
    /// value or closure the host still holds outside the binding tables.
    ///
    /// A bare [`EnvId`] is not a root; an environment value or a closure is.
    pub fn reachable_roots(&self) -> FxHashSet<EnvId> {
        let (held_envs, mut values) = held_outside(&self.graph);
        let mut roots = vec![EnvId::EMPTY, self.base, self.global];
        roots.extend(self.pinned.keys().copied());
        roots.extend(held_envs);
        for (_, frame) in self.stack.frames() {
            roots.push(frame.env());
            values.push(frame.callee().clone());
        }
        reachable_from(&self.graph, roots, &values)
    }

    /// Reclaim every environment outside [`reachable_roots`](Self::reachable_roots).
    pub fn collect(&self) -> usize {
        let since = self.graph.watermark();
        let live = self.reachable_roots();
        self.graph.reclaim_since(&live, since)
    }

    // Collaborators

    /// Joint size of `values`.
    pub fn estimate_size(&self, values: &[Value]) -> usize {
        self.store.size_of(values, &self.graph)
    }

    /// Pooled text value.
    pub fn intern(&self, text: &str) -> Value {
        self.store.intern(text)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("graph", &self.graph)
            .field("depth", &self.stack.depth())
            .field("global", &self.global)
            .finish_non_exhaustive()
    }
}
