//! scopekit environment engine.
//!
//! Models how a reference-counted, copy-on-modify interpreted language keeps
//! its name bindings: values that are shared until modified, environments
//! that are never copied, lexical resolution along parent links, closures
//! that remember where they were created, and a call-frame stack that records
//! who called whom independently of lexical nesting.
//!
//! # Architecture
//!
//! - [`Value`]: shared handle to an [`Object`], copied on modification only
//!   when another holder exists.
//! - [`BindingTable`]: the name-unique map each environment owns.
//! - [`EnvGraph`]: arena of environments addressed by generational
//!   [`EnvId`] handles, one lock per environment.
//! - [`resolve`] / [`resolve_recursive`]: lexical lookup over parent links.
//! - [`Closure`]: parameters, native body, and the captured enclosing env.
//! - [`CallStack`]: dynamic caller chain, consulted only by explicit
//!   caller/dynamic queries.
//! - [`Runtime`]: ties the above together with the search path, invocation,
//!   root tracking and the size/interning collaborators.

mod bindings;
mod closure;
mod config;
mod errors;
mod frames;
mod graph;
mod pool;
mod reach;
mod resolve;
mod runtime;
mod size;
mod stack;
mod store;
mod value;

pub use bindings::BindingTable;
pub use closure::{make_closure, Closure, ClosureBody};
pub use config::{RuntimeConfig, DEFAULT_MAX_DEPTH};
pub use errors::{EnvError, EnvResult, ParentViolation};
pub use frames::{CallFrame, CallStack, FrameId};
pub use graph::{EnvGraph, EnvId, Watermark};
pub use pool::StringPool;
pub use reach::reachable_from;
pub use resolve::{assign_existing, lookup, lookup_optional, resolve, resolve_recursive};
pub use runtime::{FrameGuard, Invocation, Runtime, RuntimeBuilder};
pub use size::{HeapSizeEstimator, SizeEstimator};
pub use stack::ensure_sufficient_stack;
pub use store::ValueStore;
pub use value::{EnvRef, Heap, Object, Value, ValueId};

pub use scopekit_ir::{Name, SharedInterner, StringInterner, StringLookup};
