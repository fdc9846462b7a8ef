//! Values: shared by reference, copied on modification.
//!
//! A [`Value`] is a handle to a heap [`Object`]. Cloning the handle shares the
//! object; [`Value::modify`] mutates in place only when this handle is the
//! sole holder and otherwise copies the object into a new allocation (new
//! identity) before mutating, leaving every other holder untouched.
//!
//! Environments are the exception the whole crate is built around: an
//! [`Object::Env`] stores only an [`EnvRef`] handle, so copying the object copies the
//! handle and never the environment. Mutation of an environment always goes
//! through the [`EnvGraph`](crate::EnvGraph) and is seen by every holder.

mod env_ref;
mod heap;

use std::fmt;

pub use env_ref::EnvRef;
pub use heap::Heap;

pub(crate) use env_ref::live_env_refs;

use crate::closure::Closure;
use crate::graph::EnvId;

/// Identity of a value: the address of its heap object.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(usize);

impl ValueId {
    pub fn raw(self) -> usize {
        self.0
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<0x{:x}>", self.0)
    }
}

/// Content of a value.
#[derive(Clone, Debug)]
pub enum Object {
    /// Null marker. Binding it keeps the binding; only removal unbinds.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Text. The payload may be shared between values with identical text.
    Str(Heap<str>),
    /// Ordered elements; copying the vector shares the elements.
    Vector(Vec<Value>),
    /// Reference to an environment.
    Env(EnvRef),
    Closure(Closure),
}

impl Object {
    /// Short kind name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Object::Null => "null",
            Object::Bool(_) => "logical",
            Object::Int(_) => "integer",
            Object::Float(_) => "double",
            Object::Str(_) => "character",
            Object::Vector(_) => "list",
            Object::Env(_) => "environment",
            Object::Closure(_) => "closure",
        }
    }
}

/// Shared handle to an [`Object`].
#[derive(Clone)]
pub struct Value(Heap<Object>);

impl Value {
    /// Wrap an object in a fresh allocation.
    pub fn new(object: Object) -> Self {
        Value(Heap::new(object))
    }

    pub fn null() -> Self {
        Value::new(Object::Null)
    }

    pub fn bool(b: bool) -> Self {
        Value::new(Object::Bool(b))
    }

    pub fn int(n: i64) -> Self {
        Value::new(Object::Int(n))
    }

    pub fn float(x: f64) -> Self {
        Value::new(Object::Float(x))
    }

    /// Text value with its own payload. Use [`StringPool`](crate::StringPool)
    /// to share payloads and identities between equal texts.
    pub fn string(text: &str) -> Self {
        Value::new(Object::Str(Heap::from(text)))
    }

    pub(crate) fn string_with_payload(payload: Heap<str>) -> Self {
        Value::new(Object::Str(payload))
    }

    pub fn vector(items: Vec<Value>) -> Self {
        Value::new(Object::Vector(items))
    }

    pub fn env(env: EnvId) -> Self {
        Value::new(Object::Env(EnvRef::new(env)))
    }

    pub fn closure(closure: Closure) -> Self {
        Value::new(Object::Closure(closure))
    }

    #[inline]
    pub fn object(&self) -> &Object {
        &self.0
    }

    #[inline]
    pub fn id(&self) -> ValueId {
        ValueId(self.0.addr())
    }

    /// Whether `a` and `b` are the same value (same identity).
    #[inline]
    pub fn same(a: &Value, b: &Value) -> bool {
        Heap::ptr_eq(&a.0, &b.0)
    }

    /// Whether another handle shares this value's object.
    #[inline]
    pub fn is_shared(&self) -> bool {
        self.0.is_shared()
    }

    /// Number of handles to this value's object.
    #[inline]
    pub fn holders(&self) -> usize {
        self.0.holders()
    }

    /// Mutate the object, copying it first if another handle shares it.
    ///
    /// After a copy this handle has a new [`ValueId`]; other holders keep the
    /// old object and identity.
    pub fn modify<R>(&mut self, f: impl FnOnce(&mut Object) -> R) -> R {
        if self.0.is_shared() {
            tracing::trace!(from = %self.id(), "copy on modify");
        }
        f(self.0.make_mut())
    }

    pub fn kind(&self) -> &'static str {
        self.0.kind()
    }

    pub fn is_null(&self) -> bool {
        matches!(*self.0, Object::Null)
    }

    pub fn as_int(&self) -> Option<i64> {
        match *self.0 {
            Object::Int(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self.0 {
            Object::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match *self.0 {
            Object::Float(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &*self.0 {
            Object::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[Value]> {
        match &*self.0 {
            Object::Vector(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_env(&self) -> Option<EnvId> {
        match &*self.0 {
            Object::Env(env) => Some(env.env()),
            _ => None,
        }
    }

    pub fn as_closure(&self) -> Option<&Closure> {
        match &*self.0 {
            Object::Closure(closure) => Some(closure),
            _ => None,
        }
    }
}

/// Content equality. Environments compare by handle and closures by identity
/// of their body and enclosing environment, never structurally.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if Value::same(self, other) {
            return true;
        }
        match (self.object(), other.object()) {
            (Object::Null, Object::Null) => true,
            (Object::Bool(a), Object::Bool(b)) => a == b,
            (Object::Int(a), Object::Int(b)) => a == b,
            (Object::Float(a), Object::Float(b)) => a.to_bits() == b.to_bits(),
            (Object::Str(a), Object::Str(b)) => **a == **b,
            (Object::Vector(a), Object::Vector(b)) => a == b,
            (Object::Env(a), Object::Env(b)) => a == b,
            (Object::Closure(a), Object::Closure(b)) => Closure::same(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.object() {
            Object::Null => f.write_str("NULL"),
            Object::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Object::Int(n) => write!(f, "{n}L"),
            Object::Float(x) => write!(f, "{x:?}"),
            Object::Str(s) => write!(f, "{:?}", &**s),
            Object::Vector(items) => f.debug_list().entries(items).finish(),
            Object::Env(env) => write!(f, "{env}"),
            Object::Closure(closure) => write!(f, "{closure:?}"),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::bool(b)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::string(text)
    }
}

impl From<EnvId> for Value {
    fn from(env: EnvId) -> Self {
        Value::env(env)
    }
}

#[cfg(test)]
mod tests;
