//! Interning pool for text values.
//!
//! Identical text interned through the pool yields the same [`Value`], so
//! identity comparison and joint size estimation see one object.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::value::{Heap, Value};

/// Deduplicating store of text values.
#[derive(Default)]
pub struct StringPool {
    entries: RwLock<FxHashMap<Heap<str>, Value>>,
}

impl StringPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// The pooled value for `text`, created on first use.
    pub fn intern(&self, text: &str) -> Value {
        if let Some(value) = self.entries.read().get(text) {
            return value.clone();
        }
        let mut entries = self.entries.write();
        if let Some(value) = entries.get(text) {
            return value.clone();
        }
        let payload = Heap::from(text);
        let value = Value::string_with_payload(payload.clone());
        entries.insert(payload, value.clone());
        value
    }

    /// Whether `text` currently has a pooled value.
    pub fn contains(&self, text: &str) -> bool {
        self.entries.read().contains_key(text)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop pooled values nothing outside the pool holds. Returns how many.
    pub fn purge_unused(&self) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, value| value.is_shared());
        before - entries.len()
    }
}

impl std::fmt::Debug for StringPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StringPool").field("len", &self.len()).finish()
    }
}
