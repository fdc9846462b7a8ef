//! Sharded interner for binding names.
//!
//! Names are interned once and never freed: a binding table may outlive the
//! code that created a name, and environments are shared across threads, so
//! the interner hands out `'static` text behind per-shard locks.

// Arc is the implementation of SharedInterner.
#![expect(
    clippy::disallowed_types,
    reason = "Arc is the implementation of SharedInterner"
)]

use std::borrow::Cow;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHasher};

use super::syntax::RESERVED_WORDS;
use super::Name;

struct InternShard {
    map: FxHashMap<&'static str, u32>,
    strings: Vec<&'static str>,
}

impl InternShard {
    fn new() -> Self {
        Self {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(128),
        }
    }
}

/// Error when a shard runs out of 28-bit indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternError {
    ShardOverflow { shard_idx: usize, count: usize },
}

impl std::fmt::Display for InternError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InternError::ShardOverflow { shard_idx, count } => write!(
                f,
                "name interner shard {shard_idx} is full ({count} names, limit {})",
                Name::MAX_LOCAL
            ),
        }
    }
}

impl std::error::Error for InternError {}

/// Interner for binding names.
///
/// `intern` is idempotent: the same text always yields the same [`Name`].
/// Reads take a shard read lock; only first-time inserts take a write lock.
pub struct StringInterner {
    shards: [RwLock<InternShard>; Name::NUM_SHARDS],
    total_count: AtomicUsize,
}

impl StringInterner {
    /// Create an interner with `""` at [`Name::EMPTY`] and the reserved words
    /// of the modelled language already present.
    pub fn new() -> Self {
        let interner = Self {
            shards: std::array::from_fn(|_| RwLock::new(InternShard::new())),
            total_count: AtomicUsize::new(0),
        };
        {
            // The empty name must be shard 0, index 0 regardless of its hash.
            let mut shard = interner.shards[0].write();
            shard.map.insert("", 0);
            shard.strings.push("");
            interner.total_count.store(1, Ordering::Relaxed);
        }
        for word in RESERVED_WORDS {
            interner.intern(word);
        }
        interner
    }

    #[inline]
    fn shard_for(s: &str) -> usize {
        if s.is_empty() {
            return 0;
        }
        let mut hasher = FxHasher::default();
        s.hash(&mut hasher);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "reduced modulo NUM_SHARDS right after"
        )]
        let hash = hasher.finish() as usize;
        hash % Name::NUM_SHARDS
    }

    fn try_intern_cow(&self, s: Cow<'_, str>) -> Result<Name, InternError> {
        let shard_idx = Self::shard_for(&s);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "shard_idx is bounded by NUM_SHARDS (16)"
        )]
        let shard_u32 = shard_idx as u32;
        let shard = &self.shards[shard_idx];

        if let Some(&local) = shard.read().map.get(s.as_ref()) {
            return Ok(Name::new(shard_u32, local));
        }

        let mut guard = shard.write();
        // Another thread may have inserted between the two locks.
        if let Some(&local) = guard.map.get(s.as_ref()) {
            return Ok(Name::new(shard_u32, local));
        }

        let count = guard.strings.len();
        let local = u32::try_from(count)
            .ok()
            .filter(|local| *local <= Name::MAX_LOCAL)
            .ok_or(InternError::ShardOverflow { shard_idx, count })?;

        let leaked: &'static str = Box::leak(s.into_owned().into_boxed_str());
        guard.strings.push(leaked);
        guard.map.insert(leaked, local);
        self.total_count.fetch_add(1, Ordering::Relaxed);

        Ok(Name::new(shard_u32, local))
    }

    /// Intern `s`, or report that its shard is full.
    #[inline]
    pub fn try_intern(&self, s: &str) -> Result<Name, InternError> {
        self.try_intern_cow(Cow::Borrowed(s))
    }

    /// Intern `s`.
    ///
    /// # Panics
    /// Panics if the shard is full (2^28 names). Use `try_intern` to handle it.
    #[inline]
    pub fn intern(&self, s: &str) -> Name {
        self.try_intern(s).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Intern an owned string without copying it again on first insert.
    pub fn intern_owned(&self, s: String) -> Name {
        self.try_intern_cow(Cow::Owned(s))
            .unwrap_or_else(|e| panic!("{e}"))
    }

    /// Text of an interned name.
    pub fn lookup(&self, name: Name) -> &'static str {
        let guard = self.shards[name.shard()].read();
        guard.strings.get(name.local()).copied().unwrap_or("")
    }

    /// Return the name for `s` only if it was interned before.
    pub fn get(&self, s: &str) -> Option<Name> {
        let shard_idx = Self::shard_for(s);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "shard_idx is bounded by NUM_SHARDS (16)"
        )]
        let shard_u32 = shard_idx as u32;
        let local = *self.shards[shard_idx].read().map.get(s)?;
        Some(Name::new(shard_u32, local))
    }

    /// Number of interned names, the empty name included.
    pub fn len(&self) -> usize {
        self.total_count.load(Ordering::Relaxed)
    }

    /// True when only the pre-interned names exist.
    pub fn is_empty(&self) -> bool {
        self.len() <= RESERVED_WORDS.len() + 1
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of an interner, for code that only renders names.
pub trait StringLookup {
    fn lookup(&self, name: Name) -> &str;
}

impl StringLookup for StringInterner {
    fn lookup(&self, name: Name) -> &str {
        StringInterner::lookup(self, name)
    }
}

/// Interner shared between a runtime and the host that embeds it.
#[derive(Clone)]
pub struct SharedInterner(Arc<StringInterner>);

impl SharedInterner {
    pub fn new() -> Self {
        SharedInterner(Arc::new(StringInterner::new()))
    }
}

impl Default for SharedInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for SharedInterner {
    type Target = StringInterner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl StringLookup for SharedInterner {
    fn lookup(&self, name: Name) -> &str {
        self.0.lookup(name)
    }
}

#[cfg(test)]
mod tests;
