//! Shared heap allocation behind every `Value`.

// Arc is the implementation of Heap<T>; all construction goes through here.
#![expect(
    clippy::disallowed_types,
    reason = "Arc is the implementation of Heap<T>"
)]

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::{Arc, Weak};

/// Atomically reference-counted allocation with identity.
///
/// The constructor is crate-private: values are made through the `Value`
/// factories so that every allocation site is one this crate controls.
pub struct Heap<T: ?Sized>(Arc<T>);

impl<T> Heap<T> {
    #[inline]
    pub(crate) fn new(value: T) -> Self {
        Heap(Arc::new(value))
    }
}

impl<T: ?Sized> Heap<T> {
    /// Address of the allocation; stable for as long as any holder lives.
    #[inline]
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0).cast::<()>() as usize
    }

    /// Whether `a` and `b` are the same allocation.
    #[inline]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Whether any other holder shares this allocation. Exact, not estimated.
    #[inline]
    pub fn is_shared(&self) -> bool {
        Arc::strong_count(&self.0) > 1 || Arc::weak_count(&self.0) > 0
    }

    /// Number of holders of this allocation.
    #[inline]
    pub fn holders(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    /// Non-owning reference to this allocation.
    pub(crate) fn downgrade(this: &Self) -> WeakHeap<T> {
        WeakHeap(Arc::downgrade(&this.0))
    }
}

/// Non-owning counterpart of [`Heap`]; does not count as a holder.
pub(crate) struct WeakHeap<T: ?Sized>(Weak<T>);

impl<T: ?Sized> WeakHeap<T> {
    pub(crate) fn upgrade(&self) -> Option<Heap<T>> {
        self.0.upgrade().map(Heap)
    }

    pub(crate) fn is_live(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl<T: Clone> Heap<T> {
    /// Mutable access, cloning into a fresh allocation first when shared.
    #[inline]
    pub(crate) fn make_mut(&mut self) -> &mut T {
        Arc::make_mut(&mut self.0)
    }
}

impl From<&str> for Heap<str> {
    fn from(text: &str) -> Self {
        Heap(Arc::from(text))
    }
}

impl<T: ?Sized> Clone for Heap<T> {
    #[inline]
    fn clone(&self) -> Self {
        Heap(Arc::clone(&self.0))
    }
}

impl<T: ?Sized> Deref for Heap<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized> Borrow<T> for Heap<T> {
    fn borrow(&self) -> &T {
        &self.0
    }
}

/// Content equality; use [`Heap::ptr_eq`] for identity.
impl<T: ?Sized + PartialEq> PartialEq for Heap<T> {
    fn eq(&self, other: &Self) -> bool {
        *self.0 == *other.0
    }
}

impl<T: ?Sized + Eq> Eq for Heap<T> {}

impl<T: ?Sized + Hash> Hash for Heap<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (*self.0).hash(state);
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Heap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_shares_allocation() {
        let a = Heap::new(vec![1, 2, 3]);
        let b = a.clone();
        assert!(Heap::ptr_eq(&a, &b));
        assert_eq!(a.addr(), b.addr());
        assert!(a.is_shared());
        assert_eq!(a.holders(), 2);
    }

    #[test]
    fn test_equal_content_is_not_identity() {
        let a = Heap::new(String::from("same"));
        let b = Heap::new(String::from("same"));
        assert_eq!(a, b);
        assert!(!Heap::ptr_eq(&a, &b));
    }

    #[test]
    fn test_make_mut_copies_only_when_shared() {
        let mut solo = Heap::new(vec![1]);
        let before = solo.addr();
        solo.make_mut().push(2);
        assert_eq!(solo.addr(), before);

        let mut shared = Heap::new(vec![1]);
        let other = shared.clone();
        shared.make_mut().push(2);
        assert_ne!(shared.addr(), other.addr());
        assert_eq!(*other, vec![1]);
        assert_eq!(*shared, vec![1, 2]);
    }

    #[test]
    fn test_weak_reference_is_not_a_holder() {
        let strong = Heap::new(5);
        let weak = Heap::downgrade(&strong);
        assert_eq!(strong.holders(), 1);
        assert!(weak.is_live());
        assert_eq!(weak.upgrade().map(|h| *h), Some(5));

        drop(strong);
        assert!(!weak.is_live());
        assert!(weak.upgrade().is_none());
    }
}
