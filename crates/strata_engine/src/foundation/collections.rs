//! Specialized collection types
//!
//! - [`SafeCollection`]: ordered container that frame loops can iterate while
//!   code running inside the loop adds or removes elements
//! - [`HandleMap`] / [`TypedHandle`]: slot map storage with stable handles

use std::cell::{Cell, RefCell};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

pub use slotmap::{DefaultKey, SlotMap};

/// Handle-based map using slot map for stable references
pub type HandleMap<T> = SlotMap<DefaultKey, T>;

/// Handle type for stable references
pub type Handle = DefaultKey;

/// Typed handle for type-safe asset references
pub struct TypedHandle<T> {
    key: DefaultKey,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> TypedHandle<T> {
    /// Create a new typed handle from a key
    pub fn new(key: DefaultKey) -> Self {
        Self {
            key,
            _phantom: PhantomData,
        }
    }

    /// Get the underlying key
    pub fn key(&self) -> DefaultKey {
        self.key
    }
}

impl<T> Clone for TypedHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TypedHandle<T> {}

impl<T> PartialEq for TypedHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Eq for TypedHandle<T> {}

impl<T> Hash for TypedHandle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl<T> fmt::Debug for TypedHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypedHandle").field(&self.key).finish()
    }
}

/// Structural change requested while a pass was running
enum Pending<T> {
    Add(T),
    Insert(T, Box<dyn Fn(&[T]) -> usize>),
    Remove(T),
}

impl<T: PartialEq> Pending<T> {
    fn item(&self) -> &T {
        match self {
            Self::Add(item) | Self::Insert(item, _) | Self::Remove(item) => item,
        }
    }

    fn apply(&self, items: &mut Vec<T>)
    where
        T: Clone,
    {
        match self {
            Self::Add(item) => items.push(item.clone()),
            Self::Insert(item, position) => {
                let index = position(items).min(items.len());
                items.insert(index, item.clone());
            }
            Self::Remove(item) => {
                if let Some(index) = items.iter().position(|existing| existing == item) {
                    items.remove(index);
                }
            }
        }
    }
}

/// Ordered container with deferred structural mutation
///
/// While a pass ([`SafeCollection::for_each`] or [`SafeCollection::begin_pass`])
/// is running, additions and removals are queued instead of applied:
///
/// - queued additions stay invisible to the running pass and appear once the
///   outermost pass ends
/// - queued removals are skipped for the rest of the pass and physically
///   removed once the outermost pass ends
///
/// Outside of a pass every mutation applies immediately. All methods take
/// `&self`, so a callback invoked from `for_each` may mutate the collection it
/// is being called from.
pub struct SafeCollection<T> {
    items: RefCell<Vec<T>>,
    pending: RefCell<Vec<Pending<T>>>,
    skipped: RefCell<Vec<T>>,
    depth: Cell<usize>,
}

impl<T: Clone + PartialEq> SafeCollection<T> {
    /// Create an empty collection
    pub fn new() -> Self {
        Self {
            items: RefCell::new(Vec::new()),
            pending: RefCell::new(Vec::new()),
            skipped: RefCell::new(Vec::new()),
            depth: Cell::new(0),
        }
    }

    /// Whether a pass is currently running
    pub fn is_iterating(&self) -> bool {
        self.depth.get() > 0
    }

    /// Append an item
    ///
    /// Re-adding an item removed during the running pass keeps it visible to
    /// that pass.
    pub fn add(&self, item: T) {
        if self.is_iterating() {
            self.unskip(&item);
            self.pending.borrow_mut().push(Pending::Add(item));
        } else {
            self.items.borrow_mut().push(item);
        }
    }

    /// Insert an item at the index chosen by `position`
    ///
    /// `position` receives the physical contents at the moment the insert is
    /// applied; an index past the end appends.
    pub fn insert_where<F>(&self, item: T, position: F)
    where
        F: Fn(&[T]) -> usize + 'static,
    {
        if self.is_iterating() {
            self.unskip(&item);
        }
        let op = Pending::Insert(item, Box::new(position));
        if self.is_iterating() {
            self.pending.borrow_mut().push(op);
        } else {
            op.apply(&mut self.items.borrow_mut());
        }
    }

    /// Remove an item, returning whether it was a member
    pub fn remove(&self, item: &T) -> bool {
        if !self.contains(item) {
            return false;
        }

        if self.is_iterating() {
            self.skipped.borrow_mut().push(item.clone());
            self.pending.borrow_mut().push(Pending::Remove(item.clone()));
        } else {
            Pending::Remove(item.clone()).apply(&mut self.items.borrow_mut());
        }
        true
    }

    /// Logical membership, counting queued changes
    pub fn contains(&self, item: &T) -> bool {
        let pending = self.pending.borrow();
        if let Some(latest) = pending.iter().rev().find(|op| op.item() == item) {
            return !matches!(latest, Pending::Remove(_));
        }
        self.items.borrow().contains(item)
    }

    /// Whether `item` was removed during the running pass
    pub fn is_pending_removal(&self, item: &T) -> bool {
        self.skipped.borrow().contains(item)
    }

    /// Whether `item` is physically present and not removed during the
    /// running pass
    ///
    /// Items added during the running pass are not live until it ends.
    pub fn is_live(&self, item: &T) -> bool {
        self.items.borrow().contains(item) && !self.is_pending_removal(item)
    }

    fn unskip(&self, item: &T) {
        self.skipped.borrow_mut().retain(|skipped| skipped != item);
    }

    /// Logical contents in order, as they will be once queued changes apply
    pub fn snapshot(&self) -> Vec<T> {
        let mut items = self.items.borrow().clone();
        for op in self.pending.borrow().iter() {
            op.apply(&mut items);
        }
        items
    }

    /// Number of logical members
    pub fn len(&self) -> usize {
        if self.pending.borrow().is_empty() {
            self.items.borrow().len()
        } else {
            self.snapshot().len()
        }
    }

    /// Whether there are no logical members
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start a pass; mutations are deferred until the returned guard drops
    pub fn begin_pass(&self) -> Pass<'_, T> {
        self.hold();
        Pass { collection: self }
    }

    /// Open a pass with no guard; every call must be paired with
    /// [`SafeCollection::release`]
    pub(crate) fn hold(&self) {
        self.depth.set(self.depth.get() + 1);
    }

    /// Close a pass opened with [`SafeCollection::hold`]
    pub(crate) fn release(&self) {
        self.end_pass();
    }

    /// Visit every member in insertion order
    ///
    /// Items added during the pass are not visited; items removed during the
    /// pass are skipped if not yet visited.
    pub fn for_each<F>(&self, mut visit: F)
    where
        F: FnMut(&T),
    {
        let _pass = self.begin_pass();
        let len = self.items.borrow().len();

        for index in 0..len {
            // Physical contents do not change while a pass is open.
            let item = match self.items.borrow().get(index) {
                Some(item) => item.clone(),
                None => break,
            };
            if self.is_pending_removal(&item) {
                continue;
            }
            visit(&item);
        }
    }

    fn end_pass(&self) {
        let depth = self.depth.get().saturating_sub(1);
        self.depth.set(depth);
        if depth > 0 {
            return;
        }

        let pending = std::mem::take(&mut *self.pending.borrow_mut());
        self.skipped.borrow_mut().clear();
        if pending.is_empty() {
            return;
        }

        log::trace!("Applying {} deferred collection change(s)", pending.len());
        let mut items = self.items.borrow_mut();
        for op in &pending {
            op.apply(&mut items);
        }
    }
}

impl<T: Clone + PartialEq> Default for SafeCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SafeCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafeCollection")
            .field("len", &self.items.borrow().len())
            .field("pending", &self.pending.borrow().len())
            .field("depth", &self.depth.get())
            .finish()
    }
}

/// Guard for an open pass over a [`SafeCollection`]
///
/// Queued changes are applied when the outermost guard drops, including while
/// unwinding.
pub struct Pass<'a, T: Clone + PartialEq> {
    collection: &'a SafeCollection<T>,
}

impl<T: Clone + PartialEq> Drop for Pass<'_, T> {
    fn drop(&mut self) {
        self.collection.end_pass();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutation_outside_pass_is_immediate() {
        let items = SafeCollection::new();
        items.add(1);
        items.add(2);
        assert!(items.remove(&1));
        assert!(!items.remove(&1));
        assert_eq!(items.snapshot(), vec![2]);
        assert!(!items.is_iterating());
    }

    #[test]
    fn test_add_during_pass_is_not_visited() {
        let items = SafeCollection::new();
        items.add(1);
        items.add(2);

        let mut visited = Vec::new();
        items.for_each(|&item| {
            visited.push(item);
            items.add(item * 10);
        });

        assert_eq!(visited, vec![1, 2]);
        assert_eq!(items.snapshot(), vec![1, 2, 10, 20]);

        visited.clear();
        items.for_each(|&item| visited.push(item));
        assert_eq!(visited, vec![1, 2, 10, 20]);
    }

    #[test]
    fn test_remove_during_pass_skips_unvisited() {
        let items = SafeCollection::new();
        for item in 1..=4 {
            items.add(item);
        }

        let mut visited = Vec::new();
        items.for_each(|&item| {
            visited.push(item);
            if item == 1 {
                assert!(items.remove(&3));
                assert!(items.is_pending_removal(&3));
                assert!(!items.contains(&3));
                // Still physically present until the pass ends
                assert_eq!(items.items.borrow().len(), 4);
            }
        });

        assert_eq!(visited, vec![1, 2, 4]);
        assert_eq!(items.snapshot(), vec![1, 2, 4]);
        assert!(!items.is_pending_removal(&3));
    }

    #[test]
    fn test_add_then_remove_within_pass_cancels() {
        let items = SafeCollection::new();
        items.add(1);

        items.for_each(|_| {
            items.add(5);
            assert!(items.contains(&5));
            assert_eq!(items.len(), 2);
            assert!(items.remove(&5));
            assert!(!items.contains(&5));
        });

        assert_eq!(items.snapshot(), vec![1]);
    }

    #[test]
    fn test_nested_pass_defers_until_outermost_ends() {
        let items = SafeCollection::new();
        items.add(1);
        items.add(2);

        items.for_each(|&outer| {
            items.for_each(|_| {});
            if outer == 1 {
                items.add(3);
            }
            // The inner pass ended but the outer one is still open
            assert_eq!(items.items.borrow().len(), 2);
        });

        assert_eq!(items.snapshot(), vec![1, 2, 3]);
    }

    #[test]
    fn test_insert_where_applies_at_pass_end() {
        let items = SafeCollection::new();
        items.add(10);
        items.add(30);

        items.insert_where(20, |current| {
            current.iter().position(|&value| value > 20).unwrap_or(current.len())
        });
        assert_eq!(items.snapshot(), vec![10, 20, 30]);

        {
            let _pass = items.begin_pass();
            items.insert_where(5, |_| 0);
            assert_eq!(items.items.borrow().first(), Some(&10));
        }
        assert_eq!(items.snapshot(), vec![5, 10, 20, 30]);
    }

    #[test]
    fn test_pass_guard_flushes_on_panic() {
        let items = SafeCollection::new();
        items.add(1);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            items.for_each(|_| {
                items.add(2);
                panic!("hook failure");
            });
        }));

        assert!(result.is_err());
        assert!(!items.is_iterating());
        assert_eq!(items.snapshot(), vec![1, 2]);
    }

    #[test]
    fn test_moved_item_is_still_visited() {
        let items = SafeCollection::new();
        items.add(1);
        items.add(2);
        items.add(3);

        let mut visited = Vec::new();
        items.for_each(|&item| {
            if item == 1 {
                assert!(items.remove(&3));
                items.insert_where(3, |_| 0);
            }
            visited.push(item);
        });

        assert_eq!(visited, vec![1, 2, 3]);
        assert_eq!(items.snapshot(), vec![3, 1, 2]);
    }

    #[test]
    fn test_held_pass_spans_several_sweeps() {
        let items = SafeCollection::new();
        items.add(1);
        items.add(2);

        items.hold();
        items.for_each(|&item| {
            if item == 1 {
                items.add(10);
                items.remove(&2);
            }
        });
        assert!(items.is_iterating());
        assert!(!items.is_live(&10));
        assert!(!items.is_live(&2));

        let mut visited = Vec::new();
        items.for_each(|&item| visited.push(item));
        assert_eq!(visited, vec![1]);

        items.release();
        assert!(!items.is_iterating());
        assert!(items.is_live(&10));
        assert!(!items.is_pending_removal(&2));
        assert_eq!(items.snapshot(), vec![1, 10]);
    }

    #[test]
    fn test_typed_handle_equality() {
        let mut map: HandleMap<&str> = HandleMap::new();
        let first = TypedHandle::<String>::new(map.insert("a"));
        let second = TypedHandle::<String>::new(map.insert("b"));
        let copy = first;
        assert_eq!(first, copy);
        assert_ne!(first, second);
    }
}
