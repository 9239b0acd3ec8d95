//! Generational node arena.
//!
//! The layout engine never holds pointers into the host's component tree.
//! Item nodes live in an arena and are addressed by [`NodeHandle`]s, which
//! stay valid across frames and detect use-after-free through a generation
//! counter.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHashMap;

/// Stable handle to a node in a [`NodeArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeHandle {
    index: u32,
    generation: u32,
}

impl Hash for NodeHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl NodeHandle {
    /// Raw slot index, for diagnostics only.
    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
    next_free: Option<u32>,
}

/// Arena of nodes addressed by generational handles.
///
/// Freed slots are reused; a stale handle to a reused slot fails the
/// generation check instead of aliasing the new occupant.
pub struct NodeArena<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<u32>,
    len: usize,
    by_item: FxHashMap<usize, NodeHandle>,
}

impl<T> Default for NodeArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> NodeArena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            len: 0,
            by_item: FxHashMap::default(),
        }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            slots: Vec::with_capacity(cap),
            free_head: None,
            len: 0,
            by_item: FxHashMap::default(),
        }
    }

    /// Number of live nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts a node and returns its handle.
    pub fn insert(&mut self, value: T) -> NodeHandle {
        self.len += 1;
        if let Some(i) = self.free_head {
            let slot = &mut self.slots[i as usize];
            self.free_head = slot.next_free;
            slot.next_free = None;
            slot.value = Some(value);
            NodeHandle {
                index: i,
                generation: slot.generation,
            }
        } else {
            let i = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                value: Some(value),
                next_free: None,
            });
            NodeHandle {
                index: i,
                generation: 0,
            }
        }
    }

    /// Inserts a node associated with an item index, replacing any node the
    /// index previously mapped to.
    pub fn insert_for_item(&mut self, item: usize, value: T) -> NodeHandle {
        if let Some(old) = self.by_item.remove(&item) {
            self.remove(old);
        }
        let handle = self.insert(value);
        self.by_item.insert(item, handle);
        handle
    }

    /// Returns the handle registered for an item index, if any.
    #[inline]
    pub fn handle_for_item(&self, item: usize) -> Option<NodeHandle> {
        self.by_item.get(&item).copied()
    }

    /// Returns a reference to a node, or `None` for a stale handle.
    pub fn get(&self, handle: NodeHandle) -> Option<&T> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_ref()
    }

    /// Returns a mutable reference to a node, or `None` for a stale handle.
    pub fn get_mut(&mut self, handle: NodeHandle) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_mut()
    }

    /// Removes a node, returning its value. Stale handles return `None`.
    pub fn remove(&mut self, handle: NodeHandle) -> Option<T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        slot.next_free = self.free_head;
        self.free_head = Some(handle.index);
        self.len -= 1;
        Some(value)
    }

    /// Removes the node registered for an item index.
    pub fn remove_item(&mut self, item: usize) -> Option<T> {
        let handle = self.by_item.remove(&item)?;
        self.remove(handle)
    }

    /// Drops every item-associated node whose index fails the predicate.
    pub fn retain_items<F>(&mut self, mut keep: F)
    where
        F: FnMut(usize) -> bool,
    {
        let stale: Vec<usize> = self
            .by_item
            .keys()
            .copied()
            .filter(|item| !keep(*item))
            .collect();
        for item in stale {
            self.remove_item(item);
        }
    }

    /// Drops all nodes and item associations.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_head = None;
        self.len = 0;
        self.by_item.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut arena = NodeArena::new();
        let handle = arena.insert(42usize);
        assert_eq!(arena.get(handle), Some(&42));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_stale_handle_after_remove() {
        let mut arena = NodeArena::new();
        let handle = arena.insert("a");
        assert_eq!(arena.remove(handle), Some("a"));
        assert_eq!(arena.get(handle), None);
        assert_eq!(arena.remove(handle), None);
    }

    #[test]
    fn test_slot_reuse_bumps_generation() {
        let mut arena = NodeArena::new();
        let first = arena.insert(1);
        arena.remove(first);
        let second = arena.insert(2);
        // Same slot, different generation.
        assert_eq!(first.index(), second.index());
        assert_eq!(arena.get(first), None);
        assert_eq!(arena.get(second), Some(&2));
    }

    #[test]
    fn test_retain_items_drops_stale_nodes() {
        let mut arena = NodeArena::new();
        arena.insert_for_item(1, "a");
        arena.insert_for_item(2, "b");
        arena.insert_for_item(3, "c");
        arena.retain_items(|item| item != 2);
        assert_eq!(arena.len(), 2);
        assert!(arena.handle_for_item(1).is_some());
        assert!(arena.handle_for_item(2).is_none());
        assert!(arena.handle_for_item(3).is_some());
    }

    #[test]
    fn test_item_association_replaced() {
        let mut arena = NodeArena::new();
        let first = arena.insert_for_item(7, "old");
        let second = arena.insert_for_item(7, "new");
        assert_eq!(arena.get(first), None);
        assert_eq!(arena.handle_for_item(7), Some(second));
        assert_eq!(arena.get(second), Some(&"new"));
        assert_eq!(arena.len(), 1);
    }
}
