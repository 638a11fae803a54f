//! Slot arena for handle-addressed storage of lattice entities.
//!
//! The [`Arena`] provides O(1) insertion, lookup, and removal by opaque
//! [`ArenaId`] handles. Removal leaves a tombstone, so a handle is never
//! reused and a stale handle simply resolves to `None`.

use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// Trait for opaque ID types used as arena keys.
///
/// Implementors must provide a bijection between `u32` indices and the ID type.
pub trait ArenaId: Copy {
    /// Creates an ID from a raw `u32` index.
    fn from_raw(index: u32) -> Self;

    /// Returns the raw `u32` index.
    fn as_raw(self) -> u32;
}

/// A handle-indexed container whose removed slots are never reused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arena<I: ArenaId, T> {
    slots: Vec<Option<T>>,
    live: usize,
    #[serde(skip)]
    _marker: PhantomData<I>,
}

impl<I: ArenaId, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ArenaId, T> Arena<I, T> {
    /// Creates a new, empty arena.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            live: 0,
            _marker: PhantomData,
        }
    }

    /// Allocates a new item in the arena and returns its handle.
    pub fn alloc(&mut self, item: T) -> I {
        let id = I::from_raw(self.slots.len() as u32);
        self.slots.push(Some(item));
        self.live += 1;
        id
    }

    /// Returns the item behind `id`, or `None` if it was removed.
    pub fn get(&self, id: I) -> Option<&T> {
        self.slots.get(id.as_raw() as usize)?.as_ref()
    }

    /// Returns the item behind `id` mutably, or `None` if it was removed.
    pub fn get_mut(&mut self, id: I) -> Option<&mut T> {
        self.slots.get_mut(id.as_raw() as usize)?.as_mut()
    }

    /// Removes the item behind `id`, leaving a tombstone.
    pub fn remove(&mut self, id: I) -> Option<T> {
        let item = self.slots.get_mut(id.as_raw() as usize)?.take();
        if item.is_some() {
            self.live -= 1;
        }
        item
    }

    /// Returns `true` if `id` refers to a live item.
    pub fn contains(&self, id: I) -> bool {
        self.get(id).is_some()
    }

    /// Returns the number of live items.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns `true` if the arena holds no live items.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Iterates over live `(ID, &T)` pairs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|item| (I::from_raw(i as u32), item)))
    }

    /// Iterates over live `(ID, &mut T)` pairs in allocation order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (I, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|item| (I::from_raw(i as u32), item)))
    }

    /// Iterates over live handles in allocation order.
    pub fn ids(&self) -> impl Iterator<Item = I> + '_ {
        self.iter().map(|(id, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::NodeId;

    #[test]
    fn alloc_and_get() {
        let mut arena: Arena<NodeId, &str> = Arena::new();
        let a = arena.alloc("a");
        let b = arena.alloc("b");
        assert_eq!(arena.get(a), Some(&"a"));
        assert_eq!(arena.get(b), Some(&"b"));
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn removed_handles_are_not_reused() {
        let mut arena: Arena<NodeId, u32> = Arena::new();
        let a = arena.alloc(1);
        assert_eq!(arena.remove(a), Some(1));
        assert_eq!(arena.remove(a), None);
        assert!(arena.get(a).is_none());
        let b = arena.alloc(2);
        assert_ne!(a, b);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn iter_skips_tombstones() {
        let mut arena: Arena<NodeId, u32> = Arena::new();
        let ids: Vec<_> = (0..4).map(|i| arena.alloc(i)).collect();
        arena.remove(ids[1]);
        let live: Vec<u32> = arena.iter().map(|(_, v)| *v).collect();
        assert_eq!(live, vec![0, 2, 3]);
        assert_eq!(arena.ids().count(), 3);
    }

    #[test]
    fn out_of_range_is_none() {
        let arena: Arena<NodeId, u32> = Arena::new();
        assert!(arena.get(NodeId::from_raw(9)).is_none());
        assert!(arena.is_empty());
    }

    #[test]
    fn serde_roundtrip_keeps_tombstones() {
        let mut arena: Arena<NodeId, u32> = Arena::new();
        let a = arena.alloc(10);
        let b = arena.alloc(20);
        arena.remove(a);
        let json = serde_json::to_string(&arena).unwrap();
        let back: Arena<NodeId, u32> = serde_json::from_str(&json).unwrap();
        assert!(back.get(a).is_none());
        assert_eq!(back.get(b), Some(&20));
        assert_eq!(back.len(), 1);
    }
}
