//! Generational Slot Arena
//!
//! World-owned storage for bodies, fixtures, and joints. Handles are
//! (index, generation) pairs; a slot's generation bumps on removal so stale
//! handles are detected instead of silently aliasing a recycled slot.
//! Iteration is in slot-index order, which keeps traversal deterministic.

use alloc::vec::Vec;

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Dense-ish arena with a free list and generation-checked access.
pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Insert a value, returning its slot index and generation.
    pub(crate) fn insert(&mut self, value: T) -> (u32, u32) {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            (index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                value: Some(value),
            });
            (index, 0)
        }
    }

    /// Remove a value if the handle is current.
    pub(crate) fn remove(&mut self, index: u32, generation: u32) -> Option<T> {
        let slot = self.slots.get_mut(index as usize)?;
        if slot.generation != generation || slot.value.is_none() {
            return None;
        }
        let value = slot.value.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index);
        self.len -= 1;
        value
    }

    pub(crate) fn get(&self, index: u32, generation: u32) -> Option<&T> {
        let slot = self.slots.get(index as usize)?;
        if slot.generation != generation {
            return None;
        }
        slot.value.as_ref()
    }

    pub(crate) fn get_mut(&mut self, index: u32, generation: u32) -> Option<&mut T> {
        let slot = self.slots.get_mut(index as usize)?;
        if slot.generation != generation {
            return None;
        }
        slot.value.as_mut()
    }

    /// Generation currently stored at `index`, if the slot is occupied.
    pub(crate) fn generation_at(&self, index: u32) -> Option<u32> {
        let slot = self.slots.get(index as usize)?;
        slot.value.as_ref().map(|_| slot.generation)
    }

    /// Access by bare index, ignoring generation. Internal hot paths only.
    pub(crate) fn at(&self, index: u32) -> Option<&T> {
        self.slots.get(index as usize)?.value.as_ref()
    }

    pub(crate) fn at_mut(&mut self, index: u32) -> Option<&mut T> {
        self.slots.get_mut(index as usize)?.value.as_mut()
    }

    /// Occupied slots in index order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.value.as_ref().map(|v| (i as u32, v)))
    }

    /// Occupied slot indices in order, collected so the arena can be mutated
    /// while walking.
    pub(crate) fn indices(&self) -> Vec<u32> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.value.as_ref().map(|_| i as u32))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_remove() {
        let mut arena: Arena<i32> = Arena::new();
        let (i, g) = arena.insert(42);
        assert_eq!(arena.get(i, g), Some(&42));
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.remove(i, g), Some(42));
        assert_eq!(arena.len(), 0);
        assert_eq!(arena.get(i, g), None);
    }

    #[test]
    fn test_stale_handle_rejected() {
        let mut arena: Arena<i32> = Arena::new();
        let (i, g) = arena.insert(1);
        arena.remove(i, g);
        let (i2, g2) = arena.insert(2);
        // Slot is reused, old generation must not resolve
        assert_eq!(i, i2);
        assert_ne!(g, g2);
        assert_eq!(arena.get(i, g), None);
        assert_eq!(arena.get(i2, g2), Some(&2));
    }

    #[test]
    fn test_double_remove_is_none() {
        let mut arena: Arena<i32> = Arena::new();
        let (i, g) = arena.insert(7);
        assert!(arena.remove(i, g).is_some());
        assert!(arena.remove(i, g).is_none());
    }

    #[test]
    fn test_iteration_order() {
        let mut arena: Arena<i32> = Arena::new();
        let (a, ga) = arena.insert(10);
        let (_b, _gb) = arena.insert(20);
        let (_c, _gc) = arena.insert(30);
        arena.remove(a, ga);
        let values: Vec<i32> = arena.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, alloc::vec![20, 30]);
    }
}
