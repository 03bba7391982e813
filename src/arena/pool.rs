//! Fixed-capacity slot pool with an intrusive free list and generational handles.
//!
//! Slots live in a boxed slice allocated once at construction, so slot indices stay valid for the
//! lifetime of the pool. Free slots are threaded through their `next_free` field; allocation pops
//! the head and release pushes back onto it, which makes slot reuse deterministic (last released,
//! first reused). Every release bumps the slot's generation so handles to the previous occupant
//! fail validation instead of aliasing the new one.

use core::fmt;
use core::marker::PhantomData;

/// Sentinel index terminating the free list.
pub(crate) const INVALID: u32 = u32::MAX;

/// Which of the arena pools an operation touched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolKind {
    /// Layer records.
    Layer,
    /// Frame records.
    Frame,
    /// Animation records.
    Animation,
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Layer => "layer",
            Self::Frame => "frame",
            Self::Animation => "animation",
        })
    }
}

/// Typed handle to a slot in a [`Pool`].
///
/// Holds the slot index plus the generation it was issued under.
pub struct Handle<T> {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self {
            idx,
            generation,
            _marker: PhantomData,
        }
    }

    /// Slot index inside the pool.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Generation the handle was issued under.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.idx == other.idx && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> core::hash::Hash for Handle<T> {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.idx.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}@gen{})", self.idx, self.generation)
    }
}

#[derive(Debug)]
struct Slot<T> {
    value: Option<T>,
    generation: u32,
    next_free: u32,
}

/// Fixed-capacity pool of `T` records.
#[derive(Debug)]
pub struct Pool<T> {
    kind: PoolKind,
    slots: Box<[Slot<T>]>,
    free_head: u32,
    live: u32,
}

impl<T> Pool<T> {
    /// Build a pool with `capacity` slots, all free.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is `u32::MAX`, which is reserved for the free-list sentinel.
    pub fn with_capacity(kind: PoolKind, capacity: u32) -> Self {
        assert!(capacity != INVALID, "pool capacity collides with sentinel");
        let slots = (0..capacity)
            .map(|i| Slot {
                value: None,
                generation: 0,
                next_free: if i + 1 < capacity { i + 1 } else { INVALID },
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            kind,
            slots,
            free_head: if capacity == 0 { INVALID } else { 0 },
            live: 0,
        }
    }

    /// Which pool this is.
    pub fn kind(&self) -> PoolKind {
        self.kind
    }

    /// Total number of slots.
    pub fn capacity(&self) -> u32 {
        self.slots.len() as u32
    }

    /// Number of occupied slots.
    pub fn live(&self) -> u32 {
        self.live
    }

    /// Pop the free-list head and store `value` there.
    ///
    /// Returns `None` when the pool is exhausted; nothing is modified in that case.
    pub fn allocate(&mut self, value: T) -> Option<Handle<T>> {
        let idx = self.free_head;
        if idx == INVALID {
            tracing::warn!(
                pool = %self.kind,
                capacity = self.capacity(),
                "pool exhausted"
            );
            return None;
        }
        let slot = &mut self.slots[idx as usize];
        self.free_head = slot.next_free;
        slot.next_free = INVALID;
        slot.value = Some(value);
        self.live += 1;
        Some(Handle::new(idx, slot.generation))
    }

    /// Take the record out of its slot and push the slot back onto the free list.
    ///
    /// Returns `None` for stale handles; the pool is left untouched.
    pub fn release(&mut self, handle: Handle<T>) -> Option<T> {
        if !self.is_alive(handle) {
            return None;
        }
        let slot = &mut self.slots[handle.idx as usize];
        let value = slot.value.take();
        slot.generation = slot.generation.wrapping_add(1);
        slot.next_free = self.free_head;
        self.free_head = handle.idx;
        self.live -= 1;
        value
    }

    /// Whether `handle` refers to the current occupant of its slot.
    pub fn is_alive(&self, handle: Handle<T>) -> bool {
        self.slots
            .get(handle.idx as usize)
            .is_some_and(|s| s.generation == handle.generation && s.value.is_some())
    }

    /// Borrow the record behind `handle`.
    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.slots
            .get(handle.idx as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.value.as_ref())
    }

    /// Mutably borrow the record behind `handle`.
    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.slots
            .get_mut(handle.idx as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.value.as_mut())
    }

    /// Handles of all occupied slots in index order.
    pub fn live_handles(&self) -> impl Iterator<Item = Handle<T>> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.value
                .as_ref()
                .map(|_| Handle::new(i as u32, s.generation))
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/arena/pool.rs"]
mod tests;
