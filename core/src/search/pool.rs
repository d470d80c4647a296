//! Free list of side-info slots
//!
//! A slot is checked out by value and belongs to the caller until it is
//! handed back, so no two paths can ever share one.

/// Recycles side-info allocations across paths and searches
#[derive(Debug, Clone)]
pub struct SideInfoPool<S> {
    free: Vec<S>,
    capacity: usize,
    allocated: usize,
}

impl<S> SideInfoPool<S> {
    /// Pool keeping at most `capacity` idle slots
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Vec::with_capacity(capacity),
            capacity,
            allocated: 0,
        }
    }

    /// Check out an idle slot, or build a new one with `make`.
    ///
    /// A recycled slot still holds its previous path's state; the caller
    /// overwrites it by copy or reset.
    pub fn acquire(&mut self, make: impl FnOnce() -> S) -> S {
        match self.free.pop() {
            Some(slot) => slot,
            None => {
                self.allocated += 1;
                make()
            }
        }
    }

    /// Return a slot; beyond capacity it is dropped instead
    pub fn release(&mut self, slot: S) {
        if self.free.len() < self.capacity {
            self.free.push(slot);
        }
    }

    /// Idle slots ready for reuse
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Slots built so far
    pub fn allocated(&self) -> usize {
        self.allocated
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
