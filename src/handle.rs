/// A generation-checked handle to a row of a table.
///
/// The handle packs two 32-bit halves into one `u64`:
/// - Lower 32 bits: the slot number the row was allocated in
/// - Upper 32 bits: the generation of that slot at allocation time
///
/// Every allocation and every removal bumps the slot's generation, so a
/// handle kept around after its row was removed can never match a row
/// inserted into the same slot later.
///
/// Handles are plain values: cheap to copy, comparable for equality and
/// usable as map keys. The derived ordering has no semantic meaning, and
/// for dense tables the slot number says nothing about where the row
/// currently lives in storage.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Handle(u64);

// Generation parity encodes occupancy: odd means the slot is empty, even
// means it holds a live row. A fresh slot starts at EMPTY_GEN, so the first
// row allocated in it gets generation 2.
pub(crate) const EMPTY_GEN: u32 = 1;

impl Handle {
    #[inline]
    pub(crate) const fn new(generation: u32, slot: u32) -> Self {
        Self(((generation as u64) << 32) | (slot as u64))
    }

    /// The handle a slot holds before anything was ever stored in it.
    #[inline]
    pub(crate) const fn first_empty(slot: u32) -> Self {
        Self::new(EMPTY_GEN, slot)
    }

    /// Returns the slot number this handle points at.
    #[inline]
    pub const fn slot(self) -> u32 {
        self.0 as u32
    }

    /// Returns the generation this handle was issued with.
    #[inline]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Returns true if the generation marks the slot as holding no row.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.generation() & 1 == 1
    }

    #[inline]
    pub(crate) fn make_occupied(self) -> Self {
        debug_assert!(self.is_empty());
        debug_assert!(self.generation() < u32::MAX);
        Self::new(self.generation() + 1, self.slot())
    }

    #[inline]
    pub(crate) fn make_empty(self) -> Self {
        debug_assert!(!self.is_empty());
        Self::new(self.generation() + 1, self.slot())
    }
}

impl std::fmt::Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("slot", &self.slot())
            .field("generation", &self.generation())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_roundtrips_generation_and_slot() {
        let handle = Handle::new(67890, 12345);
        assert_eq!(handle.slot(), 12345);
        assert_eq!(handle.generation(), 67890);
    }

    #[test]
    fn fresh_slot_is_empty_until_occupied() {
        let empty = Handle::first_empty(7);
        assert!(empty.is_empty());
        assert_eq!(empty.generation(), EMPTY_GEN);

        let live = empty.make_occupied();
        assert!(!live.is_empty());
        assert_eq!(live.generation(), 2);
        assert_eq!(live.slot(), 7);

        let dead = live.make_empty();
        assert!(dead.is_empty());
        assert_eq!(dead.generation(), 3);
        assert_ne!(dead, empty);
    }

    #[test]
    fn handles_with_different_generations_are_not_equal() {
        let first = Handle::first_empty(0).make_occupied();
        let second = first.make_empty().make_occupied();
        assert_eq!(first.slot(), second.slot());
        assert_ne!(first, second);
    }
}
