use crate::handle::{Handle, EMPTY_GEN};
use crate::row::{ColumnAt, Columns, Row};

#[derive(Clone, Copy)]
struct SlotEntry {
    gen: u32,
    // Where the slot's row currently lives in the packed arrays.
    dense: u32,
}

/// Bookkeeping for the dense strategy: a packed list of live handles plus a
/// slot-indexed map resolving each handle to its current packed position.
///
/// `ids[..count]` are the live handles in storage order. The tail
/// `ids[count..]` is pre-seeded with empty handles, one per future slot, so
/// allocation never searches for a free slot: it is always `ids[count]`.
pub(crate) struct DenseIndex {
    ids: Vec<Handle>,
    slots: Vec<SlotEntry>,
    count: u32,
}

impl DenseIndex {
    pub(crate) fn new() -> Self {
        Self {
            ids: Vec::new(),
            slots: Vec::new(),
            count: 0,
        }
    }

    pub(crate) fn with_capacity(capacity: u32) -> Self {
        let mut index = Self::new();
        index.grow(capacity);
        index
    }

    pub(crate) fn capacity(&self) -> u32 {
        self.slots.len() as u32
    }

    pub(crate) fn count(&self) -> u32 {
        self.count
    }

    /// Live handles in their current storage order.
    pub(crate) fn handles(&self) -> &[Handle] {
        &self.ids[..self.count as usize]
    }

    /// The handle of the row stored at `position`.
    #[inline]
    pub(crate) fn handle_at(&self, position: u32) -> Handle {
        debug_assert!(position < self.count);
        self.ids[position as usize]
    }

    #[inline]
    pub(crate) fn is_valid(&self, handle: Handle) -> bool {
        !handle.is_empty()
            && (handle.slot() as usize) < self.slots.len()
            && self.slots[handle.slot() as usize].gen == handle.generation()
    }

    /// Storage position of the handle's row, or `None` for stale handles.
    #[inline]
    pub(crate) fn get_position(&self, handle: Handle) -> Option<u32> {
        if !self.is_valid(handle) {
            return None;
        }
        Some(self.slots[handle.slot() as usize].dense)
    }

    /// Storage position for a handle already known to be valid.
    #[inline]
    pub(crate) fn position_unchecked(&self, handle: Handle) -> u32 {
        let entry = self.slots[handle.slot() as usize];
        debug_assert_eq!(entry.gen, handle.generation());
        entry.dense
    }

    /// Hands out the next pre-seeded handle and binds it to the next packed
    /// position. O(1), no searching.
    pub(crate) fn allocate(&mut self) -> Handle {
        debug_assert!(self.count < self.capacity());
        let handle = self.ids[self.count as usize].make_occupied();
        self.ids[self.count as usize] = handle;
        self.slots[handle.slot() as usize] = SlotEntry {
            gen: handle.generation(),
            dense: self.count,
        };
        self.count += 1;
        handle
    }

    /// Invalidates the handle and swap-compacts the live handle list.
    ///
    /// Returns the packed position that was vacated: the caller must apply
    /// the same swap-remove to every column. Returns `None` if the handle is
    /// stale or already removed.
    pub(crate) fn try_remove(&mut self, handle: Handle) -> Option<u32> {
        if self.count == 0 || !self.is_valid(handle) {
            return None;
        }
        let entry = self.slots[handle.slot() as usize];
        // Invalidate the slot; same bump the handle itself would get.
        self.slots[handle.slot() as usize].gen = entry.gen + 1;

        // The last live handle moves into the vacated position; its slot
        // entry keeps its generation and only repoints the position.
        self.count -= 1;
        let last = self.ids[self.count as usize];
        self.slots[last.slot() as usize].dense = entry.dense;
        self.ids[entry.dense as usize] = self.ids[entry.dense as usize].make_empty();
        self.ids.swap(entry.dense as usize, self.count as usize);

        Some(entry.dense)
    }

    /// Extends both arrays, pre-seeding the new tail so future allocations
    /// stay O(1).
    pub(crate) fn grow(&mut self, new_capacity: u32) {
        debug_assert!(new_capacity >= self.capacity());
        for slot in self.capacity()..new_capacity {
            self.ids.push(Handle::first_empty(slot));
            self.slots.push(SlotEntry {
                gen: EMPTY_GEN,
                dense: slot,
            });
        }
    }
}

/// A columnar table that keeps every column gap-free by swap-compacting on
/// removal.
///
/// Handles stay valid across removals of *other* rows, but the storage
/// position behind a handle moves, and iteration order changes whenever a
/// row is removed. In exchange, per-column iteration is a straight scan over
/// a packed array with no occupancy checks:
///
/// ```
/// use column_tables::DenseTable;
///
/// let mut table: DenseTable<(i32, &str)> = DenseTable::new();
/// table.insert(1, "one");
/// let two = table.insert(2, "two");
/// table.insert(3, "three");
/// table.remove(two);
///
/// let names: Vec<&str> = table.column::<&str, _>().map(|(_, v)| *v).collect();
/// assert_eq!(names, ["one", "three"]);
/// ```
pub struct DenseTable<R: Row> {
    index: DenseIndex,
    columns: R::Columns,
}

impl<R: Row> DenseTable<R> {
    /// Creates an empty table. Does not heap-allocate.
    pub fn new() -> Self {
        Self {
            index: DenseIndex::new(),
            columns: R::Columns::with_capacity(0),
        }
    }

    /// Creates an empty table with storage for `capacity` rows in every
    /// column.
    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            index: DenseIndex::with_capacity(capacity),
            columns: R::Columns::with_capacity(capacity),
        }
    }

    /// Number of live rows.
    pub fn count(&self) -> u32 {
        self.index.count()
    }

    /// Number of rows the table can hold before growing.
    pub fn capacity(&self) -> u32 {
        self.index.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Returns true if the handle points at a live row of this table.
    /// Total over all handles: stale, removed and foreign handles are
    /// simply not contained.
    pub fn contains(&self, handle: Handle) -> bool {
        self.index.is_valid(handle)
    }

    /// Removes the row behind `handle`. The last row of every column is
    /// moved into the vacated position, so iteration order changes. Returns
    /// false if the handle is stale or already removed.
    pub fn remove(&mut self, handle: Handle) -> bool {
        match self.index.try_remove(handle) {
            Some(position) => {
                let last = self.index.count();
                unsafe { self.columns.swap_remove_at(position, last) };
                true
            }
            None => false,
        }
    }

    /// Reference to one column's value of a live row.
    pub fn get<T, I>(&self, handle: Handle) -> Option<&T>
    where
        R::Columns: ColumnAt<T, I>,
    {
        let position = self.index.get_position(handle)?;
        Some(unsafe { self.columns.column().get_unchecked(position) })
    }

    /// Mutable reference to one column's value of a live row.
    pub fn get_mut<T, I>(&mut self, handle: Handle) -> Option<&mut T>
    where
        R::Columns: ColumnAt<T, I>,
    {
        if !self.index.is_valid(handle) {
            return None;
        }
        let position = self.index.position_unchecked(handle);
        Some(unsafe { self.columns.column_mut().get_unchecked_mut(position) })
    }

    /// Handles of all live rows, in storage order.
    pub fn handles(&self) -> &[Handle] {
        self.index.handles()
    }

    /// Iterates one column as `(Handle, &T)` pairs in storage order. A plain
    /// scan over packed memory; nothing is skipped.
    pub fn column<'a, T: 'a, I>(&'a self) -> impl Iterator<Item = (Handle, &'a T)> + 'a
    where
        R::Columns: ColumnAt<T, I>,
    {
        let values = unsafe { self.columns.column().as_slice(self.index.count()) };
        self.index.handles().iter().copied().zip(values)
    }

    /// Iterates one column mutably as `(Handle, &mut T)` pairs.
    pub fn column_mut<'a, T: 'a, I>(&'a mut self) -> impl Iterator<Item = (Handle, &'a mut T)> + 'a
    where
        R::Columns: ColumnAt<T, I>,
    {
        let Self { index, columns } = self;
        let values = unsafe { columns.column_mut().as_mut_slice(index.count()) };
        index.handles().iter().copied().zip(values)
    }

    pub(crate) fn insert_row(&mut self, row: R) -> Handle {
        self.grow_for(self.index.count() + 1);
        let position = self.index.count();
        let handle = self.index.allocate();
        unsafe { self.columns.construct_at(position, row) };
        handle
    }

    pub(crate) fn row_parts_mut(&mut self) -> (&DenseIndex, &mut R::Columns) {
        (&self.index, &mut self.columns)
    }

    /// The one growth transaction: index first, then every column, to the
    /// same capacity. Nothing else ever resizes storage.
    fn grow_for(&mut self, needed: u32) {
        if needed <= self.capacity() {
            return;
        }
        let new_capacity = needed.max(self.capacity().saturating_mul(2));
        self.index.grow(new_capacity);
        self.columns.grow_packed(new_capacity, self.index.count());
    }
}

impl<R: Row> Default for DenseTable<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Row> Drop for DenseTable<R> {
    fn drop(&mut self) {
        // Live values sit in the packed prefix; destroy them before the
        // backing arrays are freed.
        unsafe { self.columns.destroy_packed(self.index.count()) };
    }
}
