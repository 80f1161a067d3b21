use std::marker::PhantomData;

use crate::handle::{Handle, EMPTY_GEN};
use crate::row::{ColumnAt, Columns, Row};

/// Occupancy and generation bookkeeping for the sparse strategy.
///
/// One generation counter per slot; the counter's parity says whether the
/// slot holds a row. Slots are never renumbered, which is the whole point of
/// the sparse strategy: a handle stays glued to its slot until removal.
pub(crate) struct SlotIndex {
    gens: Vec<u32>,
    count: u32,
}

impl SlotIndex {
    pub(crate) fn new() -> Self {
        Self {
            gens: Vec::new(),
            count: 0,
        }
    }

    pub(crate) fn with_capacity(capacity: u32) -> Self {
        Self {
            gens: vec![EMPTY_GEN; capacity as usize],
            count: 0,
        }
    }

    pub(crate) fn capacity(&self) -> u32 {
        self.gens.len() as u32
    }

    pub(crate) fn count(&self) -> u32 {
        self.count
    }

    #[inline]
    pub(crate) fn is_occupied(&self, slot: u32) -> bool {
        debug_assert!(slot < self.capacity());
        self.gens[slot as usize] & 1 == 0
    }

    /// True if the handle's generation matches the slot's current one.
    /// Total over all handles: out-of-range or empty-marked handles are
    /// simply invalid.
    #[inline]
    pub(crate) fn is_valid(&self, handle: Handle) -> bool {
        !handle.is_empty()
            && (handle.slot() as usize) < self.gens.len()
            && self.gens[handle.slot() as usize] == handle.generation()
    }

    /// Marks an empty slot as occupied and returns its new handle.
    ///
    /// The generation counter is a hard limit: a slot that has been
    /// allocated and freed 2^31 times cannot be allocated again.
    pub(crate) fn allocate(&mut self, slot: u32) -> Handle {
        debug_assert!(!self.is_occupied(slot));
        debug_assert!(self.gens[slot as usize] < u32::MAX);
        let gen = self.gens[slot as usize] + 1;
        self.gens[slot as usize] = gen;
        self.count += 1;
        Handle::new(gen, slot)
    }

    /// Marks an occupied slot as empty again, returning the post-removal
    /// handle (its generation is the one future free-list bookkeeping sees).
    pub(crate) fn invalidate(&mut self, handle: Handle) -> Handle {
        debug_assert!(self.is_valid(handle));
        let slot = handle.slot();
        let gen = self.gens[slot as usize] + 1;
        self.gens[slot as usize] = gen;
        self.count -= 1;
        Handle::new(gen, slot)
    }

    /// Handles of all occupied slots, in ascending slot order.
    pub(crate) fn occupied(&self) -> impl Iterator<Item = Handle> + '_ {
        self.gens.iter().enumerate().filter_map(|(slot, &gen)| {
            (gen & 1 == 0).then(|| Handle::new(gen, slot as u32))
        })
    }

    pub(crate) fn gens(&self) -> &[u32] {
        &self.gens
    }

    /// Extends the generation array; existing counters are untouched, so
    /// every live handle stays valid.
    pub(crate) fn grow(&mut self, new_capacity: u32) {
        debug_assert!(new_capacity >= self.capacity());
        self.gens.resize(new_capacity as usize, EMPTY_GEN);
    }
}

/// A columnar table whose rows never move: a handle is bound to its storage
/// slot for the whole lifetime of the row.
///
/// The column types are given as a tuple, one storage array per element:
///
/// ```
/// use column_tables::SparseTable;
///
/// let mut table: SparseTable<(i32, f64, bool)> = SparseTable::new();
/// let row = table.insert(1, 0.5, true);
/// assert_eq!(table.get::<f64, _>(row), Some(&0.5));
/// table.remove(row);
/// assert_eq!(table.get::<f64, _>(row), None);
/// ```
///
/// Insertions and removals are O(1); growth never invalidates handles.
/// Iteration has to skip empty slots, so heavily fragmented tables scan
/// slower than a [`DenseTable`](crate::DenseTable).
pub struct SparseTable<R: Row> {
    index: SlotIndex,
    // Stack of free slot numbers. Same length as capacity; the live region
    // is free[count..], so pushes and pops never move other entries.
    free: Vec<u32>,
    columns: R::Columns,
}

impl<R: Row> SparseTable<R> {
    /// Creates an empty table. Does not heap-allocate.
    pub fn new() -> Self {
        Self {
            index: SlotIndex::new(),
            free: Vec::new(),
            columns: R::Columns::with_capacity(0),
        }
    }

    /// Creates an empty table with storage for `capacity` rows in every
    /// column.
    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            index: SlotIndex::with_capacity(capacity),
            free: (0..capacity).collect(),
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

    /// Removes the row behind `handle`, destroying its value in every
    /// column. Returns false if the handle is stale or already removed;
    /// removing twice is a no-op, not an error.
    pub fn remove(&mut self, handle: Handle) -> bool {
        if !self.index.is_valid(handle) {
            return false;
        }
        self.index.invalidate(handle);
        self.free[self.index.count() as usize] = handle.slot();
        unsafe { self.columns.destroy_at(handle.slot()) };
        true
    }

    /// Reference to one column's value of a live row.
    pub fn get<T, I>(&self, handle: Handle) -> Option<&T>
    where
        R::Columns: ColumnAt<T, I>,
    {
        if !self.index.is_valid(handle) {
            return None;
        }
        Some(unsafe { self.columns.column().get_unchecked(handle.slot()) })
    }

    /// Mutable reference to one column's value of a live row.
    pub fn get_mut<T, I>(&mut self, handle: Handle) -> Option<&mut T>
    where
        R::Columns: ColumnAt<T, I>,
    {
        if !self.index.is_valid(handle) {
            return None;
        }
        let slot = handle.slot();
        Some(unsafe { self.columns.column_mut().get_unchecked_mut(slot) })
    }

    /// Handles of all live rows, in ascending slot order.
    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.index.occupied()
    }

    /// Iterates one column as `(Handle, &T)` pairs, in ascending slot order.
    ///
    /// The column type picks the column; it must appear exactly once in the
    /// table's type list, which the compiler enforces:
    ///
    /// ```compile_fail
    /// use column_tables::SparseTable;
    /// let table: SparseTable<(u32, u32)> = SparseTable::new();
    /// let _ = table.column::<u32, _>(); // ambiguous: u32 appears twice
    /// ```
    pub fn column<'a, T: 'a, I>(&'a self) -> impl Iterator<Item = (Handle, &'a T)> + 'a
    where
        R::Columns: ColumnAt<T, I>,
    {
        let column = self.columns.column();
        self.index
            .occupied()
            .map(move |handle| (handle, unsafe { column.get_unchecked(handle.slot()) }))
    }

    /// Iterates one column mutably as `(Handle, &mut T)` pairs.
    pub fn column_mut<T, I>(&mut self) -> SparseColumnMut<'_, T>
    where
        R::Columns: ColumnAt<T, I>,
    {
        SparseColumnMut {
            gens: self.index.gens().iter().enumerate(),
            base: self.columns.column_mut().base_ptr(),
            _marker: PhantomData,
        }
    }

    pub(crate) fn insert_row(&mut self, row: R) -> Handle {
        self.grow_for(self.index.count() + 1);
        let slot = self.free[self.index.count() as usize];
        let handle = self.index.allocate(slot);
        unsafe { self.columns.construct_at(slot, row) };
        handle
    }

    pub(crate) fn row_parts_mut(&mut self) -> (&SlotIndex, &mut R::Columns) {
        (&self.index, &mut self.columns)
    }

    /// The one growth transaction: index first, then every column, then the
    /// free stack, all to the same capacity. Nothing else ever resizes
    /// storage.
    fn grow_for(&mut self, needed: u32) {
        if needed <= self.capacity() {
            return;
        }
        let new_capacity = needed.max(self.capacity().saturating_mul(2));
        let old_capacity = self.index.capacity();
        self.index.grow(new_capacity);
        let Self {
            index,
            free,
            columns,
        } = self;
        columns.grow_in_place(new_capacity, |slot| index.is_occupied(slot));
        free.extend(old_capacity..new_capacity);
    }
}

impl<R: Row> Default for SparseTable<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Row> Drop for SparseTable<R> {
    fn drop(&mut self) {
        // Columns have no memory of which cells are live; destroy through
        // the index before the backing arrays are freed.
        let index = &self.index;
        unsafe { self.columns.destroy_occupied(|slot| index.is_occupied(slot)) };
    }
}

/// Mutable per-column iterator of a [`SparseTable`], yielding
/// `(Handle, &mut T)` for every live row in ascending slot order.
pub struct SparseColumnMut<'a, T> {
    gens: std::iter::Enumerate<std::slice::Iter<'a, u32>>,
    base: *mut T,
    _marker: PhantomData<&'a mut T>,
}

impl<'a, T> Iterator for SparseColumnMut<'a, T> {
    type Item = (Handle, &'a mut T);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (slot, &gen) = self.gens.next()?;
            if gen & 1 == 0 {
                // Each occupied slot is visited once, so the references
                // handed out never alias.
                let value = unsafe { &mut *self.base.add(slot) };
                return Some((Handle::new(gen, slot as u32), value));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn collect_column<R, T, I>(table: &SparseTable<R>) -> Vec<T>
    where
        R: Row,
        R::Columns: ColumnAt<T, I>,
        T: Copy,
    {
        table.column::<T, _>().map(|(_, value)| *value).collect()
    }

    // empty table => created => no rows
    #[test]
    fn empty_table_created_no_rows() {
        let table: SparseTable<(i32, f64, bool)> = SparseTable::new();

        assert_eq!(table.count(), 0);
        assert_eq!(table.capacity(), 0);
        assert!(table.is_empty());
        assert_eq!(table.column::<i32, _>().count(), 0);
    }

    // empty table => created with capacity => no rows but storage reserved
    #[test]
    fn empty_table_created_with_capacity_no_rows() {
        let table: SparseTable<(i32, f64, bool)> = SparseTable::with_capacity(10);

        assert_eq!(table.count(), 0);
        assert_eq!(table.capacity(), 10);
        assert_eq!(table.column::<f64, _>().count(), 0);
    }

    // empty table => insert rows => columns read back in slot order
    #[test]
    fn empty_table_insert_rows_columns_read_back_in_slot_order() {
        let mut table: SparseTable<(i32, f64, bool)> = SparseTable::new();

        let fst = table.insert(1, 0.1, true);
        let sec = table.insert(2, 0.2, false);
        let thd = table.insert(3, 0.3, false);

        assert_eq!(table.count(), 3);
        assert_eq!(table.capacity(), 4);
        assert_eq!(collect_column::<_, i32, _>(&table), [1, 2, 3]);
        assert_eq!(collect_column::<_, f64, _>(&table), [0.1, 0.2, 0.3]);
        assert_eq!(collect_column::<_, bool, _>(&table), [true, false, false]);
        assert!(table.contains(fst) && table.contains(sec) && table.contains(thd));
    }

    // table with three rows => remove two and insert one => freed slot is reused
    #[test]
    fn table_with_three_rows_remove_two_insert_one_freed_slot_reused() {
        let mut table: SparseTable<(i32, f64, bool)> = SparseTable::new();
        let fst = table.insert(1, 0.1, true);
        let sec = table.insert(2, 0.2, false);
        let thd = table.insert(3, 0.3, false);

        assert!(table.remove(sec));
        assert!(table.remove(fst));
        assert_eq!(table.count(), 1);

        let new = table.insert(4, 0.4, true);

        // The free stack is LIFO: the new row lands in the slot freed last.
        assert_eq!(new.slot(), fst.slot());
        assert_ne!(new, fst);
        assert_eq!(collect_column::<_, i32, _>(&table), [4, 3]);
        assert_eq!(collect_column::<_, f64, _>(&table), [0.4, 0.3]);
        assert_eq!(collect_column::<_, bool, _>(&table), [true, false]);
        assert!(table.contains(thd));
    }

    // table with one row => remove it twice => second removal reports not found
    #[test]
    fn table_with_one_row_remove_twice_second_removal_not_found() {
        let mut table: SparseTable<(i32, f64, bool)> = SparseTable::new();
        let row = table.insert(1, 0.1, true);

        assert!(table.remove(row));
        assert!(!table.remove(row));
        assert_eq!(table.count(), 0);
        assert_eq!(table.get::<i32, _>(row), None);
    }

    // removed handle => slot reused by a new row => stale handle still rejected
    #[test]
    fn removed_handle_slot_reused_stale_handle_still_rejected() {
        let mut table: SparseTable<(i32, f64, bool)> = SparseTable::new();
        let old = table.insert(1, 0.1, true);
        table.remove(old);

        let new = table.insert(2, 0.2, false);
        assert_eq!(new.slot(), old.slot());

        assert!(!table.contains(old));
        assert_eq!(table.get::<i32, _>(old), None);
        assert!(!table.remove(old));
        assert_eq!(table.get::<i32, _>(new), Some(&2));
    }

    // growing table => capacity doubles => previously issued handles stay valid
    #[test]
    fn growing_table_capacity_doubles_handles_stay_valid() {
        let mut table: SparseTable<(u32, String)> = SparseTable::new();
        let mut handles = Vec::new();
        let mut capacities = vec![table.capacity()];

        for i in 0..5 {
            handles.push(table.insert(i, i.to_string()));
            if Some(&table.capacity()) != capacities.last() {
                capacities.push(table.capacity());
            }
        }

        assert_eq!(capacities, [0, 1, 2, 4, 8]);
        for (i, &handle) in handles.iter().enumerate() {
            assert_eq!(table.get::<u32, _>(handle), Some(&(i as u32)));
            assert_eq!(table.get::<String, _>(handle), Some(&i.to_string()));
        }
    }

    // table with rows => mutate through get_mut and column_mut => values change
    #[test]
    fn table_with_rows_mutate_through_get_mut_and_column_mut_values_change() {
        let mut table: SparseTable<(i32, String)> = SparseTable::new();
        let fst = table.insert(1, "one".to_string());
        let sec = table.insert(2, "two".to_string());

        *table.get_mut::<i32, _>(fst).unwrap() = 10;
        for (handle, value) in table.column_mut::<String, _>() {
            if handle == sec {
                value.push_str("!");
            }
        }

        assert_eq!(collect_column::<_, i32, _>(&table), [10, 2]);
        assert_eq!(table.get::<String, _>(sec), Some(&"two!".to_string()));
    }

    // table with a hole => for_each_row => visits live rows with every column
    #[test]
    fn table_with_hole_for_each_row_visits_live_rows_with_every_column() {
        let mut table: SparseTable<(i32, f64)> = SparseTable::new();
        table.insert(1, 0.1);
        let sec = table.insert(2, 0.2);
        table.insert(3, 0.3);
        table.remove(sec);

        let mut seen = Vec::new();
        table.for_each_row(|handle, number, float| {
            *number *= 2;
            seen.push((handle.slot(), *number, *float));
        });

        assert_eq!(seen, [(0, 2, 0.1), (2, 6, 0.3)]);
        assert_eq!(collect_column::<_, i32, _>(&table), [2, 6]);
    }

    // handles iterator => ascending slot order matching columns
    #[test]
    fn handles_iterator_ascending_slot_order_matching_columns() {
        let mut table: SparseTable<(i32,)> = SparseTable::new();
        let a = table.insert(1);
        let b = table.insert(2);
        let c = table.insert(3);
        table.remove(b);

        let handles: Vec<_> = table.handles().collect();
        assert_eq!(handles, [a, c]);
        let from_column: Vec<_> = table.column::<i32, _>().map(|(h, _)| h).collect();
        assert_eq!(handles, from_column);
    }

    // column iterator => collected references stay usable after the iterator is gone
    #[test]
    fn column_iterator_collected_references_stay_usable() {
        let mut table: SparseTable<(String, u32)> = SparseTable::new();
        table.insert("one".to_string(), 1);
        table.insert("two".to_string(), 2);

        let names: Vec<&str> = table.column::<String, _>().map(|(_, v)| v.as_str()).collect();
        assert_eq!(names, ["one", "two"]);
    }

    // handle from a larger table => checked against a smaller one => reported not found
    #[test]
    fn handle_from_larger_table_checked_against_smaller_reported_not_found() {
        let mut big: SparseTable<(u8,)> = SparseTable::new();
        let mut foreign = big.insert(0);
        for i in 1..9 {
            foreign = big.insert(i);
        }
        let mut small: SparseTable<(u8,)> = SparseTable::new();
        small.insert(42);

        assert!(foreign.slot() >= small.capacity());
        assert!(!small.contains(foreign));
        assert_eq!(small.get::<u8, _>(foreign), None);
        assert!(!small.remove(foreign));
    }

    struct DropGuard(Rc<Cell<usize>>);
    impl Drop for DropGuard {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    // table with live rows => dropped => every live value destroyed exactly once
    #[test]
    fn table_with_live_rows_dropped_every_live_value_destroyed_once() {
        let drops = Rc::new(Cell::new(0));
        {
            let mut table: SparseTable<(u32, DropGuard)> = SparseTable::new();
            table.insert(1, DropGuard(Rc::clone(&drops)));
            let sec = table.insert(2, DropGuard(Rc::clone(&drops)));
            table.insert(3, DropGuard(Rc::clone(&drops)));

            table.remove(sec);
            assert_eq!(drops.get(), 1);
        }
        assert_eq!(drops.get(), 3);
    }

    // rows survive growth => values destroyed exactly once on drop
    #[test]
    fn rows_survive_growth_values_destroyed_once_on_drop() {
        let drops = Rc::new(Cell::new(0));
        {
            let mut table: SparseTable<(DropGuard,)> = SparseTable::new();
            for _ in 0..9 {
                table.insert(DropGuard(Rc::clone(&drops)));
            }
            assert_eq!(drops.get(), 0);
        }
        assert_eq!(drops.get(), 9);
    }

    // zero sized column type => insert, iterate, remove => bookkeeping intact
    #[test]
    fn zero_sized_column_type_insert_iterate_remove_bookkeeping_intact() {
        let mut table: SparseTable<((), u8)> = SparseTable::new();
        let fst = table.insert((), 1);
        let sec = table.insert((), 2);

        assert_eq!(table.column::<(), _>().count(), 2);
        assert!(table.remove(fst));
        assert_eq!(collect_column::<_, u8, _>(&table), [2]);
        assert_eq!(table.get::<u8, _>(sec), Some(&2));
    }

    // occupancy index => allocate and invalidate => parity flips and count tracks
    #[test]
    fn occupancy_index_allocate_and_invalidate_parity_flips_and_count_tracks() {
        let mut index = SlotIndex::with_capacity(4);
        assert_eq!(index.count(), 0);
        assert!(!index.is_occupied(2));

        let handle = index.allocate(2);
        assert_eq!(handle.generation(), 2);
        assert!(index.is_occupied(2));
        assert!(index.is_valid(handle));
        assert_eq!(index.count(), 1);
        assert_eq!(index.occupied().collect::<Vec<_>>(), [handle]);

        let freed = index.invalidate(handle);
        assert_eq!(freed.generation(), 3);
        assert!(!index.is_occupied(2));
        assert!(!index.is_valid(handle));
        assert_eq!(index.count(), 0);

        index.grow(8);
        assert_eq!(index.capacity(), 8);
        assert!(!index.is_valid(handle));
    }
}
