use crate::dense::DenseTable;
use crate::handle::Handle;
use crate::raw_column::RawColumn;
use crate::sparse::SparseTable;

/// A row type of a table: a tuple of column types, one storage array per
/// element. Implemented for tuples of arity 1 through 8.
///
/// Column types must be pairwise distinct; a repeated type makes every
/// by-type access ambiguous at compile time.
pub trait Row: Sized {
    type Columns: Columns<Row = Self>;
}

/// The set of storage arrays behind a table, kept at one shared capacity.
///
/// Every operation fans out to each column in declaration order. The
/// occupancy contract is the table's: these methods trust the caller the
/// same way [`RawColumn`] does.
pub trait Columns {
    type Row;

    fn with_capacity(capacity: u32) -> Self;

    /// Writes one row, splitting it across the columns at `idx`.
    ///
    /// # Safety
    /// `idx` must be within capacity and dead in every column.
    unsafe fn construct_at(&mut self, idx: u32, row: Self::Row);

    /// Drops the values at `idx` in every column.
    ///
    /// # Safety
    /// `idx` must be within capacity and live in every column.
    unsafe fn destroy_at(&mut self, idx: u32);

    /// Applies [`RawColumn::swap_remove_at`] to every column.
    ///
    /// # Safety
    /// Both cells must be live in every column, `removed <= last`, `last`
    /// within capacity.
    unsafe fn swap_remove_at(&mut self, removed: u32, last: u32);

    fn grow_in_place(&mut self, new_capacity: u32, is_occupied: impl Fn(u32) -> bool);

    fn grow_packed(&mut self, new_capacity: u32, count: u32);

    /// # Safety
    /// `is_occupied` must report exactly the live cells of every column.
    unsafe fn destroy_occupied(&mut self, is_occupied: impl Fn(u32) -> bool);

    /// # Safety
    /// The first `count` cells must be live in every column.
    unsafe fn destroy_packed(&mut self, count: u32);
}

/// Selects the column storing `T` out of a column set.
///
/// The second parameter is a position marker ([`C0`] through [`C7`]) that
/// the compiler infers, so call sites write `table.column::<T, _>()`. If `T`
/// appears more than once in the row the inference is ambiguous, and if it
/// does not appear at all no impl matches; either way the call does not
/// compile.
pub trait ColumnAt<T, I> {
    fn column(&self) -> &RawColumn<T>;
    fn column_mut(&mut self) -> &mut RawColumn<T>;
}

macro_rules! markers {
    ($($marker:ident),+) => {
        $(
            /// Column position marker for [`ColumnAt`]; inferred, never named.
            pub struct $marker;
        )+
    };
}

markers!(C0, C1, C2, C3, C4, C5, C6, C7);

macro_rules! impl_column_at {
    ([$($all:ident),+]) => {};
    ([$($all:ident),+] $target:ident $marker:ident $idx:tt $(, $rest_target:ident $rest_marker:ident $rest_idx:tt)*) => {
        impl<$($all,)+> ColumnAt<$target, $marker> for ($(RawColumn<$all>,)+) {
            #[inline]
            fn column(&self) -> &RawColumn<$target> {
                &self.$idx
            }

            #[inline]
            fn column_mut(&mut self) -> &mut RawColumn<$target> {
                &mut self.$idx
            }
        }

        impl_column_at!([$($all),+] $($rest_target $rest_marker $rest_idx),*);
    };
}

macro_rules! impl_row {
    ($(($t:ident, $col:ident, $val:ident, $idx:tt, $marker:ident)),+ $(,)?) => {
        impl<$($t,)+> Row for ($($t,)+) {
            type Columns = ($(RawColumn<$t>,)+);
        }

        impl<$($t,)+> Columns for ($(RawColumn<$t>,)+) {
            type Row = ($($t,)+);

            fn with_capacity(capacity: u32) -> Self {
                ($(RawColumn::<$t>::with_capacity(capacity),)+)
            }

            unsafe fn construct_at(&mut self, idx: u32, row: Self::Row) {
                let ($($col,)+) = self;
                let ($($val,)+) = row;
                unsafe { $($col.construct_at(idx, $val);)+ }
            }

            unsafe fn destroy_at(&mut self, idx: u32) {
                let ($($col,)+) = self;
                unsafe { $($col.destroy_at(idx);)+ }
            }

            unsafe fn swap_remove_at(&mut self, removed: u32, last: u32) {
                let ($($col,)+) = self;
                unsafe { $($col.swap_remove_at(removed, last);)+ }
            }

            fn grow_in_place(&mut self, new_capacity: u32, is_occupied: impl Fn(u32) -> bool) {
                let ($($col,)+) = self;
                $($col.grow_in_place(new_capacity, &is_occupied);)+
            }

            fn grow_packed(&mut self, new_capacity: u32, count: u32) {
                let ($($col,)+) = self;
                $($col.grow_packed(new_capacity, count);)+
            }

            unsafe fn destroy_occupied(&mut self, is_occupied: impl Fn(u32) -> bool) {
                let ($($col,)+) = self;
                unsafe { $($col.destroy_occupied(&is_occupied);)+ }
            }

            unsafe fn destroy_packed(&mut self, count: u32) {
                let ($($col,)+) = self;
                unsafe { $($col.destroy_packed(count);)+ }
            }
        }

        impl_column_at!([$($t),+] $($t $marker $idx),+);

        impl<$($t,)+> SparseTable<($($t,)+)> {
            /// Inserts a row, one value per column, and returns its handle.
            /// Grows all storage in lockstep when the table is full.
            pub fn insert(&mut self, $($val: $t,)+) -> Handle {
                self.insert_row(($($val,)+))
            }

            /// Calls `visit` once per live row, in ascending slot order,
            /// with the row's handle and a mutable reference into every
            /// column.
            pub fn for_each_row(&mut self, mut visit: impl FnMut(Handle, $(&mut $t,)+)) {
                let (index, columns) = self.row_parts_mut();
                let ($($col,)+) = columns;
                for handle in index.occupied() {
                    let slot = handle.slot();
                    // Columns are distinct arrays, so the references passed
                    // to one call never alias.
                    visit(handle, $(unsafe { &mut *$col.ptr_at(slot) },)+);
                }
            }
        }

        impl<$($t,)+> DenseTable<($($t,)+)> {
            /// Inserts a row, one value per column, and returns its handle.
            /// Grows all storage in lockstep when the table is full.
            pub fn insert(&mut self, $($val: $t,)+) -> Handle {
                self.insert_row(($($val,)+))
            }

            /// Calls `visit` once per live row, in storage order, with the
            /// row's handle and a mutable reference into every column.
            pub fn for_each_row(&mut self, mut visit: impl FnMut(Handle, $(&mut $t,)+)) {
                let (index, columns) = self.row_parts_mut();
                let ($($col,)+) = columns;
                for position in 0..index.count() {
                    visit(index.handle_at(position), $(unsafe { &mut *$col.ptr_at(position) },)+);
                }
            }
        }
    };
}

impl_row!((A, c0, v0, 0, C0));
impl_row!((A, c0, v0, 0, C0), (B, c1, v1, 1, C1));
impl_row!((A, c0, v0, 0, C0), (B, c1, v1, 1, C1), (C, c2, v2, 2, C2));
impl_row!(
    (A, c0, v0, 0, C0),
    (B, c1, v1, 1, C1),
    (C, c2, v2, 2, C2),
    (D, c3, v3, 3, C3)
);
impl_row!(
    (A, c0, v0, 0, C0),
    (B, c1, v1, 1, C1),
    (C, c2, v2, 2, C2),
    (D, c3, v3, 3, C3),
    (E, c4, v4, 4, C4)
);
impl_row!(
    (A, c0, v0, 0, C0),
    (B, c1, v1, 1, C1),
    (C, c2, v2, 2, C2),
    (D, c3, v3, 3, C3),
    (E, c4, v4, 4, C4),
    (F, c5, v5, 5, C5)
);
impl_row!(
    (A, c0, v0, 0, C0),
    (B, c1, v1, 1, C1),
    (C, c2, v2, 2, C2),
    (D, c3, v3, 3, C3),
    (E, c4, v4, 4, C4),
    (F, c5, v5, 5, C5),
    (G, c6, v6, 6, C6)
);
impl_row!(
    (A, c0, v0, 0, C0),
    (B, c1, v1, 1, C1),
    (C, c2, v2, 2, C2),
    (D, c3, v3, 3, C3),
    (E, c4, v4, 4, C4),
    (F, c5, v5, 5, C5),
    (G, c6, v6, 6, C6),
    (H, c7, v7, 7, C7)
);

#[cfg(test)]
mod tests {
    use super::*;

    // eight column row => insert and read every column by type => all resolve
    #[test]
    fn eight_column_row_insert_and_read_every_column_by_type_all_resolve() {
        let mut table: SparseTable<(u8, u16, u32, u64, i8, i16, i32, i64)> = SparseTable::new();
        let row = table.insert(1, 2, 3, 4, -1, -2, -3, -4);

        assert_eq!(table.get::<u8, _>(row), Some(&1));
        assert_eq!(table.get::<u16, _>(row), Some(&2));
        assert_eq!(table.get::<u32, _>(row), Some(&3));
        assert_eq!(table.get::<u64, _>(row), Some(&4));
        assert_eq!(table.get::<i8, _>(row), Some(&-1));
        assert_eq!(table.get::<i16, _>(row), Some(&-2));
        assert_eq!(table.get::<i32, _>(row), Some(&-3));
        assert_eq!(table.get::<i64, _>(row), Some(&-4));
    }

    // single column row => full table lifecycle => behaves like wider rows
    #[test]
    fn single_column_row_full_table_lifecycle_behaves_like_wider_rows() {
        let mut table: DenseTable<(String,)> = DenseTable::new();
        let fst = table.insert("one".to_string());
        let sec = table.insert("two".to_string());

        assert!(table.remove(fst));
        assert_eq!(table.get::<String, _>(sec), Some(&"two".to_string()));

        table.for_each_row(|_, value| value.make_ascii_uppercase());
        assert_eq!(table.get::<String, _>(sec), Some(&"TWO".to_string()));
    }
}
