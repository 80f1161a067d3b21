//! Columnar tables with generation-checked handles.
//!
//! A table stores rows whose column types are given as a tuple; each column
//! lives in its own contiguous array, and rows are addressed by a [`Handle`]
//! that detects reuse of its slot. Two storage strategies are provided:
//!
//! - [`SparseTable`]: rows never move. Removal leaves a hole that a later
//!   insertion fills, so handles map straight to storage slots and growth is
//!   the only time anything is copied. Iteration skips holes.
//! - [`DenseTable`]: columns are kept gap-free by moving the last row into
//!   a removed row's place. Iteration is a plain scan, at the price of
//!   storage positions (and iteration order) changing on removal.
//!
//! Both tables share the same surface:
//!
//! ```
//! use column_tables::SparseTable;
//!
//! let mut table: SparseTable<(String, u32)> = SparseTable::new();
//! let alice = table.insert("alice".to_string(), 7);
//! let bob = table.insert("bob".to_string(), 3);
//!
//! table.remove(alice);
//! assert!(!table.contains(alice));
//!
//! for (_, score) in table.column_mut::<u32, _>() {
//!     *score += 1;
//! }
//! assert_eq!(table.get::<u32, _>(bob), Some(&4));
//! ```
//!
//! Columns are selected by type, checked at compile time: asking for a type
//! the row does not have, or has twice, does not compile.
//!
//! Insertion, removal and lookup are O(1). All storage of a table grows
//! together, doubling, so a row is never half-inserted.

mod dense;
mod handle;
mod raw_column;
mod row;
mod sparse;

pub use dense::DenseTable;
pub use handle::Handle;
pub use raw_column::RawColumn;
pub use row::{ColumnAt, Columns, Row, C0, C1, C2, C3, C4, C5, C6, C7};
pub use sparse::{SparseColumnMut, SparseTable};
