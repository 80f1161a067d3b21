use std::alloc::{self, Layout};
use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};

/// Raw backing storage for one column of a table.
///
/// A `RawColumn` owns `capacity` uninitialized element slots and nothing
/// else: it has no idea which cells hold live values. Liveness is tracked
/// entirely by the slot index of the owning table, which is why almost every
/// method here is `unsafe` — the caller vouches that the cell it names is in
/// the state the operation expects.
///
/// This is the only module in the crate that touches the allocator or does
/// pointer arithmetic. Everything above it goes through the table types,
/// which pair every column with an index and uphold the liveness contract.
///
/// Dropping a `RawColumn` frees the allocation but does not drop any values;
/// the owner must destroy live cells first (see [`destroy_occupied`] and
/// [`destroy_packed`]).
///
/// [`destroy_occupied`]: RawColumn::destroy_occupied
/// [`destroy_packed`]: RawColumn::destroy_packed
pub struct RawColumn<T> {
    data: NonNull<T>,
    capacity: u32,
    _marker: PhantomData<T>,
}

// The raw pointer blocks the auto impls; a RawColumn is just owned storage
// for values of T, so it moves between threads exactly when T does.
unsafe impl<T: Send> Send for RawColumn<T> {}
unsafe impl<T: Sync> Sync for RawColumn<T> {}

impl<T> RawColumn<T> {
    /// Allocates storage for `capacity` elements, all cells dead.
    ///
    /// Zero-sized element types and zero capacities never allocate.
    /// Aborts the process via [`alloc::handle_alloc_error`] if the allocator
    /// fails; there is no partial state to recover.
    pub(crate) fn with_capacity(capacity: u32) -> Self {
        let data = if capacity == 0 || mem::size_of::<T>() == 0 {
            NonNull::dangling()
        } else {
            let layout = match Layout::array::<T>(capacity as usize) {
                Ok(layout) => layout,
                Err(_) => panic!("column capacity overflow"),
            };
            let raw = unsafe { alloc::alloc(layout) };
            match NonNull::new(raw as *mut T) {
                Some(data) => data,
                None => alloc::handle_alloc_error(layout),
            }
        };
        Self {
            data,
            capacity,
            _marker: PhantomData,
        }
    }

    pub(crate) fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Pointer to the cell at `idx`. The cell may be dead; dereferencing is
    /// on the caller.
    #[inline]
    pub(crate) fn ptr_at(&self, idx: u32) -> *mut T {
        debug_assert!(idx < self.capacity);
        unsafe { self.data.as_ptr().add(idx as usize) }
    }

    /// Pointer to the start of the storage, valid even at zero capacity.
    #[inline]
    pub(crate) fn base_ptr(&self) -> *mut T {
        self.data.as_ptr()
    }

    /// Writes `value` into the cell at `idx`, making it live.
    ///
    /// # Safety
    /// `idx` must be within capacity and the cell must currently be dead,
    /// otherwise the previous value leaks.
    #[inline]
    pub(crate) unsafe fn construct_at(&mut self, idx: u32, value: T) {
        debug_assert!(idx < self.capacity);
        unsafe { ptr::write(self.data.as_ptr().add(idx as usize), value) };
    }

    /// Drops the value in the cell at `idx`, making it dead. No-op for
    /// element types without drop glue.
    ///
    /// # Safety
    /// `idx` must be within capacity and the cell must be live.
    #[inline]
    pub(crate) unsafe fn destroy_at(&mut self, idx: u32) {
        debug_assert!(idx < self.capacity);
        if mem::needs_drop::<T>() {
            unsafe { ptr::drop_in_place(self.data.as_ptr().add(idx as usize)) };
        }
    }

    /// Shared reference to the live value at `idx`.
    ///
    /// # Safety
    /// `idx` must be within capacity and the cell must be live.
    #[inline]
    pub(crate) unsafe fn get_unchecked(&self, idx: u32) -> &T {
        debug_assert!(idx < self.capacity);
        unsafe { &*self.data.as_ptr().add(idx as usize) }
    }

    /// Mutable reference to the live value at `idx`.
    ///
    /// # Safety
    /// `idx` must be within capacity and the cell must be live.
    #[inline]
    pub(crate) unsafe fn get_unchecked_mut(&mut self, idx: u32) -> &mut T {
        debug_assert!(idx < self.capacity);
        unsafe { &mut *self.data.as_ptr().add(idx as usize) }
    }

    /// View of the first `len` cells as a slice.
    ///
    /// # Safety
    /// All of the first `len` cells must be live (dense layout only).
    #[inline]
    pub(crate) unsafe fn as_slice(&self, len: u32) -> &[T] {
        debug_assert!(len <= self.capacity);
        unsafe { std::slice::from_raw_parts(self.data.as_ptr(), len as usize) }
    }

    /// Mutable view of the first `len` cells as a slice.
    ///
    /// # Safety
    /// All of the first `len` cells must be live (dense layout only).
    #[inline]
    pub(crate) unsafe fn as_mut_slice(&mut self, len: u32) -> &mut [T] {
        debug_assert!(len <= self.capacity);
        unsafe { std::slice::from_raw_parts_mut(self.data.as_ptr(), len as usize) }
    }

    /// Drops the value at `removed` and moves the value at `last` into its
    /// place, leaving the `last` cell dead. `removed == last` just drops.
    ///
    /// # Safety
    /// Both cells must be live, `removed <= last`, `last` within capacity.
    pub(crate) unsafe fn swap_remove_at(&mut self, removed: u32, last: u32) {
        debug_assert!(removed <= last);
        debug_assert!(last < self.capacity);
        let base = self.data.as_ptr();
        unsafe {
            ptr::drop_in_place(base.add(removed as usize));
            if removed != last {
                ptr::copy_nonoverlapping(base.add(last as usize), base.add(removed as usize), 1);
            }
        }
    }

    /// Grows the storage to `new_capacity`, keeping every occupied cell at
    /// the same index. This is what keeps sparse handles valid across
    /// growth.
    ///
    /// `is_occupied` must answer for every index below the old capacity;
    /// dead cells are not moved and their (garbage) contents are discarded.
    pub(crate) fn grow_in_place(&mut self, new_capacity: u32, is_occupied: impl Fn(u32) -> bool) {
        debug_assert!(new_capacity >= self.capacity);
        let next = Self::with_capacity(new_capacity);
        if mem::size_of::<T>() != 0 {
            for idx in 0..self.capacity {
                if is_occupied(idx) {
                    unsafe {
                        ptr::copy_nonoverlapping(
                            self.data.as_ptr().add(idx as usize),
                            next.data.as_ptr().add(idx as usize),
                            1,
                        );
                    }
                }
            }
        }
        // The old allocation is freed here; its live cells were moved out
        // bitwise, so no values are dropped.
        *self = next;
    }

    /// Grows the storage to `new_capacity`, moving only the first `count`
    /// cells (which are the live ones in a dense column) to the front of the
    /// new allocation. Moves are bitwise, so this is a single bulk copy.
    pub(crate) fn grow_packed(&mut self, new_capacity: u32, count: u32) {
        debug_assert!(new_capacity >= self.capacity);
        debug_assert!(count <= self.capacity);
        let next = Self::with_capacity(new_capacity);
        if mem::size_of::<T>() != 0 && count != 0 {
            unsafe {
                ptr::copy_nonoverlapping(self.data.as_ptr(), next.data.as_ptr(), count as usize);
            }
        }
        *self = next;
    }

    /// Drops every value for which `is_occupied` answers true.
    ///
    /// # Safety
    /// `is_occupied` must report exactly the live cells.
    pub(crate) unsafe fn destroy_occupied(&mut self, is_occupied: impl Fn(u32) -> bool) {
        if !mem::needs_drop::<T>() {
            return;
        }
        for idx in 0..self.capacity {
            if is_occupied(idx) {
                unsafe { self.destroy_at(idx) };
            }
        }
    }

    /// Drops the values in the first `count` cells.
    ///
    /// # Safety
    /// All of the first `count` cells must be live.
    pub(crate) unsafe fn destroy_packed(&mut self, count: u32) {
        debug_assert!(count <= self.capacity);
        if !mem::needs_drop::<T>() {
            return;
        }
        unsafe {
            ptr::drop_in_place(std::slice::from_raw_parts_mut(
                self.data.as_ptr(),
                count as usize,
            ));
        }
    }
}

impl<T> Drop for RawColumn<T> {
    fn drop(&mut self) {
        if self.capacity != 0 && mem::size_of::<T>() != 0 {
            // The layout was validated when the storage was allocated.
            let layout = Layout::array::<T>(self.capacity as usize).unwrap();
            unsafe { alloc::dealloc(self.data.as_ptr().cast(), layout) };
        }
    }
}
