//! Ownership of engine-allocated bookkeeping arrays.
//!
//! Every accessor export hands back scratch arrays (per-tile counts,
//! per-grid shapes, the pointer table itself) that the engine allocates
//! per call and the caller must release. [`EngineArray`] adopts one such
//! array and releases it on drop through the table's [`FreeFn`]. Only
//! bookkeeping is ever adopted; the per-tile and per-grid data buffers the
//! pointer tables point at stay engine-owned.

use std::fmt;

use log::trace;

use crate::api::FreeFn;

/// An engine-allocated array of `len` elements, released on drop.
pub struct EngineArray<T> {
    ptr: *mut T,
    len: usize,
    free: FreeFn,
}

impl<T> EngineArray<T> {
    /// Adopt `ptr`, which must be released with `free`.
    ///
    /// A null `ptr` is accepted and treated as an empty array; nothing is
    /// released for it.
    ///
    /// # Safety
    ///
    /// If non-null, `ptr` must point to at least `len` initialized `T`
    /// allocated by the allocator `free` belongs to, and must not be
    /// released elsewhere.
    #[allow(unsafe_code)]
    pub unsafe fn adopt(ptr: *mut T, len: usize, free: FreeFn) -> Self {
        Self { ptr, len, free }
    }

    /// Advertised element count (zero for a null array).
    pub fn len(&self) -> usize {
        if self.ptr.is_null() {
            0
        } else {
            self.len
        }
    }

    /// Whether the array holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the engine returned a null pointer.
    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }

    /// Borrow the contents.
    #[allow(unsafe_code)]
    pub fn as_slice(&self) -> &[T] {
        if self.is_empty() {
            return &[];
        }
        // SAFETY: non-null and `len` initialized elements per `adopt`.
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }
}

impl<T> Drop for EngineArray<T> {
    #[allow(unsafe_code)]
    fn drop(&mut self) {
        if self.ptr.is_null() {
            return;
        }
        trace!("releasing engine array {:p} ({} elements)", self.ptr, self.len);
        // SAFETY: `adopt` guarantees `free` matches the allocation and
        // that nothing else releases it.
        unsafe { (self.free)(self.ptr.cast()) };
    }
}

impl<T: fmt::Debug> fmt::Debug for EngineArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::ffi::c_int;

    thread_local! {
        static RELEASED: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
    }

    unsafe extern "C" fn recording_free(p: *mut libc::c_void) {
        RELEASED.with(|r| r.borrow_mut().push(p as usize));
        // SAFETY: tests only hand this malloc'd pointers.
        unsafe { libc::free(p) };
    }

    fn malloc_ints(values: &[c_int]) -> *mut c_int {
        // SAFETY: plain allocation; checked for null below.
        let p = unsafe { libc::malloc(std::mem::size_of_val(values).max(1)) } as *mut c_int;
        assert!(!p.is_null());
        // SAFETY: p has room for values.len() ints.
        unsafe { std::ptr::copy_nonoverlapping(values.as_ptr(), p, values.len()) };
        p
    }

    #[test]
    fn contents_are_readable_and_released_once_on_drop() {
        let p = malloc_ints(&[3, 0, 5]);
        {
            // SAFETY: p holds three malloc'd ints.
            let arr = unsafe { EngineArray::adopt(p, 3, recording_free) };
            assert_eq!(arr.as_slice(), &[3, 0, 5]);
            assert_eq!(arr.len(), 3);
        }
        RELEASED.with(|r| assert_eq!(*r.borrow(), vec![p as usize]));
    }

    #[test]
    fn null_is_empty_and_never_released() {
        {
            // SAFETY: null is always accepted.
            let arr = unsafe { EngineArray::<c_int>::adopt(std::ptr::null_mut(), 4, recording_free) };
            assert!(arr.is_null());
            assert!(arr.is_empty());
            assert_eq!(arr.as_slice(), &[] as &[c_int]);
        }
        RELEASED.with(|r| assert!(r.borrow().is_empty()));
    }
}
