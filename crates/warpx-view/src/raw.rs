//! The one place engine pointers become typed views.
//!
//! Every function here reinterprets `*mut T` as `Cell<T>` storage. `Cell<T>`
//! has the same in-memory representation as `T`, so the engine's buffers
//! are read and written in place. Empty views never touch the pointer.

#![allow(unsafe_code)]

use std::cell::Cell;
use std::ptr::NonNull;

use ndarray::{ArrayView1, ArrayView3, Ix1, Ix3, ShapeBuilder};

/// Borrow `len` contiguous elements starting at `ptr`.
///
/// # Safety
///
/// Unless `len == 0`, `ptr` must be non-null, aligned, and point to `len`
/// initialized `T` that stay allocated for `'a`. For `'a`, the memory may
/// only be accessed through `Cell`s or by the owning engine while no view
/// is in use.
pub(crate) unsafe fn cells<'a, T>(ptr: *mut T, len: usize) -> &'a [Cell<T>] {
    if len == 0 {
        return &[];
    }
    debug_assert!(!ptr.is_null());
    // SAFETY: Cell<T> is repr(transparent) over T; validity per contract.
    unsafe { std::slice::from_raw_parts(ptr.cast::<Cell<T>>(), len) }
}

/// Borrow `len` elements spaced `stride` elements apart, starting at `base`.
///
/// # Safety
///
/// As [`cells`], for every address `base + i * stride`, `i < len`.
pub(crate) unsafe fn strided<'a, T>(
    base: *mut T,
    len: usize,
    stride: usize,
) -> ArrayView1<'a, Cell<T>> {
    let ptr = if len == 0 {
        NonNull::<Cell<T>>::dangling().as_ptr()
    } else {
        debug_assert!(!base.is_null());
        base.cast::<Cell<T>>()
    };
    // SAFETY: shape/stride describe addresses the caller vouched for; an
    // empty view uses a dangling aligned pointer that is never read.
    unsafe { ArrayView1::from_shape_ptr(Ix1(len).strides(Ix1(stride)), ptr) }
}

/// Borrow a dense C-order 3D block of `shape[0] * shape[1] * shape[2]`
/// elements starting at `ptr`.
///
/// # Safety
///
/// As [`cells`], with `len` the product of `shape`.
pub(crate) unsafe fn grid<'a, T>(ptr: *mut T, shape: [usize; 3]) -> ArrayView3<'a, Cell<T>> {
    let len = shape.iter().product::<usize>();
    let ptr = if len == 0 {
        NonNull::<Cell<T>>::dangling().as_ptr()
    } else {
        debug_assert!(!ptr.is_null());
        ptr.cast::<Cell<T>>()
    };
    // SAFETY: contiguous C-order block of `len` elements per contract.
    unsafe { ArrayView3::from_shape_ptr(Ix3(shape[0], shape[1], shape[2]), ptr) }
}
