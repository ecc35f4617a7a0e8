//! NumPy arrays over engine memory.
//!
//! Each helper wraps an engine buffer in a writable `memoryview` and hands
//! it to `numpy.ndarray(..., buffer=...)`, so the resulting array reads and
//! writes the engine's storage in place. Nothing keeps the engine buffer
//! alive from the Python side: an array is valid until the next call that
//! lets the engine mutate its storage (injection, evolve, push, boundary
//! fill, clock setters).

use std::ffi::{c_char, c_int};
use std::mem::size_of;

use pyo3::exceptions::PyOverflowError;
use pyo3::ffi;
use pyo3::prelude::*;
use pyo3::types::PyDict;
use warpx_core::ParticleRecord;
use warpx_view::{GridView, ParticleTile, ScalarTile};

const PYBUF_WRITE: c_int = 0x200;

/// NumPy dtype matching `ParticleRecord`.
pub(crate) fn particle_dtype(py: Python<'_>) -> PyResult<Bound<'_, PyAny>> {
    let fields = vec![
        ("x", "f8"),
        ("y", "f8"),
        ("z", "f8"),
        ("id", "i4"),
        ("cpu", "i4"),
    ];
    py.import("numpy")?.getattr("dtype")?.call1((fields,))
}

fn f64_dtype(py: Python<'_>) -> PyResult<Bound<'_, PyAny>> {
    py.import("numpy")?.getattr("dtype")?.call1(("f8",))
}

/// Writable memoryview over `len` bytes at `ptr`.
///
/// # Safety
///
/// `ptr` must address `len` writable bytes that outlive every use of the
/// returned object.
unsafe fn memoryview(py: Python<'_>, ptr: *mut u8, len: usize) -> PyResult<Bound<'_, PyAny>> {
    let len = ffi::Py_ssize_t::try_from(len)
        .map_err(|_| PyOverflowError::new_err("engine buffer exceeds Py_ssize_t"))?;
    // SAFETY: forwarded contract; the memoryview does not take ownership.
    unsafe {
        let raw = ffi::PyMemoryView_FromMemory(ptr.cast::<c_char>(), len, PYBUF_WRITE);
        Bound::from_owned_ptr_or_err(py, raw)
    }
}

/// `numpy.ndarray` of `shape` and byte `strides` over `span` bytes at `ptr`.
///
/// An empty span yields a fresh empty array of the same shape and dtype.
///
/// # Safety
///
/// As [`memoryview`] for `span` bytes, and every element addressed by
/// `shape`/`strides` must lie inside the span.
unsafe fn ndarray_over<'py>(
    py: Python<'py>,
    ptr: *mut u8,
    span: usize,
    dtype: &Bound<'py, PyAny>,
    shape: &[usize],
    strides: &[isize],
) -> PyResult<Bound<'py, PyAny>> {
    let numpy = py.import("numpy")?;
    if span == 0 {
        return numpy.getattr("empty")?.call1((shape.to_vec(), dtype));
    }
    // SAFETY: forwarded contract.
    let buffer = unsafe { memoryview(py, ptr, span)? };
    let kwargs = PyDict::new(py);
    kwargs.set_item("dtype", dtype)?;
    kwargs.set_item("buffer", buffer)?;
    kwargs.set_item("strides", strides.to_vec())?;
    numpy
        .getattr("ndarray")?
        .call((shape.to_vec(),), Some(&kwargs))
}

/// Structured array over one tile's particle records.
pub(crate) fn particle_tile<'py>(
    py: Python<'py>,
    tile: &ParticleTile<'_>,
    dtype: &Bound<'py, PyAny>,
) -> PyResult<Bound<'py, PyAny>> {
    let record = size_of::<ParticleRecord>();
    // SAFETY: the tile covers `len` contiguous records of engine memory.
    unsafe {
        ndarray_over(
            py,
            tile.as_ptr().cast(),
            tile.len() * record,
            dtype,
            &[tile.len()],
            &[record as isize],
        )
    }
}

/// `float64` array over one tile's scalar component.
pub(crate) fn scalar_tile<'py>(
    py: Python<'py>,
    tile: &ScalarTile<'_>,
) -> PyResult<Bound<'py, PyAny>> {
    let dtype = f64_dtype(py)?;
    // SAFETY: the tile covers `len` contiguous doubles of engine memory.
    unsafe {
        ndarray_over(
            py,
            tile.as_ptr().cast(),
            tile.len() * size_of::<f64>(),
            &dtype,
            &[tile.len()],
            &[size_of::<f64>() as isize],
        )
    }
}

/// `float64` 3D array over one grid, with the view's own strides.
pub(crate) fn grid<'py>(py: Python<'py>, grid: &GridView<'_>) -> PyResult<Bound<'py, PyAny>> {
    let dtype = f64_dtype(py)?;
    let shape = grid.shape();
    let strides = grid.strides();
    let elem = size_of::<f64>();
    // One past the farthest element, in elements.
    let span = if grid.is_empty() {
        0
    } else {
        shape
            .iter()
            .zip(strides)
            .map(|(&n, s)| (n - 1) * s.unsigned_abs())
            .sum::<usize>()
            + 1
    };
    let byte_strides = strides.map(|s| s * elem as isize);
    // SAFETY: the view addresses exactly the elements within `span` of its
    // origin, all inside the engine's grid buffer.
    unsafe {
        ndarray_over(
            py,
            grid.as_ptr().cast(),
            span * elem,
            &dtype,
            &shape,
            &byte_strides,
        )
    }
}
