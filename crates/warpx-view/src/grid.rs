//! Per-grid mesh views.
//!
//! One [`GridView`] covers one grid's buffer for one component of E, B or
//! J at one AMR level. The engine reports a shape per grid that includes
//! ghost cells on every side; [`GridView::interior`] strips them by
//! re-slicing, never by copying.

use std::cell::Cell;

use ndarray::{s, Array3, ArrayView3};
use warpx_core::{BindingError, Direction, FieldKind};

use crate::raw;

/// Writable C-order 3D view of one grid component.
#[derive(Clone, Debug)]
pub struct GridView<'a> {
    data: ArrayView3<'a, Cell<f64>>,
    /// Ghost cells per side still present in `data`.
    ghosts: usize,
    kind: FieldKind,
    direction: Direction,
}

impl<'a> GridView<'a> {
    /// Wrap an engine grid buffer of `shape` (ghosts included).
    ///
    /// # Safety
    ///
    /// `shape[0] * shape[1] * shape[2]` must not overflow `usize`. Unless
    /// the shape is empty, `ptr` must point to that many initialized `f64`
    /// laid out in C order, allocated and unmoved for `'a`, and touched
    /// only through `Cell`-based views during `'a`.
    #[allow(unsafe_code)]
    pub unsafe fn from_raw(
        ptr: *mut f64,
        shape: [usize; 3],
        ghosts: usize,
        kind: FieldKind,
        direction: Direction,
    ) -> Self {
        Self {
            // SAFETY: forwarded contract.
            data: unsafe { raw::grid(ptr, shape) },
            ghosts,
            kind,
            direction,
        }
    }

    /// Quantity held by this grid.
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Component held by this grid.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Cells per axis, including any ghosts still present.
    pub fn shape(&self) -> [usize; 3] {
        let s = self.data.shape();
        [s[0], s[1], s[2]]
    }

    /// Ghost cells per side still present in this view.
    pub fn ghosts(&self) -> usize {
        self.ghosts
    }

    /// Total number of cells in the view.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether any axis has zero length.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Value at `[i, j, k]`.
    pub fn get(&self, index: [usize; 3]) -> Option<f64> {
        self.data.get(index).map(Cell::get)
    }

    /// Overwrite `[i, j, k]`.
    ///
    /// # Panics
    ///
    /// If the index is outside [`shape`](Self::shape).
    pub fn set(&self, index: [usize; 3], value: f64) {
        self.data[index].set(value);
    }

    /// Overwrite every cell in the view.
    pub fn fill(&self, value: f64) {
        self.data.iter().for_each(|c| c.set(value));
    }

    /// The same buffer with the ghost layer removed from both ends of
    /// every axis.
    ///
    /// With zero ghosts this returns the view unchanged. Fails if an axis
    /// is shorter than twice the ghost count.
    pub fn interior(&self) -> Result<GridView<'a>, BindingError> {
        let g = self.ghosts;
        if g == 0 {
            return Ok(self.clone());
        }
        let [nx, ny, nz] = self.shape();
        if nx < 2 * g || ny < 2 * g || nz < 2 * g {
            return Err(BindingError::GhostsExceedGrid {
                ghosts: g,
                shape: [nx, ny, nz],
            });
        }
        let data = self
            .data
            .clone()
            .slice_move(s![g..nx - g, g..ny - g, g..nz - g]);
        Ok(GridView {
            data,
            ghosts: 0,
            kind: self.kind,
            direction: self.direction,
        })
    }

    /// Copy the current values into an owned array.
    pub fn to_owned_array(&self) -> Array3<f64> {
        self.data.map(Cell::get)
    }

    /// The ndarray view, for slicing and iteration.
    pub fn as_array(&self) -> &ArrayView3<'a, Cell<f64>> {
        &self.data
    }

    /// Address of element `[0, 0, 0]` of this view.
    pub fn as_ptr(&self) -> *mut f64 {
        self.data.as_ptr().cast::<f64>().cast_mut()
    }

    /// Element strides per axis.
    pub fn strides(&self) -> [isize; 3] {
        let s = self.data.strides();
        [s[0], s[1], s[2]]
    }
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn linear(shape: [usize; 3]) -> Vec<f64> {
        (0..shape.iter().product::<usize>()).map(|i| i as f64).collect()
    }

    #[test]
    fn layout_is_c_order() {
        let shape = [2, 3, 4];
        let mut buf = linear(shape);
        // SAFETY: buf holds 24 values and outlives the view.
        let v = unsafe {
            GridView::from_raw(buf.as_mut_ptr(), shape, 0, FieldKind::Electric, Direction::X)
        };
        assert_eq!(v.get([0, 0, 1]), Some(1.0));
        assert_eq!(v.get([0, 1, 0]), Some(4.0));
        assert_eq!(v.get([1, 0, 0]), Some(12.0));
        assert_eq!(v.strides(), [12, 4, 1]);
    }

    #[test]
    fn zero_ghosts_interior_is_the_full_view() {
        let shape = [3, 3, 3];
        let mut buf = linear(shape);
        // SAFETY: as above.
        let v = unsafe {
            GridView::from_raw(buf.as_mut_ptr(), shape, 0, FieldKind::Magnetic, Direction::Z)
        };
        let inner = v.interior().unwrap();
        assert_eq!(inner.shape(), shape);
        assert_eq!(inner.to_owned_array(), v.to_owned_array());
    }

    #[test]
    fn too_many_ghosts_is_an_error() {
        let shape = [3, 8, 8];
        let mut buf = linear(shape);
        // SAFETY: as above.
        let v = unsafe {
            GridView::from_raw(buf.as_mut_ptr(), shape, 2, FieldKind::Electric, Direction::X)
        };
        assert_eq!(
            v.interior().unwrap_err(),
            BindingError::GhostsExceedGrid {
                ghosts: 2,
                shape: [3, 8, 8]
            }
        );
    }

    #[test]
    fn exact_fit_leaves_an_empty_interior() {
        let shape = [4, 4, 4];
        let mut buf = linear(shape);
        // SAFETY: as above.
        let v = unsafe {
            GridView::from_raw(buf.as_mut_ptr(), shape, 2, FieldKind::Electric, Direction::X)
        };
        let inner = v.interior().unwrap();
        assert_eq!(inner.shape(), [0, 0, 0]);
        assert!(inner.is_empty());
    }

    #[test]
    fn interior_writes_reach_the_full_buffer() {
        let shape = [5, 5, 5];
        let mut buf = linear(shape);
        {
            // SAFETY: as above.
            let v = unsafe {
                GridView::from_raw(
                    buf.as_mut_ptr(),
                    shape,
                    1,
                    FieldKind::CurrentDensity,
                    Direction::Y,
                )
            };
            let inner = v.interior().unwrap();
            inner.fill(-1.0);
            assert_eq!(v.get([1, 1, 1]), Some(-1.0));
            assert_eq!(v.get([0, 0, 0]), Some(0.0));
            assert_eq!(v.get([4, 4, 4]), Some(124.0));
        }
        assert_eq!(buf[25 + 5 + 1], -1.0);
    }

    proptest! {
        #[test]
        fn interior_shape_and_origin(
            g in 0usize..4,
            ex in 0usize..5,
            ey in 0usize..5,
            ez in 0usize..5,
        ) {
            let shape = [2 * g + ex, 2 * g + ey, 2 * g + ez];
            let mut buf = linear(shape);
            // SAFETY: buf matches shape and outlives both views.
            let full = unsafe {
                GridView::from_raw(buf.as_mut_ptr(), shape, g, FieldKind::Electric, Direction::X)
            };
            let inner = full.interior().unwrap();
            prop_assert_eq!(inner.shape(), [ex, ey, ez]);
            prop_assert_eq!(inner.ghosts(), 0);
            if ex > 0 && ey > 0 && ez > 0 {
                prop_assert_eq!(inner.get([0, 0, 0]), full.get([g, g, g]));
                prop_assert_eq!(
                    inner.get([ex - 1, ey - 1, ez - 1]),
                    full.get([g + ex - 1, g + ey - 1, g + ez - 1])
                );
            }
        }
    }
}
