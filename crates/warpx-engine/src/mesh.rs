//! Zero-copy mesh field and current-density retrieval.

use std::ffi::{c_double, c_int};
use std::ptr;

use log::debug;
use warpx_core::{BindingError, Direction, FieldKind, Level};
use warpx_ffi::EngineArray;
use warpx_view::GridView;

use crate::simulation::{engine_count, Simulation};

impl Simulation {
    /// One view per grid of `kind`'s `direction` component at `level`.
    ///
    /// With `include_ghosts` false every view is narrowed to the grid
    /// interior; the buffers are the same either way. A level with no
    /// grids yields an empty vector.
    #[allow(unsafe_code)]
    pub fn mesh_data(
        &self,
        kind: FieldKind,
        level: Level,
        direction: Direction,
        include_ghosts: bool,
    ) -> Result<Vec<GridView<'_>>, BindingError> {
        self.check_level(level)?;
        let table = self.table();
        let getter = match kind {
            FieldKind::Electric => table.get_e_field,
            FieldKind::Magnetic => table.get_b_field,
            FieldKind::CurrentDensity => table.get_current_density,
        };

        let mut num_grids: c_int = 0;
        let mut ngrow: c_int = 0;
        let mut shapes: *mut c_int = ptr::null_mut();
        // SAFETY: every out-parameter points to a live local.
        let pointers = unsafe {
            getter(
                level.0,
                direction.index(),
                &mut num_grids,
                &mut ngrow,
                &mut shapes,
            )
        };
        let n = usize::try_from(num_grids).unwrap_or(0);
        // SAFETY: the engine returns `num_grids` grid pointers and
        // `3 * num_grids` extents, both allocated for release with the
        // table's `free`. Adopted before any check so every path releases
        // them.
        let (pointers, shapes) = unsafe {
            (
                EngineArray::<*mut c_double>::adopt(pointers, n, table.free),
                EngineArray::<c_int>::adopt(shapes, 3 * n, table.free),
            )
        };

        engine_count("grid count", num_grids)?;
        let ghosts = engine_count("ghost count", ngrow)?;
        if n > 0 && pointers.is_null() {
            return Err(BindingError::NullPointer {
                what: "grid pointer table",
            });
        }
        if n > 0 && shapes.is_null() {
            return Err(BindingError::NullPointer {
                what: "grid shape array",
            });
        }

        let mut views = Vec::with_capacity(n);
        for (&data, extents) in pointers.as_slice().iter().zip(shapes.as_slice().chunks_exact(3)) {
            let shape = [
                engine_count("grid extent", extents[0])?,
                engine_count("grid extent", extents[1])?,
                engine_count("grid extent", extents[2])?,
            ];
            let cells = shape[0]
                .checked_mul(shape[1])
                .and_then(|c| c.checked_mul(shape[2]))
                .ok_or(BindingError::GridTooLarge { shape })?;
            if data.is_null() && cells > 0 {
                return Err(BindingError::NullPointer { what: "grid buffer" });
            }
            // SAFETY: the engine owns a C-order buffer of `shape` doubles
            // per grid that stays put until a `&mut self` call, which the
            // returned borrow of `self` rules out.
            let full = unsafe { GridView::from_raw(data, shape, ghosts, kind, direction) };
            views.push(if include_ghosts {
                full
            } else {
                full.interior()?
            });
        }
        debug!(
            "{kind}{direction} at level {level}: {} grid(s), {ghosts} ghost cell(s){}",
            views.len(),
            if include_ghosts { "" } else { " stripped" }
        );
        Ok(views)
    }

    /// Electric field component `direction` at `level`, one view per grid.
    pub fn mesh_electric_field(
        &self,
        level: Level,
        direction: Direction,
        include_ghosts: bool,
    ) -> Result<Vec<GridView<'_>>, BindingError> {
        self.mesh_data(FieldKind::Electric, level, direction, include_ghosts)
    }

    /// Magnetic field component `direction` at `level`, one view per grid.
    pub fn mesh_magnetic_field(
        &self,
        level: Level,
        direction: Direction,
        include_ghosts: bool,
    ) -> Result<Vec<GridView<'_>>, BindingError> {
        self.mesh_data(FieldKind::Magnetic, level, direction, include_ghosts)
    }

    /// Current density component `direction` at `level`, one view per grid.
    pub fn mesh_current_density(
        &self,
        level: Level,
        direction: Direction,
        include_ghosts: bool,
    ) -> Result<Vec<GridView<'_>>, BindingError> {
        self.mesh_data(FieldKind::CurrentDensity, level, direction, include_ghosts)
    }
}
