//! Simulation: Python wrapper around the initialized engine.
//!
//! The engine is single-threaded and documents no thread-safety, so the
//! class is `unsendable` and engine calls run with the GIL held.

use std::borrow::Cow;
use std::path::PathBuf;

use numpy::{PyReadonlyArray1, PyReadonlyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use warpx_core::{Direction, FieldKind, Level, ParticleComponent, SpeciesId};
use warpx_engine::{BindingConfig, ParticleBatch, ValidationMode};

use crate::arrays;
use crate::error::to_py;

/// An initialized WarpX engine.
///
/// Constructing one loads the engine library and calls `amrex_init` with
/// `argv` (defaulting to `sys.argv`). The engine library can be
/// initialized once per process; a second construction raises
/// `RuntimeError`. Arrays returned by the accessors share memory with the
/// engine and are writable; they are only valid until the next injection,
/// evolve, push, boundary fill or clock update.
#[pyclass(unsendable, module = "warpx._warpx")]
pub(crate) struct Simulation {
    inner: warpx_engine::Simulation,
}

fn direction(index: i32) -> PyResult<Direction> {
    Direction::from_index(index).ok_or_else(|| {
        PyValueError::new_err(format!("direction must be 0, 1 or 2, got {index}"))
    })
}

fn component(index: i32) -> PyResult<ParticleComponent> {
    ParticleComponent::from_index(index).ok_or_else(|| {
        PyValueError::new_err(format!("component index must be in 0..=9, got {index}"))
    })
}

/// Borrow a contiguous array, copying only if NumPy gave us a strided one.
fn column<'a>(array: &'a PyReadonlyArray1<'_, f64>) -> Cow<'a, [f64]> {
    match array.as_slice() {
        Ok(slice) => Cow::Borrowed(slice),
        Err(_) => Cow::Owned(array.as_array().to_vec()),
    }
}

impl Simulation {
    fn scalar_tiles<'py>(
        &self,
        py: Python<'py>,
        species: i32,
        component: ParticleComponent,
    ) -> PyResult<Vec<Bound<'py, PyAny>>> {
        let tiles = self
            .inner
            .particle_arrays(SpeciesId(species), component)
            .map_err(to_py)?;
        tiles.iter().map(|t| arrays::scalar_tile(py, t)).collect()
    }

    fn struct_field<'py>(
        &self,
        py: Python<'py>,
        species: i32,
        field: &str,
    ) -> PyResult<Vec<Bound<'py, PyAny>>> {
        self.get_particle_structs(py, species)?
            .iter()
            .map(|a| a.get_item(field))
            .collect()
    }

    fn mesh<'py>(
        &self,
        py: Python<'py>,
        kind: FieldKind,
        level: i32,
        dir: i32,
        include_ghosts: bool,
    ) -> PyResult<Vec<Bound<'py, PyAny>>> {
        let grids = self
            .inner
            .mesh_data(kind, Level(level), direction(dir)?, include_ghosts)
            .map_err(to_py)?;
        grids.iter().map(|g| arrays::grid(py, g)).collect()
    }
}

#[pymethods]
impl Simulation {
    /// Load the engine and initialize it.
    ///
    /// Args:
    ///     argv: Command-line-style arguments; defaults to `sys.argv`.
    ///     library: Path to the engine library. Defaults to
    ///         `$WARPX_LIBRARY`, then `libwarpx.so` beside the executable,
    ///         then the dynamic loader's search path.
    ///     validation: "defensive" (check levels and species before
    ///         forwarding) or "pass-through".
    #[new]
    #[pyo3(signature = (argv=None, library=None, validation="defensive"))]
    fn new(
        py: Python<'_>,
        argv: Option<Vec<String>>,
        library: Option<PathBuf>,
        validation: &str,
    ) -> PyResult<Self> {
        let mode = ValidationMode::parse(validation).ok_or_else(|| {
            PyValueError::new_err(format!(
                "validation must be 'defensive' or 'pass-through', got '{validation}'"
            ))
        })?;
        let argv = match argv {
            Some(a) => a,
            None => py.import("sys")?.getattr("argv")?.extract()?,
        };
        let config = BindingConfig {
            library_path: library,
            validation: mode,
        };
        let inner = warpx_engine::Simulation::load(config, &argv).map_err(to_py)?;
        Ok(Self { inner })
    }

    /// Validation mode in effect: "defensive" or "pass-through".
    #[getter]
    fn validation(&self) -> &'static str {
        match self.inner.config().validation {
            ValidationMode::Defensive => "defensive",
            ValidationMode::PassThrough => "pass-through",
        }
    }

    // ── Particles ──────────────────────────────────────────────────

    /// Add particles to a species.
    ///
    /// Args:
    ///     species_number: Species to add to.
    ///     x, y, z: Particle positions (float64, equal length).
    ///     ux, uy, uz: Particle momenta (float64, same length).
    ///     attr: 2D float64 array, one row per particle; column 0 is the
    ///         weight by engine convention. Omit for no attributes.
    ///     unique_particles: True if every process passes distinct
    ///         particles, False if the same particles are passed on
    ///         several processes.
    #[pyo3(signature = (species_number, x, y, z, ux, uy, uz, attr=None, unique_particles=false))]
    #[allow(clippy::too_many_arguments)]
    fn add_particles(
        &mut self,
        species_number: i32,
        x: PyReadonlyArray1<'_, f64>,
        y: PyReadonlyArray1<'_, f64>,
        z: PyReadonlyArray1<'_, f64>,
        ux: PyReadonlyArray1<'_, f64>,
        uy: PyReadonlyArray1<'_, f64>,
        uz: PyReadonlyArray1<'_, f64>,
        attr: Option<PyReadonlyArray2<'_, f64>>,
        unique_particles: bool,
    ) -> PyResult<()> {
        let (x, y, z) = (column(&x), column(&y), column(&z));
        let (ux, uy, uz) = (column(&ux), column(&uy), column(&uz));
        let mut batch = ParticleBatch::new(&x, &y, &z, &ux, &uy, &uz).unique(unique_particles);
        if let Some(attr) = &attr {
            batch = batch.with_attributes(attr.as_array());
        }
        self.inner
            .add_particles(SpeciesId(species_number), &batch)
            .map_err(to_py)
    }

    /// Structured arrays (fields x, y, z, id, cpu), one per tile.
    fn get_particle_structs<'py>(
        &self,
        py: Python<'py>,
        species_number: i32,
    ) -> PyResult<Vec<Bound<'py, PyAny>>> {
        let tiles = self
            .inner
            .particle_structs(SpeciesId(species_number))
            .map_err(to_py)?;
        let dtype = arrays::particle_dtype(py)?;
        tiles
            .iter()
            .map(|t| arrays::particle_tile(py, t, &dtype))
            .collect()
    }

    /// Arrays of one scalar component (0 = weight, 1-3 = momenta, 4-6 = E,
    /// 7-9 = B), one per tile.
    fn get_particle_arrays<'py>(
        &self,
        py: Python<'py>,
        species_number: i32,
        comp: i32,
    ) -> PyResult<Vec<Bound<'py, PyAny>>> {
        self.scalar_tiles(py, species_number, component(comp)?)
    }

    /// Particle x positions, one strided view per tile.
    fn get_particle_x<'py>(
        &self,
        py: Python<'py>,
        species_number: i32,
    ) -> PyResult<Vec<Bound<'py, PyAny>>> {
        self.struct_field(py, species_number, "x")
    }

    /// Particle y positions, one strided view per tile.
    fn get_particle_y<'py>(
        &self,
        py: Python<'py>,
        species_number: i32,
    ) -> PyResult<Vec<Bound<'py, PyAny>>> {
        self.struct_field(py, species_number, "y")
    }

    /// Particle z positions, one strided view per tile.
    fn get_particle_z<'py>(
        &self,
        py: Python<'py>,
        species_number: i32,
    ) -> PyResult<Vec<Bound<'py, PyAny>>> {
        self.struct_field(py, species_number, "z")
    }

    /// Particle ids, one strided view per tile.
    fn get_particle_id<'py>(
        &self,
        py: Python<'py>,
        species_number: i32,
    ) -> PyResult<Vec<Bound<'py, PyAny>>> {
        self.struct_field(py, species_number, "id")
    }

    /// Owning process of each particle, one strided view per tile.
    fn get_particle_cpu<'py>(
        &self,
        py: Python<'py>,
        species_number: i32,
    ) -> PyResult<Vec<Bound<'py, PyAny>>> {
        self.struct_field(py, species_number, "cpu")
    }

    fn get_particle_weight<'py>(
        &self,
        py: Python<'py>,
        species_number: i32,
    ) -> PyResult<Vec<Bound<'py, PyAny>>> {
        self.scalar_tiles(py, species_number, ParticleComponent::Weight)
    }

    fn get_particle_ux<'py>(
        &self,
        py: Python<'py>,
        species_number: i32,
    ) -> PyResult<Vec<Bound<'py, PyAny>>> {
        self.scalar_tiles(py, species_number, ParticleComponent::Ux)
    }

    fn get_particle_uy<'py>(
        &self,
        py: Python<'py>,
        species_number: i32,
    ) -> PyResult<Vec<Bound<'py, PyAny>>> {
        self.scalar_tiles(py, species_number, ParticleComponent::Uy)
    }

    fn get_particle_uz<'py>(
        &self,
        py: Python<'py>,
        species_number: i32,
    ) -> PyResult<Vec<Bound<'py, PyAny>>> {
        self.scalar_tiles(py, species_number, ParticleComponent::Uz)
    }

    #[pyo3(name = "get_particle_Ex")]
    fn get_particle_ex<'py>(
        &self,
        py: Python<'py>,
        species_number: i32,
    ) -> PyResult<Vec<Bound<'py, PyAny>>> {
        self.scalar_tiles(py, species_number, ParticleComponent::Ex)
    }

    #[pyo3(name = "get_particle_Ey")]
    fn get_particle_ey<'py>(
        &self,
        py: Python<'py>,
        species_number: i32,
    ) -> PyResult<Vec<Bound<'py, PyAny>>> {
        self.scalar_tiles(py, species_number, ParticleComponent::Ey)
    }

    #[pyo3(name = "get_particle_Ez")]
    fn get_particle_ez<'py>(
        &self,
        py: Python<'py>,
        species_number: i32,
    ) -> PyResult<Vec<Bound<'py, PyAny>>> {
        self.scalar_tiles(py, species_number, ParticleComponent::Ez)
    }

    #[pyo3(name = "get_particle_Bx")]
    fn get_particle_bx<'py>(
        &self,
        py: Python<'py>,
        species_number: i32,
    ) -> PyResult<Vec<Bound<'py, PyAny>>> {
        self.scalar_tiles(py, species_number, ParticleComponent::Bx)
    }

    #[pyo3(name = "get_particle_By")]
    fn get_particle_by<'py>(
        &self,
        py: Python<'py>,
        species_number: i32,
    ) -> PyResult<Vec<Bound<'py, PyAny>>> {
        self.scalar_tiles(py, species_number, ParticleComponent::By)
    }

    #[pyo3(name = "get_particle_Bz")]
    fn get_particle_bz<'py>(
        &self,
        py: Python<'py>,
        species_number: i32,
    ) -> PyResult<Vec<Bound<'py, PyAny>>> {
        self.scalar_tiles(py, species_number, ParticleComponent::Bz)
    }

    // ── Mesh ───────────────────────────────────────────────────────

    /// Electric field component `direction` (0, 1, 2) at `level`, one 3D
    /// array per grid.
    #[pyo3(signature = (level, direction, include_ghosts=true))]
    fn get_mesh_electric_field<'py>(
        &self,
        py: Python<'py>,
        level: i32,
        direction: i32,
        include_ghosts: bool,
    ) -> PyResult<Vec<Bound<'py, PyAny>>> {
        self.mesh(py, FieldKind::Electric, level, direction, include_ghosts)
    }

    /// Magnetic field component `direction` at `level`, one 3D array per
    /// grid.
    #[pyo3(signature = (level, direction, include_ghosts=true))]
    fn get_mesh_magnetic_field<'py>(
        &self,
        py: Python<'py>,
        level: i32,
        direction: i32,
        include_ghosts: bool,
    ) -> PyResult<Vec<Bound<'py, PyAny>>> {
        self.mesh(py, FieldKind::Magnetic, level, direction, include_ghosts)
    }

    /// Current density component `direction` at `level`, one 3D array per
    /// grid.
    #[pyo3(signature = (level, direction, include_ghosts=true))]
    fn get_mesh_current_density<'py>(
        &self,
        py: Python<'py>,
        level: i32,
        direction: i32,
        include_ghosts: bool,
    ) -> PyResult<Vec<Bound<'py, PyAny>>> {
        self.mesh(py, FieldKind::CurrentDensity, level, direction, include_ghosts)
    }

    // ── Clocks and run control ─────────────────────────────────────

    fn current_step(&self, level: i32) -> PyResult<i32> {
        self.inner.current_step(Level(level)).map_err(to_py)
    }

    fn set_current_step(&mut self, level: i32, step: i32) -> PyResult<()> {
        self.inner.set_current_step(Level(level), step).map_err(to_py)
    }

    fn time(&self, level: i32) -> PyResult<f64> {
        self.inner.time(Level(level)).map_err(to_py)
    }

    fn set_time(&mut self, level: i32, time: f64) -> PyResult<()> {
        self.inner.set_time(Level(level), time).map_err(to_py)
    }

    fn dt(&self, level: i32) -> PyResult<f64> {
        self.inner.dt(Level(level)).map_err(to_py)
    }

    #[getter]
    fn max_steps(&self) -> i32 {
        self.inner.max_steps()
    }

    #[getter]
    fn stop_time(&self) -> f64 {
        self.inner.stop_time()
    }

    #[getter]
    fn check_interval(&self) -> i32 {
        self.inner.check_interval()
    }

    #[getter]
    fn plot_interval(&self) -> i32 {
        self.inner.plot_interval()
    }

    #[getter]
    fn finest_level(&self) -> i32 {
        self.inner.finest_level()
    }

    // ── Solver ─────────────────────────────────────────────────────

    fn evolve_e(&mut self, level: i32, dt: f64) -> PyResult<()> {
        self.inner.evolve_e(Level(level), dt).map_err(to_py)
    }

    fn evolve_b(&mut self, level: i32, dt: f64) -> PyResult<()> {
        self.inner.evolve_b(Level(level), dt).map_err(to_py)
    }

    #[pyo3(signature = (level, force=false))]
    fn fill_boundary_e(&mut self, level: i32, force: bool) -> PyResult<()> {
        self.inner.fill_boundary_e(Level(level), force).map_err(to_py)
    }

    #[pyo3(signature = (level, force=false))]
    fn fill_boundary_b(&mut self, level: i32, force: bool) -> PyResult<()> {
        self.inner.fill_boundary_b(Level(level), force).map_err(to_py)
    }

    fn push_particles_and_deposit(&mut self, level: i32, dt: f64) -> PyResult<()> {
        self.inner
            .push_particles_and_deposit(Level(level), dt)
            .map_err(to_py)
    }

    fn __repr__(&self) -> String {
        format!(
            "Simulation(finest_level={}, validation='{}')",
            self.inner.finest_level(),
            self.validation()
        )
    }
}
