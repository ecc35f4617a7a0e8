//! Particle injection and zero-copy particle retrieval.

use std::ffi::{c_double, c_int};
use std::ptr;

use log::debug;
use ndarray::{aview2, ArrayView2};
use warpx_core::{BindingError, ParticleComponent, ParticleRecord, SpeciesId};
use warpx_ffi::{EngineArray, FreeFn};
use warpx_view::{ParticleColumn, ParticleTile, ScalarTile};

use crate::simulation::{engine_count, Simulation};

// ── ParticleBatch ──────────────────────────────────────────────────

/// Particles to inject into one species.
///
/// Six equal-length position/momentum sequences plus a row-per-particle
/// attribute table. Attribute column meaning (weight first, by engine
/// convention) is engine-defined.
#[derive(Clone, Debug)]
pub struct ParticleBatch<'a> {
    /// Positions, x.
    pub x: &'a [f64],
    /// Positions, y.
    pub y: &'a [f64],
    /// Positions, z.
    pub z: &'a [f64],
    /// Momenta, x.
    pub ux: &'a [f64],
    /// Momenta, y.
    pub uy: &'a [f64],
    /// Momenta, z.
    pub uz: &'a [f64],
    /// Per-particle attributes, shape `(particles, attribute_count)`.
    pub attributes: ArrayView2<'a, f64>,
    /// `true` if every process injects distinct particles; `false` if the
    /// same particles are supplied on several processes and the engine
    /// should keep only the ones it owns.
    pub unique_particles: bool,
}

impl<'a> ParticleBatch<'a> {
    /// Batch with no attribute columns.
    pub fn new(
        x: &'a [f64],
        y: &'a [f64],
        z: &'a [f64],
        ux: &'a [f64],
        uy: &'a [f64],
        uz: &'a [f64],
    ) -> Self {
        Self {
            x,
            y,
            z,
            ux,
            uy,
            uz,
            attributes: aview2::<f64, 0>(&[]),
            unique_particles: false,
        }
    }

    /// Replace the attribute table.
    pub fn with_attributes(mut self, attributes: ArrayView2<'a, f64>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Set whether particles are unique to this process.
    pub fn unique(mut self, unique_particles: bool) -> Self {
        self.unique_particles = unique_particles;
        self
    }

    /// Particle count, taken from `x`.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Attribute columns per particle.
    pub fn attribute_count(&self) -> usize {
        self.attributes.ncols()
    }

    /// Check that every sequence matches `x` and counts fit a C `int`.
    pub fn validate(&self) -> Result<(), BindingError> {
        let n = self.x.len();
        let columns = [
            ("y", self.y),
            ("z", self.z),
            ("ux", self.ux),
            ("uy", self.uy),
            ("uz", self.uz),
        ];
        for (what, seq) in columns {
            if seq.len() != n {
                return Err(BindingError::LengthMismatch {
                    what,
                    expected: n,
                    actual: seq.len(),
                });
            }
        }
        // A table with no columns carries nothing; its row count is moot.
        if self.attribute_count() > 0 && self.attributes.nrows() != n {
            return Err(BindingError::LengthMismatch {
                what: "attribute rows",
                expected: n,
                actual: self.attributes.nrows(),
            });
        }
        if c_int::try_from(n).is_err() || c_int::try_from(self.attribute_count()).is_err() {
            return Err(BindingError::InvalidArgument {
                reason: format!(
                    "{n} particles x {} attributes exceed the C int range",
                    self.attribute_count()
                ),
            });
        }
        Ok(())
    }
}

// ── Per-call tile bookkeeping ──────────────────────────────────────

/// The pointer table and per-tile counts returned by a particle accessor.
///
/// Both arrays are adopted before anything is checked, so they are
/// released on every return path. The tile buffers they describe are not.
struct TileTable<T> {
    pointers: EngineArray<*mut T>,
    counts: EngineArray<c_int>,
}

impl<T> TileTable<T> {
    /// # Safety
    ///
    /// `pointers` and `counts` must be as returned by the engine alongside
    /// `num_tiles`, allocated for release with `free`.
    #[allow(unsafe_code)]
    unsafe fn adopt(
        free: FreeFn,
        pointers: *mut *mut T,
        counts: *mut c_int,
        num_tiles: c_int,
    ) -> Result<Self, BindingError> {
        let n = usize::try_from(num_tiles).unwrap_or(0);
        // SAFETY: forwarded contract.
        let table = unsafe {
            Self {
                pointers: EngineArray::adopt(pointers, n, free),
                counts: EngineArray::adopt(counts, n, free),
            }
        };
        engine_count("tile count", num_tiles)?;
        if n > 0 && table.pointers.is_null() {
            return Err(BindingError::NullPointer {
                what: "tile pointer table",
            });
        }
        if n > 0 && table.counts.is_null() {
            return Err(BindingError::NullPointer {
                what: "per-tile particle counts",
            });
        }
        Ok(table)
    }

    /// `(buffer, particle count)` per tile, in engine order.
    fn tiles(&self) -> Result<Vec<(*mut T, usize)>, BindingError> {
        self.pointers
            .as_slice()
            .iter()
            .zip(self.counts.as_slice())
            .map(|(&ptr, &count)| -> Result<(*mut T, usize), BindingError> {
                let len = engine_count("tile particle count", count)?;
                if len > 0 && ptr.is_null() {
                    return Err(BindingError::NullPointer { what: "tile buffer" });
                }
                Ok((ptr, len))
            })
            .collect()
    }
}

// ── Injection and retrieval ────────────────────────────────────────

impl Simulation {
    /// Inject `batch` into `species`.
    ///
    /// Lengths are always checked before the engine is called. The
    /// attribute table is copied into row-major order first if it is not
    /// already C-contiguous.
    #[allow(unsafe_code)]
    pub fn add_particles(
        &mut self,
        species: SpeciesId,
        batch: &ParticleBatch<'_>,
    ) -> Result<(), BindingError> {
        self.check_species(species)?;
        batch.validate()?;
        let attributes = batch.attributes.as_standard_layout();
        // Both fit in c_int per `validate`.
        let n = batch.len() as c_int;
        let n_attr = attributes.ncols() as c_int;
        debug!(
            "adding {n} particle(s) with {n_attr} attribute(s) to species {species} (unique: {})",
            batch.unique_particles
        );
        // SAFETY: each of the six slices holds exactly `n` values and
        // `attributes` is a row-major block of `n * n_attr` values; all
        // outlive the call and the engine only reads them.
        unsafe {
            self.add_particles_unchecked(
                species,
                n,
                [
                    batch.x.as_ptr(),
                    batch.y.as_ptr(),
                    batch.z.as_ptr(),
                    batch.ux.as_ptr(),
                    batch.uy.as_ptr(),
                    batch.uz.as_ptr(),
                ],
                n_attr,
                attributes.as_ptr(),
                batch.unique_particles,
            );
        }
        Ok(())
    }

    /// Forward an injection to the engine verbatim.
    ///
    /// `columns` is `[x, y, z, ux, uy, uz]`.
    ///
    /// # Safety
    ///
    /// Each column must point to at least `count` readable `f64`, and
    /// `attributes` to `count * attribute_count` row-major `f64`. Nothing
    /// is checked.
    #[allow(unsafe_code)]
    pub unsafe fn add_particles_unchecked(
        &mut self,
        species: SpeciesId,
        count: c_int,
        columns: [*const c_double; 6],
        attribute_count: c_int,
        attributes: *const c_double,
        unique_particles: bool,
    ) {
        let [x, y, z, ux, uy, uz] = columns;
        // SAFETY: forwarded contract.
        unsafe {
            (self.table().add_particles)(
                species.0,
                count,
                x,
                y,
                z,
                ux,
                uy,
                uz,
                attribute_count,
                attributes,
                c_int::from(unique_particles),
            );
        }
    }

    /// Record views over every tile of `species`, in engine tile order.
    ///
    /// A species with no tiles yields an empty vector.
    #[allow(unsafe_code)]
    pub fn particle_structs(
        &self,
        species: SpeciesId,
    ) -> Result<Vec<ParticleTile<'_>>, BindingError> {
        self.check_species(species)?;
        let table = self.table();
        let mut num_tiles: c_int = 0;
        let mut counts: *mut c_int = ptr::null_mut();
        // SAFETY: both out-parameters point to live locals.
        let pointers =
            unsafe { (table.get_particle_structs)(species.0, &mut num_tiles, &mut counts) };
        // SAFETY: engine contract for this export.
        let tiles =
            unsafe { TileTable::<ParticleRecord>::adopt(table.free, pointers, counts, num_tiles)? };
        let views: Vec<ParticleTile<'_>> = tiles
            .tiles()?
            .into_iter()
            // SAFETY: each buffer holds `len` records owned by the engine;
            // it stays put until a `&mut self` call, which the returned
            // borrow of `self` rules out.
            .map(|(ptr, len)| unsafe { ParticleTile::from_raw(ptr, len) })
            .collect();
        debug!(
            "species {species}: {} tile(s), {} particle(s)",
            views.len(),
            views.iter().map(ParticleTile::len).sum::<usize>()
        );
        Ok(views)
    }

    /// Scalar views of `component` over every tile of `species`.
    ///
    /// A species with no tiles yields an empty vector.
    #[allow(unsafe_code)]
    pub fn particle_arrays(
        &self,
        species: SpeciesId,
        component: ParticleComponent,
    ) -> Result<Vec<ScalarTile<'_>>, BindingError> {
        self.check_species(species)?;
        let table = self.table();
        let mut num_tiles: c_int = 0;
        let mut counts: *mut c_int = ptr::null_mut();
        // SAFETY: both out-parameters point to live locals.
        let pointers = unsafe {
            (table.get_particle_arrays)(species.0, component.index(), &mut num_tiles, &mut counts)
        };
        // SAFETY: engine contract for this export.
        let tiles =
            unsafe { TileTable::<c_double>::adopt(table.free, pointers, counts, num_tiles)? };
        let views: Vec<ScalarTile<'_>> = tiles
            .tiles()?
            .into_iter()
            // SAFETY: as in `particle_structs`.
            .map(|(ptr, len)| unsafe { ScalarTile::from_raw(ptr, len, component) })
            .collect();
        debug!(
            "species {species} component {component}: {} tile(s)",
            views.len()
        );
        Ok(views)
    }

    /// Position x per tile, projected from [`particle_structs`](Self::particle_structs).
    pub fn particle_x(
        &self,
        species: SpeciesId,
    ) -> Result<Vec<ParticleColumn<'_, f64>>, BindingError> {
        Ok(self.particle_structs(species)?.iter().map(|t| t.x()).collect())
    }

    /// Position y per tile.
    pub fn particle_y(
        &self,
        species: SpeciesId,
    ) -> Result<Vec<ParticleColumn<'_, f64>>, BindingError> {
        Ok(self.particle_structs(species)?.iter().map(|t| t.y()).collect())
    }

    /// Position z per tile.
    pub fn particle_z(
        &self,
        species: SpeciesId,
    ) -> Result<Vec<ParticleColumn<'_, f64>>, BindingError> {
        Ok(self.particle_structs(species)?.iter().map(|t| t.z()).collect())
    }

    /// Particle id per tile.
    pub fn particle_id(
        &self,
        species: SpeciesId,
    ) -> Result<Vec<ParticleColumn<'_, i32>>, BindingError> {
        Ok(self.particle_structs(species)?.iter().map(|t| t.id()).collect())
    }

    /// Owning process per tile.
    pub fn particle_cpu(
        &self,
        species: SpeciesId,
    ) -> Result<Vec<ParticleColumn<'_, i32>>, BindingError> {
        Ok(self.particle_structs(species)?.iter().map(|t| t.cpu()).collect())
    }

    /// Weight per tile.
    pub fn particle_weight(&self, species: SpeciesId) -> Result<Vec<ScalarTile<'_>>, BindingError> {
        self.particle_arrays(species, ParticleComponent::Weight)
    }

    /// Momentum x per tile.
    pub fn particle_ux(&self, species: SpeciesId) -> Result<Vec<ScalarTile<'_>>, BindingError> {
        self.particle_arrays(species, ParticleComponent::Ux)
    }

    /// Momentum y per tile.
    pub fn particle_uy(&self, species: SpeciesId) -> Result<Vec<ScalarTile<'_>>, BindingError> {
        self.particle_arrays(species, ParticleComponent::Uy)
    }

    /// Momentum z per tile.
    pub fn particle_uz(&self, species: SpeciesId) -> Result<Vec<ScalarTile<'_>>, BindingError> {
        self.particle_arrays(species, ParticleComponent::Uz)
    }

    /// Gathered electric field x per tile.
    pub fn particle_ex(&self, species: SpeciesId) -> Result<Vec<ScalarTile<'_>>, BindingError> {
        self.particle_arrays(species, ParticleComponent::Ex)
    }

    /// Gathered electric field y per tile.
    pub fn particle_ey(&self, species: SpeciesId) -> Result<Vec<ScalarTile<'_>>, BindingError> {
        self.particle_arrays(species, ParticleComponent::Ey)
    }

    /// Gathered electric field z per tile.
    pub fn particle_ez(&self, species: SpeciesId) -> Result<Vec<ScalarTile<'_>>, BindingError> {
        self.particle_arrays(species, ParticleComponent::Ez)
    }

    /// Gathered magnetic field x per tile.
    pub fn particle_bx(&self, species: SpeciesId) -> Result<Vec<ScalarTile<'_>>, BindingError> {
        self.particle_arrays(species, ParticleComponent::Bx)
    }

    /// Gathered magnetic field y per tile.
    pub fn particle_by(&self, species: SpeciesId) -> Result<Vec<ScalarTile<'_>>, BindingError> {
        self.particle_arrays(species, ParticleComponent::By)
    }

    /// Gathered magnetic field z per tile.
    pub fn particle_bz(&self, species: SpeciesId) -> Result<Vec<ScalarTile<'_>>, BindingError> {
        self.particle_arrays(species, ParticleComponent::Bz)
    }
}
