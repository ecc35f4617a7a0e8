//! The engine's exported routines as a table of C function pointers.
//!
//! [`EngineTable`] is a flat, `Copy` table with one field per export.
//! [`EngineApi`] pairs a table with the [`Library`] it was resolved from,
//! so the function pointers can never outlive the mapped code. A table may
//! also be built from in-process functions (see
//! [`EngineApi::from_table`]), which is how the mock engine plugs in.

use std::ffi::{c_char, c_double, c_int};
use std::fmt;
use std::path::{Path, PathBuf};

use libloading::Library;
use log::{debug, info};
use warpx_core::{LoadError, ParticleRecord};

use crate::symbols;

/// Release routine for engine-allocated bookkeeping arrays.
pub type FreeFn = unsafe extern "C" fn(*mut libc::c_void);

/// `void amrex_init(int argc, char** argv)`
pub type InitFn = unsafe extern "C" fn(c_int, *mut *mut c_char);
/// `int f(int lev)`
pub type LevelIntFn = unsafe extern "C" fn(c_int) -> c_int;
/// `void f(int lev, int value)`
pub type SetLevelIntFn = unsafe extern "C" fn(c_int, c_int);
/// `double f(int lev)`
pub type LevelRealFn = unsafe extern "C" fn(c_int) -> c_double;
/// `void f(int lev, double value)`
pub type SetLevelRealFn = unsafe extern "C" fn(c_int, c_double);
/// `int f(void)`
pub type IntFn = unsafe extern "C" fn() -> c_int;
/// `double f(void)`
pub type RealFn = unsafe extern "C" fn() -> c_double;
/// `void f(int lev, double dt)`
pub type AdvanceFn = unsafe extern "C" fn(c_int, c_double);
/// `void f(int lev, bool force)`
pub type FillBoundaryFn = unsafe extern "C" fn(c_int, bool);

/// `void addNParticles(int species, int n, double* x, double* y, double* z,
/// double* ux, double* uy, double* uz, int nattr, double* attr, int unique)`
pub type AddParticlesFn = unsafe extern "C" fn(
    c_int,
    c_int,
    *const c_double,
    *const c_double,
    *const c_double,
    *const c_double,
    *const c_double,
    *const c_double,
    c_int,
    *const c_double,
    c_int,
);

/// `ParticleRecord** warpx_getParticleStructs(int species, int* num_tiles,
/// int** particles_per_tile)`
pub type ParticleStructsFn =
    unsafe extern "C" fn(c_int, *mut c_int, *mut *mut c_int) -> *mut *mut ParticleRecord;

/// `double** warpx_getParticleArrays(int species, int comp, int* num_tiles,
/// int** particles_per_tile)`
pub type ParticleArraysFn =
    unsafe extern "C" fn(c_int, c_int, *mut c_int, *mut *mut c_int) -> *mut *mut c_double;

/// `double** f(int lev, int direction, int* num_grids, int* ngrow,
/// int** shapes)`
pub type MeshDataFn = unsafe extern "C" fn(
    c_int,
    c_int,
    *mut c_int,
    *mut c_int,
    *mut *mut c_int,
) -> *mut *mut c_double;

/// One function pointer per engine export, plus the release routine for
/// bookkeeping arrays.
#[derive(Clone, Copy)]
pub struct EngineTable {
    /// `amrex_init`
    pub init: InitFn,
    /// `warpx_getistep`
    pub get_istep: LevelIntFn,
    /// `warpx_setistep`
    pub set_istep: SetLevelIntFn,
    /// `warpx_gett_new`
    pub get_t_new: LevelRealFn,
    /// `warpx_sett_new`
    pub set_t_new: SetLevelRealFn,
    /// `warpx_getdt`
    pub get_dt: LevelRealFn,
    /// `warpx_maxStep`
    pub max_step: IntFn,
    /// `warpx_stopTime`
    pub stop_time: RealFn,
    /// `warpx_checkInt`
    pub check_int: IntFn,
    /// `warpx_plotInt`
    pub plot_int: IntFn,
    /// `warpx_finestLevel`
    pub finest_level: IntFn,
    /// `warpx_EvolveE`
    pub evolve_e: AdvanceFn,
    /// `warpx_EvolveB`
    pub evolve_b: AdvanceFn,
    /// `warpx_FillBoundaryE`
    pub fill_boundary_e: FillBoundaryFn,
    /// `warpx_FillBoundaryB`
    pub fill_boundary_b: FillBoundaryFn,
    /// `warpx_PushParticlesandDepose`
    pub push_particles_and_deposit: AdvanceFn,
    /// `addNParticles`
    pub add_particles: AddParticlesFn,
    /// `warpx_getParticleStructs`
    pub get_particle_structs: ParticleStructsFn,
    /// `warpx_getParticleArrays`
    pub get_particle_arrays: ParticleArraysFn,
    /// `warpx_getEfield`
    pub get_e_field: MeshDataFn,
    /// `warpx_getBfield`
    pub get_b_field: MeshDataFn,
    /// `warpx_getCurrentDensity`
    pub get_current_density: MeshDataFn,
    /// Releases counts, shapes and pointer tables. Defaults to the C
    /// allocator's `free`.
    pub free: FreeFn,
}

impl fmt::Debug for EngineTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineTable")
            .field("init", &(self.init as *const ()))
            .field("free", &(self.free as *const ()))
            .finish_non_exhaustive()
    }
}

/// Where an [`EngineApi`]'s function pointers came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineOrigin {
    /// Resolved from a shared library at this path.
    Library(PathBuf),
    /// Supplied directly by the caller.
    InProcess,
}

/// A resolved engine: function table plus the library keeping it mapped.
///
/// The handle is not yet initialized. Pass it to the simulation context,
/// which calls `amrex_init` exactly once and takes ownership.
pub struct EngineApi {
    table: EngineTable,
    origin: EngineOrigin,
    // Declared last so the table is never observable after unmapping.
    _library: Option<Library>,
}

impl EngineApi {
    /// Open the engine library at `path` and resolve every export.
    #[allow(unsafe_code)]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        // SAFETY: loading runs the library's static initializers. The
        // engine library is trusted by contract; there is no safe
        // alternative for a compiled collaborator.
        let library = unsafe { Library::new(path) }.map_err(|e| LoadError::Open {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let table = resolve_table(&library)?;
        info!("loaded engine library {}", path.display());
        Ok(Self {
            table,
            origin: EngineOrigin::Library(path.to_path_buf()),
            _library: Some(library),
        })
    }

    /// Try each candidate path in order, returning the first that loads.
    ///
    /// A candidate that opens but lacks a symbol is a hard error: it is the
    /// wrong library, and falling through would hide that.
    pub fn load_first<I, P>(candidates: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut tried = Vec::new();
        for candidate in candidates {
            let candidate = candidate.as_ref();
            match Self::load(candidate) {
                Ok(api) => return Ok(api),
                Err(LoadError::Open { path, reason }) => {
                    debug!("engine library candidate {} rejected: {reason}", path.display());
                    tried.push(path);
                }
                Err(e) => return Err(e),
            }
        }
        Err(LoadError::LibraryNotFound { tried })
    }

    /// Wrap a table of in-process functions.
    pub fn from_table(table: EngineTable) -> Self {
        Self {
            table,
            origin: EngineOrigin::InProcess,
            _library: None,
        }
    }

    /// The function table.
    pub fn table(&self) -> &EngineTable {
        &self.table
    }

    /// Where the table came from.
    pub fn origin(&self) -> &EngineOrigin {
        &self.origin
    }
}

impl fmt::Debug for EngineApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineApi")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// Copy one export out of the library as a bare function pointer.
#[allow(unsafe_code)]
fn symbol<T: Copy>(library: &Library, name: &'static [u8]) -> Result<T, LoadError> {
    // SAFETY: `T` is one of the function pointer aliases above, each
    // matching the engine's exported C prototype for `name`. The copied
    // pointer stays valid while `library` is alive; EngineApi owns both.
    unsafe {
        library
            .get::<T>(name)
            .map(|s| *s)
            .map_err(|_| LoadError::MissingSymbol {
                symbol: symbols::display_name(name),
            })
    }
}

fn resolve_table(library: &Library) -> Result<EngineTable, LoadError> {
    Ok(EngineTable {
        init: symbol(library, symbols::AMREX_INIT)?,
        get_istep: symbol(library, symbols::GET_ISTEP)?,
        set_istep: symbol(library, symbols::SET_ISTEP)?,
        get_t_new: symbol(library, symbols::GET_T_NEW)?,
        set_t_new: symbol(library, symbols::SET_T_NEW)?,
        get_dt: symbol(library, symbols::GET_DT)?,
        max_step: symbol(library, symbols::MAX_STEP)?,
        stop_time: symbol(library, symbols::STOP_TIME)?,
        check_int: symbol(library, symbols::CHECK_INT)?,
        plot_int: symbol(library, symbols::PLOT_INT)?,
        finest_level: symbol(library, symbols::FINEST_LEVEL)?,
        evolve_e: symbol(library, symbols::EVOLVE_E)?,
        evolve_b: symbol(library, symbols::EVOLVE_B)?,
        fill_boundary_e: symbol(library, symbols::FILL_BOUNDARY_E)?,
        fill_boundary_b: symbol(library, symbols::FILL_BOUNDARY_B)?,
        push_particles_and_deposit: symbol(library, symbols::PUSH_PARTICLES)?,
        add_particles: symbol(library, symbols::ADD_N_PARTICLES)?,
        get_particle_structs: symbol(library, symbols::GET_PARTICLE_STRUCTS)?,
        get_particle_arrays: symbol(library, symbols::GET_PARTICLE_ARRAYS)?,
        get_e_field: symbol(library, symbols::GET_E_FIELD)?,
        get_b_field: symbol(library, symbols::GET_B_FIELD)?,
        get_current_density: symbol(library, symbols::GET_CURRENT_DENSITY)?,
        free: libc::free,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_library_reports_open_error() {
        let err = EngineApi::load("/nonexistent/dir/libwarpx.so").unwrap_err();
        match err {
            LoadError::Open { path, .. } => {
                assert_eq!(path, PathBuf::from("/nonexistent/dir/libwarpx.so"));
            }
            other => panic!("expected Open, got {other:?}"),
        }
    }

    #[test]
    fn load_first_collects_every_rejected_candidate() {
        let err = EngineApi::load_first(["/nonexistent/a.so", "/nonexistent/b.so"]).unwrap_err();
        assert_eq!(
            err,
            LoadError::LibraryNotFound {
                tried: vec![
                    PathBuf::from("/nonexistent/a.so"),
                    PathBuf::from("/nonexistent/b.so")
                ],
            }
        );
    }

    #[test]
    fn load_first_with_no_candidates_is_not_found() {
        let err = EngineApi::load_first(Vec::<PathBuf>::new()).unwrap_err();
        assert_eq!(err, LoadError::LibraryNotFound { tried: vec![] });
    }
}
