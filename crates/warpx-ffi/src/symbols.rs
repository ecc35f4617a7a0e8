//! Exported symbol names, NUL-terminated for the dynamic loader.

/// `void amrex_init(int argc, char** argv)`
pub const AMREX_INIT: &[u8] = b"amrex_init\0";
/// `int warpx_getistep(int lev)`
pub const GET_ISTEP: &[u8] = b"warpx_getistep\0";
/// `void warpx_setistep(int lev, int step)`
pub const SET_ISTEP: &[u8] = b"warpx_setistep\0";
/// `double warpx_gett_new(int lev)`
pub const GET_T_NEW: &[u8] = b"warpx_gett_new\0";
/// `void warpx_sett_new(int lev, double t)`
pub const SET_T_NEW: &[u8] = b"warpx_sett_new\0";
/// `double warpx_getdt(int lev)`
pub const GET_DT: &[u8] = b"warpx_getdt\0";
/// `int warpx_maxStep(void)`
pub const MAX_STEP: &[u8] = b"warpx_maxStep\0";
/// `double warpx_stopTime(void)`
pub const STOP_TIME: &[u8] = b"warpx_stopTime\0";
/// `int warpx_checkInt(void)`
pub const CHECK_INT: &[u8] = b"warpx_checkInt\0";
/// `int warpx_plotInt(void)`
pub const PLOT_INT: &[u8] = b"warpx_plotInt\0";
/// `int warpx_finestLevel(void)`
pub const FINEST_LEVEL: &[u8] = b"warpx_finestLevel\0";
/// `void warpx_EvolveE(int lev, double dt)`
pub const EVOLVE_E: &[u8] = b"warpx_EvolveE\0";
/// `void warpx_EvolveB(int lev, double dt)`
pub const EVOLVE_B: &[u8] = b"warpx_EvolveB\0";
/// `void warpx_FillBoundaryE(int lev, bool force)`
pub const FILL_BOUNDARY_E: &[u8] = b"warpx_FillBoundaryE\0";
/// `void warpx_FillBoundaryB(int lev, bool force)`
pub const FILL_BOUNDARY_B: &[u8] = b"warpx_FillBoundaryB\0";
/// `void warpx_PushParticlesandDepose(int lev, double dt)`
pub const PUSH_PARTICLES: &[u8] = b"warpx_PushParticlesandDepose\0";
/// `void addNParticles(...)`
pub const ADD_N_PARTICLES: &[u8] = b"addNParticles\0";
/// `ParticleRecord** warpx_getParticleStructs(int, int*, int**)`
pub const GET_PARTICLE_STRUCTS: &[u8] = b"warpx_getParticleStructs\0";
/// `double** warpx_getParticleArrays(int, int, int*, int**)`
pub const GET_PARTICLE_ARRAYS: &[u8] = b"warpx_getParticleArrays\0";
/// `double** warpx_getEfield(int, int, int*, int*, int**)`
pub const GET_E_FIELD: &[u8] = b"warpx_getEfield\0";
/// `double** warpx_getBfield(int, int, int*, int*, int**)`
pub const GET_B_FIELD: &[u8] = b"warpx_getBfield\0";
/// `double** warpx_getCurrentDensity(int, int, int*, int*, int**)`
pub const GET_CURRENT_DENSITY: &[u8] = b"warpx_getCurrentDensity\0";

/// Strip the trailing NUL for diagnostics.
pub fn display_name(symbol: &[u8]) -> String {
    let bytes = symbol.strip_suffix(b"\0").unwrap_or(symbol);
    String::from_utf8_lossy(bytes).into_owned()
}
