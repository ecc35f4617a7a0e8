//! WarpX: zero-copy Rust bindings for the WarpX particle-in-cell engine.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all binding sub-crates. The engine itself (field solver, particle push,
//! deposition, time stepping) is a compiled shared library; these crates
//! load it, initialize it once, and expose its particle and mesh storage as
//! views that read and write the engine's own buffers.
//!
//! # Quick start
//!
//! ```rust
//! use warpx::prelude::*;
//! # use warpx_test_utils::MockEngine;
//! # let mock = MockEngine::install_default();
//! # let api = mock.api();
//! // With a real engine: `let api = EngineApi::load("libwarpx.so")?;`
//! // or `Simulation::load(BindingConfig::default(), &argv)`.
//! let mut sim = Simulation::init(api, BindingConfig::default(), &["warpx", "inputs"])?;
//!
//! let x = [0.1, 0.2];
//! let u = [0.0, 0.0];
//! sim.add_particles(SpeciesId(0), &ParticleBatch::new(&x, &x, &x, &u, &u, &u))?;
//!
//! for tile in sim.particle_structs(SpeciesId(0))? {
//!     for i in 0..tile.len() {
//!         let mut p = tile.get(i).unwrap();
//!         p.x += 1.0;
//!         tile.set(i, p);
//!     }
//! }
//!
//! let ex = sim.mesh_electric_field(Level::BASE, Direction::X, false)?;
//! let total: f64 = ex.iter().map(|g| g.to_owned_array().sum()).sum();
//! # let _ = total;
//! # Ok::<(), BindingError>(())
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `warpx-core` | IDs, particle record layout, selectors, errors |
//! | [`ffi`] | `warpx-ffi` | Engine ABI, library loading, bookkeeping ownership |
//! | [`view`] | `warpx-view` | Particle tile and mesh grid views |
//! | [`engine`] | `warpx-engine` | `Simulation`, configuration, clocks |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and errors (`warpx-core`).
///
/// Contains [`types::ParticleRecord`], the component and field selectors,
/// and the error enums shared by every crate.
pub use warpx_core as types;

/// Engine ABI (`warpx-ffi`).
///
/// [`ffi::EngineApi`] resolves the engine's exports from a shared library
/// or wraps an in-process [`ffi::EngineTable`].
pub use warpx_ffi as ffi;

/// Zero-copy views (`warpx-view`).
///
/// [`view::ParticleTile`], [`view::ScalarTile`], [`view::ParticleColumn`]
/// and [`view::GridView`] alias engine memory for the lifetime of a shared
/// borrow of the simulation.
pub use warpx_view as view;

/// Simulation context (`warpx-engine`).
///
/// [`engine::Simulation`] is the initialized engine; every binding
/// operation is a method on it.
pub use warpx_engine as engine;

/// Common imports for typical usage.
///
/// ```rust
/// use warpx::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use warpx_core::{
        Direction, FieldKind, Level, ParticleComponent, ParticleRecord, SpeciesId,
    };

    // Errors
    pub use warpx_core::{BindingError, ConfigError, LoadError};

    // Loading
    pub use warpx_ffi::EngineApi;

    // Views
    pub use warpx_view::{GridView, ParticleColumn, ParticleTile, ScalarTile};

    // Engine
    pub use warpx_engine::{
        BindingConfig, LevelClock, ParticleBatch, RunLimits, Simulation, ValidationMode,
    };
}
