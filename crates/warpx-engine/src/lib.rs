//! Simulation context for a loaded WarpX engine.
//!
//! [`Simulation`] is the process-lifetime handle every binding operation
//! goes through. It is created by initializing an [`EngineApi`] exactly
//! once, and from then on exposes particle injection, zero-copy particle
//! and mesh retrieval, and thin wrappers over the engine's clock and
//! solver exports.
//!
//! Views returned by accessors borrow the simulation immutably. Anything
//! that lets the engine move, grow or free its buffers takes `&mut self`,
//! so stale views are a compile error rather than a dangling read.
//!
//! [`EngineApi`]: warpx_ffi::EngineApi

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod clock;
pub mod config;
pub mod mesh;
pub mod particles;
pub mod simulation;

pub use clock::{LevelClock, RunLimits};
pub use config::{BindingConfig, ValidationMode};
pub use particles::ParticleBatch;
pub use simulation::Simulation;
