//! Test utilities for WarpX binding development.
//!
//! Provides an in-process [`MockEngine`] implementing the full engine ABI
//! against thread-local state, deterministic particle fixtures, and a
//! one-call logger setup for tests.

#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod fixtures;
pub mod mock;

pub use fixtures::{random_particles, RandomParticles};
pub use mock::{Advance, BoundaryFill, Fault, MockEngine, MockEngineBuilder};

/// Route `log` output through the test harness. Safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
