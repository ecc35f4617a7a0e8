//! Python bindings for the WarpX engine bindings.
//!
//! The native extension is named `_warpx`. It exposes one class,
//! `Simulation`, whose accessors return NumPy arrays sharing memory with
//! the engine's particle tiles and mesh grids.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![allow(unsafe_code)]

use pyo3::prelude::*;

mod arrays;
mod error;
mod simulation;

/// The native `_warpx` extension module.
#[pymodule]
fn _warpx(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<simulation::Simulation>()?;

    // Scalar component indices accepted by `get_particle_arrays`.
    for component in warpx_core::ParticleComponent::ALL {
        m.add(
            format!("COMPONENT_{}", component.name().to_uppercase()),
            component.index(),
        )?;
    }

    Ok(())
}
