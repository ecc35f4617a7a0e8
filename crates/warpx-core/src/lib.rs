//! Core types for the WarpX engine bindings.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! plain values that cross the engine boundary: identifiers, the native
//! particle record layout, component and field selectors, and the error
//! types shared by the rest of the workspace.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod field;
pub mod id;
pub mod particle;

pub use error::{BindingError, ConfigError, LoadError};
pub use field::{Direction, FieldKind};
pub use id::{Level, SpeciesId};
pub use particle::{ParticleComponent, ParticleRecord};
