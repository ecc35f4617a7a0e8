//! Zero-copy borrowed views over engine-owned simulation memory.
//!
//! The engine owns every particle and mesh buffer. This crate only
//! describes how to interpret the pointers it hands out:
//!
//! ```text
//! particle tile ── ParticleTile   (records: x y z id cpu, 32 B each)
//!               │  └── ParticleColumn<f64 | i32>  (strided projection)
//!               └─ ScalarTile     (one f64 per particle, tagged component)
//! mesh grid ───── GridView        (C-order 3D, optional ghost stripping)
//! ```
//!
//! # Aliasing
//!
//! Views are built over `Cell<T>` rather than `&mut T`. Several views may
//! cover the same engine buffer (a record tile and its `x` column, or two
//! calls to the same accessor) and each may write through; nothing ever
//! materializes two overlapping `&mut`. The price is that views are
//! `!Sync`, which matches the engine's single-threaded contract.
//!
//! # Lifetime
//!
//! `'a` is chosen by the caller of the `unsafe` constructors. The
//! simulation context ties it to a shared borrow of itself, so any engine
//! call that can move or free buffers (which takes `&mut`) ends every view.
//!
//! All pointer-to-view conversion lives in the private `raw` module.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod grid;
mod raw;
pub mod tile;

pub use grid::GridView;
pub use tile::{ParticleColumn, ParticleTile, ScalarTile};
