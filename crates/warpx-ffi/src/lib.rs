//! Engine ABI for the WarpX bindings.
//!
//! Declares the C calling convention of every routine the compiled engine
//! exports, resolves them from the shared library into an [`EngineApi`]
//! function table, and provides the two small marshaling helpers the
//! binding needs at the boundary: a NUL-terminated `argv` builder and an
//! owner for the bookkeeping arrays the engine allocates on each accessor
//! call. Raw calls through the table happen in `warpx-engine`; the
//! pointers they return become views in `warpx-view`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod api;
pub mod argv;
pub mod bookkeeping;
pub mod locate;
pub mod symbols;

pub use api::{EngineApi, EngineOrigin, EngineTable, FreeFn};
pub use argv::CArgv;
pub use bookkeeping::EngineArray;
pub use locate::{library_candidates, LIBRARY_ENV, LIBRARY_FILE_NAME};
