//! Error types for the WarpX engine bindings.
//!
//! The engine itself reports nothing: malformed input, use before init and
//! out-of-range indices are engine-defined. These enums cover only what the
//! binding detects on its own side of the boundary, organized by subsystem:
//! library loading, configuration, and per-call argument checks.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;

/// Errors from locating or opening the engine shared library.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadError {
    /// No candidate path could be opened.
    LibraryNotFound {
        /// Every path that was attempted, in order.
        tried: Vec<PathBuf>,
    },
    /// The dynamic loader rejected the library.
    Open {
        /// Path that was opened.
        path: PathBuf,
        /// Loader diagnostic.
        reason: String,
    },
    /// The library does not export a required symbol.
    MissingSymbol {
        /// Symbol name without the trailing NUL.
        symbol: String,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LibraryNotFound { tried } => {
                write!(f, "engine library not found (tried ")?;
                for (i, p) in tried.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p.display())?;
                }
                write!(f, ")")
            }
            Self::Open { path, reason } => {
                write!(f, "failed to open {}: {reason}", path.display())
            }
            Self::MissingSymbol { symbol } => {
                write!(f, "engine library does not export '{symbol}'")
            }
        }
    }
}

impl Error for LoadError {}

/// Errors detected by `BindingConfig::validate()`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The explicit library path is empty.
    EmptyLibraryPath,
    /// The library path names a directory, not a file.
    LibraryPathIsDirectory {
        /// The offending path.
        path: PathBuf,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyLibraryPath => write!(f, "library path is empty"),
            Self::LibraryPathIsDirectory { path } => {
                write!(f, "library path {} is a directory", path.display())
            }
        }
    }
}

impl Error for ConfigError {}

/// Errors returned by binding operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BindingError {
    /// Input sequences handed to the engine disagree in length.
    LengthMismatch {
        /// Which input was inconsistent.
        what: &'static str,
        /// Length implied by the first position array.
        expected: usize,
        /// Length actually supplied.
        actual: usize,
    },
    /// An argument cannot be represented at the C boundary.
    InvalidArgument {
        /// Description of the problem.
        reason: String,
    },
    /// A level-indexed call named a level outside `0..=finest`.
    LevelOutOfRange {
        /// Requested level.
        level: i32,
        /// Finest level the engine reported.
        finest: i32,
    },
    /// The engine returned a negative count or size.
    NegativeCount {
        /// Which out-parameter was negative.
        what: &'static str,
        /// The value returned.
        value: i32,
    },
    /// The engine returned a null pointer where data was advertised.
    NullPointer {
        /// Which pointer was null.
        what: &'static str,
    },
    /// Ghost exclusion would remove more cells than an axis holds.
    GhostsExceedGrid {
        /// Ghost cells per side.
        ghosts: usize,
        /// Full grid shape including ghosts.
        shape: [usize; 3],
    },
    /// The engine reported grid extents whose cell count overflows `usize`.
    GridTooLarge {
        /// Extents as reported.
        shape: [usize; 3],
    },
    /// A library-backed engine was already initialized in this process.
    AlreadyInitialized,
    /// The engine library could not be loaded.
    Load(LoadError),
    /// The binding configuration is invalid.
    Config(ConfigError),
}

impl fmt::Display for BindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch {
                what,
                expected,
                actual,
            } => write!(f, "{what} has length {actual}, expected {expected}"),
            Self::InvalidArgument { reason } => write!(f, "invalid argument: {reason}"),
            Self::LevelOutOfRange { level, finest } => {
                write!(f, "level {level} outside 0..={finest}")
            }
            Self::NegativeCount { what, value } => {
                write!(f, "engine returned negative {what}: {value}")
            }
            Self::NullPointer { what } => write!(f, "engine returned null {what}"),
            Self::GhostsExceedGrid { ghosts, shape } => write!(
                f,
                "cannot strip {ghosts} ghost cells per side from grid {}x{}x{}",
                shape[0], shape[1], shape[2]
            ),
            Self::GridTooLarge { shape } => write!(
                f,
                "grid {}x{}x{} has more cells than fit in memory",
                shape[0], shape[1], shape[2]
            ),
            Self::AlreadyInitialized => {
                write!(f, "engine already initialized in this process")
            }
            Self::Load(e) => write!(f, "load: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl Error for BindingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Load(e) => Some(e),
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LoadError> for BindingError {
    fn from(e: LoadError) -> Self {
        Self::Load(e)
    }
}

impl From<ConfigError> for BindingError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_lists_every_candidate() {
        let e = LoadError::LibraryNotFound {
            tried: vec![PathBuf::from("/a/libwarpx.so"), PathBuf::from("libwarpx.so")],
        };
        assert_eq!(
            e.to_string(),
            "engine library not found (tried /a/libwarpx.so, libwarpx.so)"
        );
    }

    #[test]
    fn wrapped_errors_expose_source() {
        let e = BindingError::from(LoadError::MissingSymbol {
            symbol: "amrex_init".into(),
        });
        assert!(e.source().is_some());
        assert!(e.to_string().contains("amrex_init"));

        let e = BindingError::NullPointer { what: "tile data" };
        assert!(e.source().is_none());
    }

    #[test]
    fn oversized_grid_formats_shape() {
        let e = BindingError::GridTooLarge {
            shape: [usize::MAX, 2, 2],
        };
        assert!(e.to_string().starts_with(&format!("grid {}x2x2 ", usize::MAX)));
    }

    #[test]
    fn ghost_error_formats_shape() {
        let e = BindingError::GhostsExceedGrid {
            ghosts: 3,
            shape: [4, 8, 8],
        };
        assert_eq!(
            e.to_string(),
            "cannot strip 3 ghost cells per side from grid 4x8x8"
        );
    }
}
