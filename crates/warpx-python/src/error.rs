//! BindingError -> Python exception mapping.

use pyo3::exceptions::{PyImportError, PyOSError, PyRuntimeError, PyValueError};
use pyo3::PyErr;
use warpx_core::{BindingError, LoadError};

/// Python exception family for a binding error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Family {
    /// Caller passed something unusable.
    Value,
    /// The engine library could not be opened.
    Os,
    /// The library opened but is not a WarpX engine.
    Import,
    /// Engine state the caller cannot fix by changing arguments.
    Runtime,
}

fn family(err: &BindingError) -> Family {
    match err {
        BindingError::LengthMismatch { .. }
        | BindingError::InvalidArgument { .. }
        | BindingError::LevelOutOfRange { .. }
        | BindingError::Config(_) => Family::Value,
        BindingError::NegativeCount { .. }
        | BindingError::NullPointer { .. }
        | BindingError::GhostsExceedGrid { .. }
        | BindingError::GridTooLarge { .. }
        | BindingError::AlreadyInitialized => Family::Runtime,
        BindingError::Load(LoadError::MissingSymbol { .. }) => Family::Import,
        BindingError::Load(_) => Family::Os,
    }
}

/// Convert a binding error into the matching Python exception.
pub(crate) fn to_py(err: BindingError) -> PyErr {
    let msg = format!("warpx: {err}");
    match family(&err) {
        Family::Value => PyValueError::new_err(msg),
        Family::Os => PyOSError::new_err(msg),
        Family::Import => PyImportError::new_err(msg),
        Family::Runtime => PyRuntimeError::new_err(msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use warpx_core::ConfigError;

    #[test]
    fn caller_mistakes_are_value_errors() {
        let errs = [
            BindingError::LengthMismatch {
                what: "y",
                expected: 2,
                actual: 1,
            },
            BindingError::LevelOutOfRange {
                level: 3,
                finest: 0,
            },
            BindingError::Config(ConfigError::EmptyLibraryPath),
        ];
        for e in &errs {
            assert_eq!(family(e), Family::Value, "{e}");
        }
    }

    #[test]
    fn load_failures_split_by_cause() {
        let missing = BindingError::Load(LoadError::MissingSymbol {
            symbol: "warpx_getEfield".into(),
        });
        let absent = BindingError::Load(LoadError::LibraryNotFound {
            tried: vec![PathBuf::from("libwarpx.so")],
        });
        assert_eq!(family(&missing), Family::Import);
        assert_eq!(family(&absent), Family::Os);
    }

    #[test]
    fn engine_inconsistencies_are_runtime_errors() {
        let e = BindingError::NegativeCount {
            what: "tile count",
            value: -1,
        };
        assert_eq!(family(&e), Family::Runtime);
    }

    #[test]
    fn second_process_init_is_a_runtime_error() {
        assert_eq!(family(&BindingError::AlreadyInitialized), Family::Runtime);
    }
}
