//! Command-line argument marshaling for `amrex_init`.

use std::ffi::{c_char, c_int, CString};

use warpx_core::BindingError;

/// An owned, NUL-terminated `char*` array built from host strings.
///
/// Each argument is encoded as UTF-8 and copied into its own `CString`.
/// The pointer array holds one entry per argument followed by a null
/// terminator, matching the `argv[argc] == NULL` convention. Both the
/// strings and the array live as long as this value.
#[derive(Debug)]
pub struct CArgv {
    // Owns the storage `ptrs` points into.
    _strings: Vec<CString>,
    ptrs: Vec<*mut c_char>,
}

impl CArgv {
    /// Encode `args`. Fails if any argument contains an interior NUL byte.
    pub fn new<S: AsRef<str>>(args: &[S]) -> Result<Self, BindingError> {
        let strings = args
            .iter()
            .enumerate()
            .map(|(i, a)| {
                CString::new(a.as_ref()).map_err(|_| BindingError::InvalidArgument {
                    reason: format!("argv[{i}] contains a NUL byte"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        c_int::try_from(strings.len()).map_err(|_| BindingError::InvalidArgument {
            reason: format!("{} arguments exceed the C int range", strings.len()),
        })?;
        let mut ptrs: Vec<*mut c_char> = strings.iter().map(|s| s.as_ptr().cast_mut()).collect();
        ptrs.push(std::ptr::null_mut());
        Ok(Self {
            _strings: strings,
            ptrs,
        })
    }

    /// Argument count, excluding the null terminator.
    pub fn argc(&self) -> c_int {
        // Range was checked in `new`.
        (self.ptrs.len() - 1) as c_int
    }

    /// Pointer to the first element of the null-terminated array.
    pub fn as_mut_ptr(&mut self) -> *mut *mut c_char {
        self.ptrs.as_mut_ptr()
    }
}
