//! Engine library path resolution.

use std::env;
use std::path::{Path, PathBuf};

/// File name of the engine library.
pub const LIBRARY_FILE_NAME: &str = "libwarpx.so";

/// Environment variable overriding the library location.
pub const LIBRARY_ENV: &str = "WARPX_LIBRARY";

/// Candidate paths, most specific first.
///
/// 1. `explicit`, when given. It is the only candidate in that case.
/// 2. `$WARPX_LIBRARY`.
/// 3. `libwarpx.so` next to the running executable.
/// 4. Bare `libwarpx.so`, resolved by the dynamic loader's search path.
pub fn library_candidates(explicit: Option<&Path>) -> Vec<PathBuf> {
    if let Some(p) = explicit {
        return vec![p.to_path_buf()];
    }
    let mut out = Vec::with_capacity(3);
    if let Some(p) = env::var_os(LIBRARY_ENV).filter(|v| !v.is_empty()) {
        out.push(PathBuf::from(p));
    }
    if let Some(dir) = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        out.push(dir.join(LIBRARY_FILE_NAME));
    }
    out.push(PathBuf::from(LIBRARY_FILE_NAME));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_is_the_only_candidate() {
        let c = library_candidates(Some(Path::new("/opt/warpx/lib/libwarpx.so")));
        assert_eq!(c, vec![PathBuf::from("/opt/warpx/lib/libwarpx.so")]);
    }

    #[test]
    fn search_ends_with_bare_file_name() {
        let c = library_candidates(None);
        assert_eq!(c.last(), Some(&PathBuf::from(LIBRARY_FILE_NAME)));
        assert!(c.len() >= 2);
    }
}
