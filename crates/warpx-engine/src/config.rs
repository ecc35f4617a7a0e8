//! Binding configuration and validation.
//!
//! [`BindingConfig`] decides where the engine library comes from and how
//! much checking the binding does before forwarding a call. It never
//! affects the engine's own behaviour.

use std::path::PathBuf;

use warpx_core::ConfigError;
use warpx_ffi::library_candidates;

// ── ValidationMode ─────────────────────────────────────────────────

/// How much the binding checks indices before forwarding them.
///
/// Checks that protect Rust memory (input lengths, negative engine counts,
/// NUL bytes in `argv`) run in every mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ValidationMode {
    /// Reject negative species ids and levels outside `0..=finest_level`
    /// before calling the engine.
    #[default]
    Defensive,
    /// Forward indices unchanged; out-of-range values get whatever the
    /// engine does with them.
    PassThrough,
}

impl ValidationMode {
    /// Parse `"defensive"` or `"pass-through"` (also `"passthrough"`),
    /// ignoring ASCII case.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "defensive" => Some(Self::Defensive),
            "pass-through" | "passthrough" | "pass_through" => Some(Self::PassThrough),
            _ => None,
        }
    }

    /// Whether index checks run.
    pub fn is_defensive(self) -> bool {
        self == Self::Defensive
    }
}

// ── BindingConfig ──────────────────────────────────────────────────

/// Configuration for [`Simulation`](crate::Simulation).
#[derive(Clone, Debug, Default)]
pub struct BindingConfig {
    /// Engine library to open. `None` searches `$WARPX_LIBRARY`, the
    /// executable's directory, then the loader path.
    pub library_path: Option<PathBuf>,
    /// Index checking policy. Default: [`ValidationMode::Defensive`].
    pub validation: ValidationMode,
}

impl BindingConfig {
    /// Config that loads the library at `path`.
    pub fn with_library(path: impl Into<PathBuf>) -> Self {
        Self {
            library_path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Replace the validation mode.
    pub fn validation(mut self, mode: ValidationMode) -> Self {
        self.validation = mode;
        self
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.library_path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::EmptyLibraryPath);
            }
            if path.is_dir() {
                return Err(ConfigError::LibraryPathIsDirectory { path: path.clone() });
            }
        }
        Ok(())
    }

    /// Library paths to try, in order.
    pub fn library_candidates(&self) -> Vec<PathBuf> {
        library_candidates(self.library_path.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_defensive_search() {
        let c = BindingConfig::default();
        assert!(c.library_path.is_none());
        assert_eq!(c.validation, ValidationMode::Defensive);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn empty_path_is_rejected() {
        let c = BindingConfig::with_library("");
        assert_eq!(c.validate(), Err(ConfigError::EmptyLibraryPath));
    }

    #[test]
    fn directory_path_is_rejected() {
        let dir = std::env::temp_dir();
        let c = BindingConfig::with_library(&dir);
        assert_eq!(
            c.validate(),
            Err(ConfigError::LibraryPathIsDirectory { path: dir })
        );
    }

    #[test]
    fn explicit_path_is_the_only_candidate() {
        let c = BindingConfig::with_library("/opt/lib/libwarpx.so");
        assert_eq!(
            c.library_candidates(),
            vec![PathBuf::from("/opt/lib/libwarpx.so")]
        );
    }

    #[test]
    fn validation_mode_parsing() {
        assert_eq!(ValidationMode::parse("Defensive"), Some(ValidationMode::Defensive));
        assert_eq!(
            ValidationMode::parse("pass-through"),
            Some(ValidationMode::PassThrough)
        );
        assert_eq!(
            ValidationMode::parse("PASSTHROUGH"),
            Some(ValidationMode::PassThrough)
        );
        assert_eq!(ValidationMode::parse("strict"), None);
    }

    #[test]
    fn builder_sets_mode() {
        let c = BindingConfig::default().validation(ValidationMode::PassThrough);
        assert!(!c.validation.is_defensive());
    }
}
