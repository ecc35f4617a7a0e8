//! The process-lifetime simulation context.

use std::ffi::c_int;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{info, warn};
use warpx_core::{BindingError, Level, SpeciesId};
use warpx_ffi::{CArgv, EngineApi, EngineOrigin, EngineTable};

use crate::config::BindingConfig;

/// Set once a library-backed engine has been initialized in this process.
/// Never cleared: the engine exports no finalize routine.
static LIBRARY_ENGINE_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Take the single per-process initialization recorded in `flag`.
fn claim_process_init(flag: &AtomicBool) -> Result<(), BindingError> {
    flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .map(|_| ())
        .map_err(|_| BindingError::AlreadyInitialized)
}

/// An initialized engine.
///
/// Owns the resolved [`EngineApi`] (and through it the loaded library).
/// The only way to obtain one is [`Simulation::init`] or
/// [`Simulation::load`], both of which call the engine's `amrex_init`
/// before returning, so every accessor runs after initialization.
///
/// A library-backed engine is initialized at most once per process; a
/// second `init` fails with [`BindingError::AlreadyInitialized`]. Tables
/// built with [`EngineApi::from_table`] are exempt.
///
/// Not `Send` or `Sync`: the engine documents no thread-safety for any
/// export, and returned views alias engine memory through `Cell`s.
pub struct Simulation {
    api: EngineApi,
    config: BindingConfig,
    _single_thread: PhantomData<*const ()>,
}

impl Simulation {
    /// Locate and open the engine library per `config`, then initialize it
    /// with `argv`.
    pub fn load<S: AsRef<str>>(config: BindingConfig, argv: &[S]) -> Result<Self, BindingError> {
        config.validate()?;
        let api = EngineApi::load_first(config.library_candidates())?;
        Self::init(api, config, argv)
    }

    /// Initialize `api` with a command-line-style argument list.
    ///
    /// `argv` conventionally starts with a program name; the engine parses
    /// the rest as input-file and `key=value` overrides. Each string is
    /// encoded as UTF-8 and must not contain NUL bytes.
    ///
    /// Fails with [`BindingError::AlreadyInitialized`] if `api` came from a
    /// shared library and an engine library was already initialized in
    /// this process.
    #[allow(unsafe_code)]
    pub fn init<S: AsRef<str>>(
        api: EngineApi,
        config: BindingConfig,
        argv: &[S],
    ) -> Result<Self, BindingError> {
        config.validate()?;
        let mut args = CArgv::new(argv)?;
        if let EngineOrigin::Library(path) = api.origin() {
            claim_process_init(&LIBRARY_ENGINE_INITIALIZED).inspect_err(|_| {
                warn!("refusing second initialization via {}", path.display())
            })?;
        }
        info!(
            "initializing engine ({:?}) with {} argument(s), {:?} validation",
            api.origin(),
            args.argc(),
            config.validation
        );
        // SAFETY: `args` owns `argc` NUL-terminated strings plus a null
        // terminator and outlives the call.
        unsafe { (api.table().init)(args.argc(), args.as_mut_ptr()) };
        Ok(Self {
            api,
            config,
            _single_thread: PhantomData,
        })
    }

    /// The configuration this simulation was created with.
    pub fn config(&self) -> &BindingConfig {
        &self.config
    }

    /// The resolved engine.
    pub fn api(&self) -> &EngineApi {
        &self.api
    }

    pub(crate) fn table(&self) -> &EngineTable {
        self.api.table()
    }

    /// Reject levels outside `0..=finest_level` in defensive mode.
    pub(crate) fn check_level(&self, level: Level) -> Result<(), BindingError> {
        if !self.config.validation.is_defensive() {
            if level.0 < 0 {
                warn!("forwarding negative level {level} to the engine");
            }
            return Ok(());
        }
        let finest = self.finest_level();
        if level.0 < 0 || level.0 > finest {
            return Err(BindingError::LevelOutOfRange {
                level: level.0,
                finest,
            });
        }
        Ok(())
    }

    /// Reject negative species ids in defensive mode.
    pub(crate) fn check_species(&self, species: SpeciesId) -> Result<(), BindingError> {
        if species.0 >= 0 {
            return Ok(());
        }
        if self.config.validation.is_defensive() {
            return Err(BindingError::InvalidArgument {
                reason: format!("species id {species} is negative"),
            });
        }
        warn!("forwarding negative species id {species} to the engine");
        Ok(())
    }

    /// Reject NaN or infinite time steps in defensive mode.
    pub(crate) fn check_dt(&self, dt: f64) -> Result<(), BindingError> {
        if dt.is_finite() || !self.config.validation.is_defensive() {
            return Ok(());
        }
        Err(BindingError::InvalidArgument {
            reason: format!("time step {dt} is not finite"),
        })
    }
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("api", &self.api)
            .field("config", &self.config)
            .finish()
    }
}

/// Convert an engine-reported count to `usize`, rejecting negatives.
pub(crate) fn engine_count(what: &'static str, value: c_int) -> Result<usize, BindingError> {
    usize::try_from(value).map_err(|_| BindingError::NegativeCount { what, value })
}
