//! Clock, run-control and solver passthroughs.
//!
//! Each method forwards to one engine export. Level-indexed calls go
//! through the configured level check; everything that lets the engine
//! touch its field or particle storage takes `&mut self`.

use log::debug;
use warpx_core::{BindingError, Level};

use crate::simulation::Simulation;

/// Run-wide limits read from the engine's input deck.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunLimits {
    /// Maximum number of steps.
    pub max_steps: i32,
    /// Simulated time at which the run stops.
    pub stop_time: f64,
    /// Steps between checkpoints.
    pub check_interval: i32,
    /// Steps between plot files.
    pub plot_interval: i32,
    /// Highest AMR level currently defined.
    pub finest_level: i32,
}

/// Step counter, time and time step of one AMR level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelClock {
    /// Current step.
    pub step: i32,
    /// Current simulated time.
    pub time: f64,
    /// Time step.
    pub dt: f64,
}

#[allow(unsafe_code)]
impl Simulation {
    // ── Clocks ─────────────────────────────────────────────────────

    /// Step counter at `level`.
    pub fn current_step(&self, level: Level) -> Result<i32, BindingError> {
        self.check_level(level)?;
        // SAFETY: scalar in, scalar out.
        Ok(unsafe { (self.table().get_istep)(level.0) })
    }

    /// Overwrite the step counter at `level`.
    pub fn set_current_step(&mut self, level: Level, step: i32) -> Result<(), BindingError> {
        self.check_level(level)?;
        // SAFETY: scalar arguments only.
        unsafe { (self.table().set_istep)(level.0, step) };
        Ok(())
    }

    /// Simulated time at `level`.
    pub fn time(&self, level: Level) -> Result<f64, BindingError> {
        self.check_level(level)?;
        // SAFETY: scalar in, scalar out.
        Ok(unsafe { (self.table().get_t_new)(level.0) })
    }

    /// Overwrite the simulated time at `level`.
    pub fn set_time(&mut self, level: Level, time: f64) -> Result<(), BindingError> {
        self.check_level(level)?;
        // SAFETY: scalar arguments only.
        unsafe { (self.table().set_t_new)(level.0, time) };
        Ok(())
    }

    /// Time step at `level`.
    pub fn dt(&self, level: Level) -> Result<f64, BindingError> {
        self.check_level(level)?;
        // SAFETY: scalar in, scalar out.
        Ok(unsafe { (self.table().get_dt)(level.0) })
    }

    /// Step counter, time and time step at `level` in one read.
    pub fn level_clock(&self, level: Level) -> Result<LevelClock, BindingError> {
        Ok(LevelClock {
            step: self.current_step(level)?,
            time: self.time(level)?,
            dt: self.dt(level)?,
        })
    }

    // ── Run control ────────────────────────────────────────────────

    /// Maximum number of steps.
    pub fn max_steps(&self) -> i32 {
        // SAFETY: no arguments.
        unsafe { (self.table().max_step)() }
    }

    /// Simulated stop time.
    pub fn stop_time(&self) -> f64 {
        // SAFETY: no arguments.
        unsafe { (self.table().stop_time)() }
    }

    /// Steps between checkpoints.
    pub fn check_interval(&self) -> i32 {
        // SAFETY: no arguments.
        unsafe { (self.table().check_int)() }
    }

    /// Steps between plot files.
    pub fn plot_interval(&self) -> i32 {
        // SAFETY: no arguments.
        unsafe { (self.table().plot_int)() }
    }

    /// Highest AMR level currently defined.
    pub fn finest_level(&self) -> i32 {
        // SAFETY: no arguments.
        unsafe { (self.table().finest_level)() }
    }

    /// All run-wide limits.
    pub fn run_limits(&self) -> RunLimits {
        RunLimits {
            max_steps: self.max_steps(),
            stop_time: self.stop_time(),
            check_interval: self.check_interval(),
            plot_interval: self.plot_interval(),
            finest_level: self.finest_level(),
        }
    }

    // ── Solver passthroughs ────────────────────────────────────────

    /// Advance E at `level` by `dt`.
    pub fn evolve_e(&mut self, level: Level, dt: f64) -> Result<(), BindingError> {
        self.check_level(level)?;
        self.check_dt(dt)?;
        debug!("evolve E at level {level}, dt {dt}");
        // SAFETY: scalar arguments; `&mut self` retires outstanding views.
        unsafe { (self.table().evolve_e)(level.0, dt) };
        Ok(())
    }

    /// Advance B at `level` by `dt`.
    pub fn evolve_b(&mut self, level: Level, dt: f64) -> Result<(), BindingError> {
        self.check_level(level)?;
        self.check_dt(dt)?;
        debug!("evolve B at level {level}, dt {dt}");
        // SAFETY: as `evolve_e`.
        unsafe { (self.table().evolve_b)(level.0, dt) };
        Ok(())
    }

    /// Exchange E ghost cells at `level`.
    pub fn fill_boundary_e(&mut self, level: Level, force: bool) -> Result<(), BindingError> {
        self.check_level(level)?;
        debug!("fill E boundary at level {level} (force: {force})");
        // SAFETY: as `evolve_e`.
        unsafe { (self.table().fill_boundary_e)(level.0, force) };
        Ok(())
    }

    /// Exchange B ghost cells at `level`.
    pub fn fill_boundary_b(&mut self, level: Level, force: bool) -> Result<(), BindingError> {
        self.check_level(level)?;
        debug!("fill B boundary at level {level} (force: {force})");
        // SAFETY: as `evolve_e`.
        unsafe { (self.table().fill_boundary_b)(level.0, force) };
        Ok(())
    }

    /// Push particles at `level` by `dt` and deposit their current.
    pub fn push_particles_and_deposit(&mut self, level: Level, dt: f64) -> Result<(), BindingError> {
        self.check_level(level)?;
        self.check_dt(dt)?;
        debug!("push particles and deposit at level {level}, dt {dt}");
        // SAFETY: as `evolve_e`.
        unsafe { (self.table().push_particles_and_deposit)(level.0, dt) };
        Ok(())
    }
}
