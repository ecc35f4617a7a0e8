//! An in-process engine implementing every export against thread-local
//! state.
//!
//! [`MockEngine::builder`] configures and installs the state for the
//! current thread; [`MockEngine::api`] hands out an `EngineApi` whose
//! table points at the `extern "C"` functions below. Each test thread gets
//! its own engine, so tests stay independent under the parallel runner.
//!
//! Bookkeeping arrays are allocated with `malloc` and tracked. The table's
//! release routine records every pointer it is given and only frees the
//! ones the mock allocated, so tests can assert that the binding releases
//! all bookkeeping and never a data buffer.

use std::cell::RefCell;
use std::collections::HashSet;
use std::ffi::{c_char, c_double, c_int, c_void, CStr};
use std::marker::PhantomData;
use std::mem::size_of_val;
use std::ptr;
use std::slice;

use indexmap::IndexMap;
use log::trace;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use warpx_core::{Direction, FieldKind, ParticleComponent, ParticleRecord};
use warpx_ffi::{EngineApi, EngineTable};

const COMPONENTS: usize = ParticleComponent::ALL.len();

/// A deliberate engine misbehaviour, for exercising the binding's checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    /// Particle accessors report `-1` tiles.
    NegativeTileCount,
    /// Mesh accessors report `-1` ghost cells.
    NegativeGhostCount,
    /// Mesh accessors report `-1` as the first extent of every grid.
    NegativeGridExtent,
    /// Mesh accessors report `c_int::MAX` for every extent, so the cell
    /// count of a grid does not fit in `usize`.
    OversizedGridExtent,
}

/// One `evolve`/`push` call as the mock saw it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Advance {
    pub export: &'static str,
    pub level: i32,
    pub dt: f64,
}

/// One `fill_boundary` call as the mock saw it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundaryFill {
    pub export: &'static str,
    pub level: i32,
    pub force: bool,
}

#[derive(Clone, Debug)]
struct MockConfig {
    tile_size: usize,
    ghosts: usize,
    levels: Vec<Vec<[usize; 3]>>,
    max_steps: i32,
    stop_time: f64,
    check_interval: i32,
    plot_interval: i32,
    dt: f64,
    seed: u64,
    fault: Option<Fault>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            tile_size: 4,
            ghosts: 1,
            levels: Vec::new(),
            max_steps: 100,
            stop_time: 1.0e-6,
            check_interval: 10,
            plot_interval: 5,
            dt: 1.0e-9,
            seed: 7,
            fault: None,
        }
    }
}

/// Builder for a thread-local [`MockEngine`].
#[derive(Clone, Debug, Default)]
pub struct MockEngineBuilder {
    config: MockConfig,
}

impl MockEngineBuilder {
    /// Particles per tile before a new tile is started.
    pub fn tile_size(mut self, n: usize) -> Self {
        self.config.tile_size = n.max(1);
        self
    }

    /// Ghost cells per side on every grid.
    pub fn ghosts(mut self, n: usize) -> Self {
        self.config.ghosts = n;
        self
    }

    /// Append an AMR level with the given interior extents, one per grid.
    ///
    /// Without any call, a single level with two grids is used.
    pub fn level(mut self, grids: impl IntoIterator<Item = [usize; 3]>) -> Self {
        self.config.levels.push(grids.into_iter().collect());
        self
    }

    pub fn max_steps(mut self, n: i32) -> Self {
        self.config.max_steps = n;
        self
    }

    pub fn stop_time(mut self, t: f64) -> Self {
        self.config.stop_time = t;
        self
    }

    pub fn check_interval(mut self, n: i32) -> Self {
        self.config.check_interval = n;
        self
    }

    pub fn plot_interval(mut self, n: i32) -> Self {
        self.config.plot_interval = n;
        self
    }

    /// Initial time step on every level.
    pub fn dt(mut self, dt: f64) -> Self {
        self.config.dt = dt;
        self
    }

    /// Seed for the grid contents.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn fault(mut self, fault: Fault) -> Self {
        self.config.fault = Some(fault);
        self
    }

    /// Replace this thread's engine state.
    pub fn install(self) -> MockEngine {
        let mut config = self.config;
        if config.levels.is_empty() {
            config.levels.push(vec![[4, 4, 4], [2, 3, 5]]);
        }
        let state = MockState::new(config);
        STATE.with(|s| *s.borrow_mut() = state);
        MockEngine {
            _thread_local: PhantomData,
        }
    }
}

/// Handle to this thread's mock engine, for building an `EngineApi` and
/// inspecting what the binding did.
#[derive(Debug)]
pub struct MockEngine {
    _thread_local: PhantomData<*const ()>,
}

impl MockEngine {
    pub fn builder() -> MockEngineBuilder {
        MockEngineBuilder::default()
    }

    /// Install the default configuration.
    pub fn install_default() -> Self {
        Self::builder().install()
    }

    /// The function table for this thread's engine.
    pub fn table() -> EngineTable {
        EngineTable {
            init: mock_init,
            get_istep: mock_get_istep,
            set_istep: mock_set_istep,
            get_t_new: mock_get_t_new,
            set_t_new: mock_set_t_new,
            get_dt: mock_get_dt,
            max_step: mock_max_step,
            stop_time: mock_stop_time,
            check_int: mock_check_int,
            plot_int: mock_plot_int,
            finest_level: mock_finest_level,
            evolve_e: mock_evolve_e,
            evolve_b: mock_evolve_b,
            fill_boundary_e: mock_fill_boundary_e,
            fill_boundary_b: mock_fill_boundary_b,
            push_particles_and_deposit: mock_push_particles_and_deposit,
            add_particles: mock_add_particles,
            get_particle_structs: mock_get_particle_structs,
            get_particle_arrays: mock_get_particle_arrays,
            get_e_field: mock_get_e_field,
            get_b_field: mock_get_b_field,
            get_current_density: mock_get_current_density,
            free: mock_free,
        }
    }

    /// An uninitialized engine handle over [`table`](Self::table).
    pub fn api(&self) -> EngineApi {
        EngineApi::from_table(Self::table())
    }

    /// Times `export` (its C symbol name) has been called.
    pub fn calls(&self, export: &str) -> usize {
        with_state(|s| s.calls.get(export).copied().unwrap_or(0))
    }

    /// Calls to any export other than `free`.
    pub fn total_calls(&self) -> usize {
        with_state(|s| s.calls.values().sum())
    }

    /// Arguments `amrex_init` received, if it has run.
    pub fn argv(&self) -> Option<Vec<String>> {
        with_state(|s| s.argv.clone())
    }

    /// Whether `argv[argc]` was a null pointer at init.
    pub fn argv_null_terminated(&self) -> bool {
        with_state(|s| s.argv_null_terminated)
    }

    /// Bookkeeping arrays handed out and not yet released.
    pub fn outstanding_bookkeeping(&self) -> usize {
        with_state(|s| s.outstanding.len())
    }

    /// Bookkeeping arrays released through the table.
    pub fn released_bookkeeping(&self) -> usize {
        with_state(|s| s.released)
    }

    /// Attempts to release a particle or grid data buffer.
    pub fn data_buffer_frees(&self) -> usize {
        with_state(|s| s.data_frees)
    }

    /// Attempts to release a pointer the mock never handed out.
    pub fn unknown_frees(&self) -> usize {
        with_state(|s| s.unknown_frees)
    }

    /// Level, species or component indices forwarded to the engine that
    /// it could not serve, in call order.
    pub fn unserved_indices(&self) -> Vec<i32> {
        with_state(|s| s.unserved.clone())
    }

    /// `unique_particles` flag of the last injection.
    pub fn last_unique(&self) -> Option<bool> {
        with_state(|s| s.last_unique)
    }

    /// Attribute count of the last injection.
    pub fn last_attribute_count(&self) -> Option<i32> {
        with_state(|s| s.last_attribute_count)
    }

    pub fn tile_count(&self, species: i32) -> usize {
        with_state(|s| s.species.get(&species).map_or(0, Vec::len))
    }

    pub fn particle_count(&self, species: i32) -> usize {
        with_state(|s| {
            s.species
                .get(&species)
                .map_or(0, |tiles| tiles.iter().map(|t| t.records.len()).sum())
        })
    }

    /// Every record of `species`, tiles concatenated in order.
    pub fn records(&self, species: i32) -> Vec<ParticleRecord> {
        with_state(|s| {
            s.species
                .get(&species)
                .map(|tiles| tiles.iter().flat_map(|t| t.records.iter().copied()).collect())
                .unwrap_or_default()
        })
    }

    /// Every value of `component` for `species`, tiles concatenated.
    pub fn component(&self, species: i32, component: ParticleComponent) -> Vec<f64> {
        let c = component.index() as usize;
        with_state(|s| {
            s.species
                .get(&species)
                .map(|tiles| {
                    tiles
                        .iter()
                        .flat_map(|t| t.components[c].iter().copied())
                        .collect()
                })
                .unwrap_or_default()
        })
    }

    /// Full extents (ghosts included) of every grid at `level`.
    pub fn grid_shapes(&self, level: usize) -> Vec<[usize; 3]> {
        with_state(|s| s.levels.get(level).map(|l| l.shapes.clone()).unwrap_or_default())
    }

    /// Copy of one grid buffer, C order, ghosts included.
    pub fn grid_values(
        &self,
        kind: FieldKind,
        level: usize,
        direction: Direction,
        grid: usize,
    ) -> Vec<f64> {
        with_state(|s| {
            s.levels
                .get(level)
                .and_then(|l| l.data[kind_index(kind)][direction.index() as usize].get(grid))
                .cloned()
                .unwrap_or_default()
        })
    }

    pub fn advances(&self) -> Vec<Advance> {
        with_state(|s| s.advances.clone())
    }

    pub fn boundary_fills(&self) -> Vec<BoundaryFill> {
        with_state(|s| s.boundary_fills.clone())
    }
}

// ── State ──────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Tile {
    records: Vec<ParticleRecord>,
    components: [Vec<f64>; COMPONENTS],
}

#[derive(Debug, Default)]
struct LevelGrids {
    /// Full extents per grid.
    shapes: Vec<[usize; 3]>,
    /// `[kind][direction][grid]`.
    data: [[Vec<Vec<f64>>; 3]; 3],
}

#[derive(Debug)]
struct MockState {
    config: MockConfig,
    calls: IndexMap<&'static str, usize>,
    argv: Option<Vec<String>>,
    argv_null_terminated: bool,
    species: IndexMap<i32, Vec<Tile>>,
    next_id: i32,
    levels: Vec<LevelGrids>,
    steps: Vec<i32>,
    times: Vec<f64>,
    dts: Vec<f64>,
    outstanding: HashSet<usize>,
    released: usize,
    data_frees: usize,
    unknown_frees: usize,
    unserved: Vec<i32>,
    last_unique: Option<bool>,
    last_attribute_count: Option<i32>,
    advances: Vec<Advance>,
    boundary_fills: Vec<BoundaryFill>,
}

thread_local! {
    static STATE: RefCell<MockState> = RefCell::new(MockState::new(MockConfig {
        levels: vec![vec![[4, 4, 4]]],
        ..MockConfig::default()
    }));
}

fn with_state<R>(f: impl FnOnce(&mut MockState) -> R) -> R {
    STATE.with(|s| f(&mut s.borrow_mut()))
}

fn kind_index(kind: FieldKind) -> usize {
    match kind {
        FieldKind::Electric => 0,
        FieldKind::Magnetic => 1,
        FieldKind::CurrentDensity => 2,
    }
}

impl MockState {
    fn new(config: MockConfig) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let g = config.ghosts;
        let levels: Vec<LevelGrids> = config
            .levels
            .iter()
            .map(|interiors| {
                let mut level = LevelGrids::default();
                level.shapes = interiors
                    .iter()
                    .map(|e| [e[0] + 2 * g, e[1] + 2 * g, e[2] + 2 * g])
                    .collect();
                for per_kind in &mut level.data {
                    for per_direction in per_kind.iter_mut() {
                        *per_direction = level
                            .shapes
                            .iter()
                            .map(|s| {
                                (0..s[0] * s[1] * s[2])
                                    .map(|_| rng.random_range(-1.0_f64..1.0))
                                    .collect()
                            })
                            .collect();
                    }
                }
                level
            })
            .collect();
        let n = levels.len();
        Self {
            steps: vec![0; n],
            times: vec![0.0; n],
            dts: vec![config.dt; n],
            config,
            calls: IndexMap::new(),
            argv: None,
            argv_null_terminated: false,
            species: IndexMap::new(),
            next_id: 1,
            levels,
            outstanding: HashSet::new(),
            released: 0,
            data_frees: 0,
            unknown_frees: 0,
            unserved: Vec::new(),
            last_unique: None,
            last_attribute_count: None,
            advances: Vec::new(),
            boundary_fills: Vec::new(),
        }
    }

    fn hit(&mut self, export: &'static str) {
        *self.calls.entry(export).or_insert(0) += 1;
    }

    /// Index of `level` if it exists, recording it as unserved otherwise.
    fn level(&mut self, level: c_int) -> Option<usize> {
        match usize::try_from(level) {
            Ok(l) if l < self.levels.len() => Some(l),
            _ => {
                self.unserved.push(level);
                None
            }
        }
    }

    /// Copy `items` into a fresh tracked `malloc` block. Empty input
    /// yields null.
    fn allocate<T: Copy>(&mut self, items: &[T]) -> *mut T {
        if items.is_empty() {
            return ptr::null_mut();
        }
        // SAFETY: non-zero size; malloc alignment covers ints and pointers.
        let p = unsafe { libc::malloc(size_of_val(items)) }.cast::<T>();
        if p.is_null() {
            return p;
        }
        // SAFETY: `p` holds room for `items.len()` elements and does not
        // overlap `items`.
        unsafe { ptr::copy_nonoverlapping(items.as_ptr(), p, items.len()) };
        self.outstanding.insert(p as usize);
        p
    }

    fn is_data_buffer(&self, addr: usize) -> bool {
        let in_tiles = self.species.values().flatten().any(|t| {
            t.records.as_ptr() as usize == addr
                || t.components.iter().any(|c| c.as_ptr() as usize == addr)
        });
        let in_grids = self.levels.iter().any(|l| {
            l.data
                .iter()
                .flatten()
                .flatten()
                .any(|g| g.as_ptr() as usize == addr)
        });
        in_tiles || in_grids
    }

    fn inject(&mut self, species: i32, columns: [&[f64]; 6], attributes: &[f64], nattr: usize) {
        let [x, y, z, ux, uy, uz] = columns;
        let tile_size = self.config.tile_size;
        let tiles = self.species.entry(species).or_default();
        for i in 0..x.len() {
            if tiles.last().is_none_or(|t| t.records.len() >= tile_size) {
                tiles.push(Tile::default());
            }
            let Some(tile) = tiles.last_mut() else {
                return;
            };
            let id = self.next_id;
            self.next_id += 1;
            tile.records.push(ParticleRecord {
                x: x[i],
                y: y[i],
                z: z[i],
                id,
                cpu: 0,
            });
            let weight = if nattr > 0 { attributes[i * nattr] } else { 1.0 };
            tile.components[0].push(weight);
            tile.components[1].push(ux[i]);
            tile.components[2].push(uy[i]);
            tile.components[3].push(uz[i]);
            // Gathered fields: distinct per particle and component.
            for (c, values) in tile.components.iter_mut().enumerate().skip(4) {
                values.push(f64::from(id) + c as f64 / 10.0);
            }
        }
    }

    /// Write the tile outputs and return the pointer table.
    fn report_tiles<T>(
        &mut self,
        tiles: Vec<(*mut T, c_int)>,
        num_tiles: *mut c_int,
        counts: *mut *mut c_int,
    ) -> *mut *mut T {
        let (pointers, lens): (Vec<*mut T>, Vec<c_int>) = tiles.into_iter().unzip();
        let reported = if self.config.fault == Some(Fault::NegativeTileCount) {
            -1
        } else {
            pointers.len() as c_int
        };
        let lens = self.allocate(&lens);
        let pointers = self.allocate(&pointers);
        // SAFETY: out-parameters are valid per the export's contract.
        unsafe {
            if !num_tiles.is_null() {
                *num_tiles = reported;
            }
            if !counts.is_null() {
                *counts = lens;
            }
        }
        pointers
    }

    fn report_grids(
        &mut self,
        kind: FieldKind,
        level: c_int,
        direction: c_int,
        num_grids: *mut c_int,
        ngrow: *mut c_int,
        shapes: *mut *mut c_int,
    ) -> *mut *mut c_double {
        let served = match (self.level(level), Direction::from_index(direction)) {
            (Some(l), Some(d)) => Some((l, d.index() as usize)),
            (Some(_), None) => {
                self.unserved.push(direction);
                None
            }
            (None, _) => None,
        };
        let (pointers, extents) = match served {
            Some((l, d)) => {
                let level = &mut self.levels[l];
                let pointers: Vec<*mut c_double> = level.data[kind_index(kind)][d]
                    .iter_mut()
                    .map(|g| g.as_mut_ptr())
                    .collect();
                let extents: Vec<c_int> = level
                    .shapes
                    .iter()
                    .flat_map(|s| s.map(|e| e as c_int))
                    .collect();
                (pointers, extents)
            }
            None => (Vec::new(), Vec::new()),
        };
        let mut extents = extents;
        if self.config.fault == Some(Fault::NegativeGridExtent) {
            extents.iter_mut().step_by(3).for_each(|e| *e = -1);
        }
        if self.config.fault == Some(Fault::OversizedGridExtent) {
            extents.iter_mut().for_each(|e| *e = c_int::MAX);
        }
        let ghosts = if self.config.fault == Some(Fault::NegativeGhostCount) {
            -1
        } else {
            self.config.ghosts as c_int
        };
        let count = pointers.len() as c_int;
        let extents = self.allocate(&extents);
        let pointers = self.allocate(&pointers);
        // SAFETY: out-parameters are valid per the export's contract.
        unsafe {
            if !num_grids.is_null() {
                *num_grids = count;
            }
            if !ngrow.is_null() {
                *ngrow = ghosts;
            }
            if !shapes.is_null() {
                *shapes = extents;
            }
        }
        pointers
    }
}

// ── Exports ────────────────────────────────────────────────────────

unsafe extern "C" fn mock_init(argc: c_int, argv: *mut *mut c_char) {
    let n = usize::try_from(argc).unwrap_or(0);
    let mut args = Vec::with_capacity(n);
    let mut terminated = false;
    if !argv.is_null() {
        for i in 0..n {
            // SAFETY: the caller passes `argc` valid C strings.
            let arg = unsafe { CStr::from_ptr(*argv.add(i)) };
            args.push(arg.to_string_lossy().into_owned());
        }
        // SAFETY: a conforming argv has a slot at `argc`.
        terminated = unsafe { (*argv.add(n)).is_null() };
    }
    with_state(|s| {
        s.hit("amrex_init");
        s.argv = Some(args);
        s.argv_null_terminated = terminated;
    });
}

unsafe extern "C" fn mock_get_istep(level: c_int) -> c_int {
    with_state(|s| {
        s.hit("warpx_getistep");
        s.level(level).map_or(0, |l| s.steps[l])
    })
}

unsafe extern "C" fn mock_set_istep(level: c_int, step: c_int) {
    with_state(|s| {
        s.hit("warpx_setistep");
        if let Some(l) = s.level(level) {
            s.steps[l] = step;
        }
    });
}

unsafe extern "C" fn mock_get_t_new(level: c_int) -> c_double {
    with_state(|s| {
        s.hit("warpx_gett_new");
        s.level(level).map_or(0.0, |l| s.times[l])
    })
}

unsafe extern "C" fn mock_set_t_new(level: c_int, time: c_double) {
    with_state(|s| {
        s.hit("warpx_sett_new");
        if let Some(l) = s.level(level) {
            s.times[l] = time;
        }
    });
}

unsafe extern "C" fn mock_get_dt(level: c_int) -> c_double {
    with_state(|s| {
        s.hit("warpx_getdt");
        s.level(level).map_or(0.0, |l| s.dts[l])
    })
}

unsafe extern "C" fn mock_max_step() -> c_int {
    with_state(|s| {
        s.hit("warpx_maxStep");
        s.config.max_steps
    })
}

unsafe extern "C" fn mock_stop_time() -> c_double {
    with_state(|s| {
        s.hit("warpx_stopTime");
        s.config.stop_time
    })
}

unsafe extern "C" fn mock_check_int() -> c_int {
    with_state(|s| {
        s.hit("warpx_checkInt");
        s.config.check_interval
    })
}

unsafe extern "C" fn mock_plot_int() -> c_int {
    with_state(|s| {
        s.hit("warpx_plotInt");
        s.config.plot_interval
    })
}

unsafe extern "C" fn mock_finest_level() -> c_int {
    with_state(|s| {
        s.hit("warpx_finestLevel");
        s.levels.len() as c_int - 1
    })
}

fn advance(export: &'static str, level: c_int, dt: c_double) {
    with_state(|s| {
        s.hit(export);
        if s.level(level).is_some() {
            s.advances.push(Advance { export, level, dt });
        }
    });
}

unsafe extern "C" fn mock_evolve_e(level: c_int, dt: c_double) {
    advance("warpx_EvolveE", level, dt);
}

unsafe extern "C" fn mock_evolve_b(level: c_int, dt: c_double) {
    advance("warpx_EvolveB", level, dt);
}

fn fill_boundary(export: &'static str, level: c_int, force: bool) {
    with_state(|s| {
        s.hit(export);
        if s.level(level).is_some() {
            s.boundary_fills.push(BoundaryFill {
                export,
                level,
                force,
            });
        }
    });
}

unsafe extern "C" fn mock_fill_boundary_e(level: c_int, force: bool) {
    fill_boundary("warpx_FillBoundaryE", level, force);
}

unsafe extern "C" fn mock_fill_boundary_b(level: c_int, force: bool) {
    fill_boundary("warpx_FillBoundaryB", level, force);
}

/// Drift every particle by its momentum.
unsafe extern "C" fn mock_push_particles_and_deposit(level: c_int, dt: c_double) {
    advance("warpx_PushParticlesandDepose", level, dt);
    with_state(|s| {
        for tile in s.species.values_mut().flatten() {
            let Tile {
                records,
                components,
            } = tile;
            for (i, r) in records.iter_mut().enumerate() {
                r.x += components[1][i] * dt;
                r.y += components[2][i] * dt;
                r.z += components[3][i] * dt;
            }
        }
    });
}

#[allow(clippy::too_many_arguments)]
unsafe extern "C" fn mock_add_particles(
    species: c_int,
    n: c_int,
    x: *const c_double,
    y: *const c_double,
    z: *const c_double,
    ux: *const c_double,
    uy: *const c_double,
    uz: *const c_double,
    nattr: c_int,
    attributes: *const c_double,
    unique: c_int,
) {
    let count = usize::try_from(n).unwrap_or(0);
    let na = usize::try_from(nattr).unwrap_or(0);
    // SAFETY: the caller passes `count` readable doubles per column and
    // `count * nattr` attributes.
    let columns = unsafe {
        [
            read(x, count),
            read(y, count),
            read(z, count),
            read(ux, count),
            read(uy, count),
            read(uz, count),
        ]
    };
    // SAFETY: as above.
    let attributes = unsafe { read(attributes, count * na) };
    with_state(|s| {
        s.hit("addNParticles");
        s.last_unique = Some(unique != 0);
        s.last_attribute_count = Some(nattr);
        if species < 0 {
            s.unserved.push(species);
            return;
        }
        if columns.iter().any(|c| c.len() != count) || attributes.len() != count * na {
            return;
        }
        trace!("mock: {count} particle(s) into species {species}");
        s.inject(species, columns, attributes, na);
    });
}

unsafe extern "C" fn mock_get_particle_structs(
    species: c_int,
    num_tiles: *mut c_int,
    counts: *mut *mut c_int,
) -> *mut *mut ParticleRecord {
    with_state(|s| {
        s.hit("warpx_getParticleStructs");
        let tiles: Vec<(*mut ParticleRecord, c_int)> = match s.species.get_mut(&species) {
            Some(tiles) => tiles
                .iter_mut()
                .map(|t| (t.records.as_mut_ptr(), t.records.len() as c_int))
                .collect(),
            None => {
                if species < 0 {
                    s.unserved.push(species);
                }
                Vec::new()
            }
        };
        s.report_tiles(tiles, num_tiles, counts)
    })
}

unsafe extern "C" fn mock_get_particle_arrays(
    species: c_int,
    component: c_int,
    num_tiles: *mut c_int,
    counts: *mut *mut c_int,
) -> *mut *mut c_double {
    with_state(|s| {
        s.hit("warpx_getParticleArrays");
        let c = match ParticleComponent::from_index(component) {
            Some(c) => c.index() as usize,
            None => {
                s.unserved.push(component);
                return s.report_tiles(Vec::new(), num_tiles, counts);
            }
        };
        let tiles: Vec<(*mut c_double, c_int)> = match s.species.get_mut(&species) {
            Some(tiles) => tiles
                .iter_mut()
                .map(|t| (t.components[c].as_mut_ptr(), t.components[c].len() as c_int))
                .collect(),
            None => {
                if species < 0 {
                    s.unserved.push(species);
                }
                Vec::new()
            }
        };
        s.report_tiles(tiles, num_tiles, counts)
    })
}

unsafe extern "C" fn mock_get_e_field(
    level: c_int,
    direction: c_int,
    num_grids: *mut c_int,
    ngrow: *mut c_int,
    shapes: *mut *mut c_int,
) -> *mut *mut c_double {
    with_state(|s| {
        s.hit("warpx_getEfield");
        s.report_grids(FieldKind::Electric, level, direction, num_grids, ngrow, shapes)
    })
}

unsafe extern "C" fn mock_get_b_field(
    level: c_int,
    direction: c_int,
    num_grids: *mut c_int,
    ngrow: *mut c_int,
    shapes: *mut *mut c_int,
) -> *mut *mut c_double {
    with_state(|s| {
        s.hit("warpx_getBfield");
        s.report_grids(FieldKind::Magnetic, level, direction, num_grids, ngrow, shapes)
    })
}

unsafe extern "C" fn mock_get_current_density(
    level: c_int,
    direction: c_int,
    num_grids: *mut c_int,
    ngrow: *mut c_int,
    shapes: *mut *mut c_int,
) -> *mut *mut c_double {
    with_state(|s| {
        s.hit("warpx_getCurrentDensity");
        s.report_grids(
            FieldKind::CurrentDensity,
            level,
            direction,
            num_grids,
            ngrow,
            shapes,
        )
    })
}

/// # Safety
///
/// Unless `len == 0` or `p` is null, `p` must point to `len` readable
/// doubles that outlive `'a`.
unsafe fn read<'a>(p: *const c_double, len: usize) -> &'a [f64] {
    if len == 0 || p.is_null() {
        &[]
    } else {
        // SAFETY: forwarded contract.
        unsafe { slice::from_raw_parts(p, len) }
    }
}

/// Release routine: frees tracked bookkeeping, records everything else.
unsafe extern "C" fn mock_free(ptr: *mut c_void) {
    if ptr.is_null() {
        return;
    }
    let addr = ptr as usize;
    let owned = with_state(|s| {
        if s.outstanding.remove(&addr) {
            s.released += 1;
            true
        } else {
            if s.is_data_buffer(addr) {
                s.data_frees += 1;
            } else {
                s.unknown_frees += 1;
            }
            false
        }
    });
    if owned {
        // SAFETY: `addr` came from `malloc` in `allocate` and was still
        // outstanding.
        unsafe { libc::free(ptr) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_allocate_tracked_bookkeeping() {
        let mock = MockEngine::builder().level([[2, 2, 2]]).ghosts(0).install();
        let table = MockEngine::table();
        let mut n: c_int = 0;
        let mut g: c_int = 0;
        let mut shapes: *mut c_int = ptr::null_mut();
        // SAFETY: out-parameters are live locals.
        let p = unsafe { (table.get_e_field)(0, 0, &mut n, &mut g, &mut shapes) };
        assert_eq!(n, 1);
        assert_eq!(g, 0);
        assert_eq!(mock.outstanding_bookkeeping(), 2);
        // SAFETY: both came from the mock's allocator.
        unsafe {
            assert_eq!(std::slice::from_raw_parts(shapes, 3), [2, 2, 2]);
            (table.free)(shapes.cast());
            (table.free)(p.cast());
        }
        assert_eq!(mock.outstanding_bookkeeping(), 0);
        assert_eq!(mock.released_bookkeeping(), 2);
    }

    #[test]
    fn freeing_a_grid_buffer_is_recorded_not_performed() {
        let mock = MockEngine::builder().level([[1, 1, 1]]).install();
        let table = MockEngine::table();
        let (mut n, mut g): (c_int, c_int) = (0, 0);
        let mut shapes: *mut c_int = ptr::null_mut();
        // SAFETY: as above.
        unsafe {
            let p = (table.get_b_field)(0, 1, &mut n, &mut g, &mut shapes);
            let grid = *p;
            (table.free)(grid.cast());
            (table.free)(shapes.cast());
            (table.free)(p.cast());
        }
        assert_eq!(mock.data_buffer_frees(), 1);
        assert_eq!(mock.outstanding_bookkeeping(), 0);
    }

    #[test]
    fn particles_fill_tiles_in_order() {
        let mock = MockEngine::builder().tile_size(2).install();
        let v = [0.0, 1.0, 2.0];
        let table = MockEngine::table();
        // SAFETY: every column holds three values; no attributes.
        unsafe {
            (table.add_particles)(
                0,
                3,
                v.as_ptr(),
                v.as_ptr(),
                v.as_ptr(),
                v.as_ptr(),
                v.as_ptr(),
                v.as_ptr(),
                0,
                ptr::null(),
                1,
            )
        };
        assert_eq!(mock.tile_count(0), 2);
        assert_eq!(mock.particle_count(0), 3);
        assert_eq!(mock.component(0, ParticleComponent::Weight), [1.0; 3]);
        let ids: Vec<i32> = mock.records(0).iter().map(|r| r.id).collect();
        assert_eq!(ids, [1, 2, 3]);
        assert_eq!(mock.last_unique(), Some(true));
    }

    #[test]
    fn unknown_levels_are_recorded() {
        let mock = MockEngine::install_default();
        // SAFETY: scalar call.
        let step = unsafe { (MockEngine::table().get_istep)(9) };
        assert_eq!(step, 0);
        assert_eq!(mock.unserved_indices(), [9]);
    }
}
