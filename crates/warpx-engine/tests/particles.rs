//! Integration test: particle injection and zero-copy retrieval against the
//! mock engine.

use ndarray::{Array2, ShapeBuilder};
use warpx_core::{BindingError, Level, ParticleComponent, SpeciesId};
use warpx_engine::{BindingConfig, ParticleBatch, Simulation};
use warpx_view::{ParticleColumn, ScalarTile};
use warpx_test_utils::{init_logging, random_particles, Fault, MockEngine, RandomParticles};

const ELECTRONS: SpeciesId = SpeciesId(0);

fn start(mock: &MockEngine) -> Simulation {
    init_logging();
    Simulation::init(mock.api(), BindingConfig::default(), &["warpx"]).unwrap()
}

fn inject(sim: &mut Simulation, species: SpeciesId, p: &RandomParticles) {
    let weights = Array2::from_shape_vec((p.len(), 1), p.weights.clone()).unwrap();
    let batch = ParticleBatch::new(&p.x, &p.y, &p.z, &p.ux, &p.uy, &p.uz)
        .with_attributes(weights.view())
        .unique(true);
    sim.add_particles(species, &batch).unwrap();
}

fn flat(columns: Vec<ParticleColumn<'_, f64>>) -> Vec<f64> {
    columns.iter().flat_map(|c| c.to_vec()).collect()
}

// ── Empty species ────────────────────────────────────────────────────

#[test]
fn zero_particles_yield_empty_results() {
    let mock = MockEngine::install_default();
    let mut sim = start(&mock);

    assert!(sim.particle_structs(ELECTRONS).unwrap().is_empty());
    assert!(sim.particle_weight(ELECTRONS).unwrap().is_empty());
    assert!(sim.particle_x(ELECTRONS).unwrap().is_empty());

    // An empty injection reaches the engine but creates nothing.
    let empty: [f64; 0] = [];
    let batch = ParticleBatch::new(&empty, &empty, &empty, &empty, &empty, &empty);
    sim.add_particles(ELECTRONS, &batch).unwrap();
    assert_eq!(mock.calls("addNParticles"), 1);
    assert!(sim.particle_structs(ELECTRONS).unwrap().is_empty());
    assert!(sim
        .particle_arrays(ELECTRONS, ParticleComponent::Bz)
        .unwrap()
        .is_empty());
    assert_eq!(mock.outstanding_bookkeeping(), 0);
}

// ── Injection ────────────────────────────────────────────────────────

#[test]
fn injected_particles_are_split_into_tiles_in_order() {
    let mock = MockEngine::builder().tile_size(4).install();
    let mut sim = start(&mock);
    let p = random_particles(1, 10);
    inject(&mut sim, ELECTRONS, &p);

    let tiles = sim.particle_structs(ELECTRONS).unwrap();
    let lens: Vec<usize> = tiles.iter().map(|t| t.len()).collect();
    assert_eq!(lens, [4, 4, 2]);

    let xs: Vec<f64> = tiles.iter().flat_map(|t| t.x().to_vec()).collect();
    assert_eq!(xs, p.x);
    let weights: Vec<f64> = sim
        .particle_weight(ELECTRONS)
        .unwrap()
        .iter()
        .flat_map(|t| t.to_vec())
        .collect();
    assert_eq!(weights, p.weights);
    assert_eq!(mock.last_unique(), Some(true));
    assert_eq!(mock.last_attribute_count(), Some(1));
}

#[test]
fn mismatched_lengths_never_reach_the_engine() {
    let mock = MockEngine::install_default();
    let mut sim = start(&mock);
    let p = random_particles(2, 5);
    let short = &p.uz[..4];
    let batch = ParticleBatch::new(&p.x, &p.y, &p.z, &p.ux, &p.uy, short);

    let err = sim.add_particles(ELECTRONS, &batch).unwrap_err();
    assert_eq!(
        err,
        BindingError::LengthMismatch {
            what: "uz",
            expected: 5,
            actual: 4
        }
    );
    assert_eq!(mock.calls("addNParticles"), 0);

    let attrs = Array2::<f64>::zeros((3, 2));
    let batch =
        ParticleBatch::new(&p.x, &p.y, &p.z, &p.ux, &p.uy, &p.uz).with_attributes(attrs.view());
    assert!(matches!(
        sim.add_particles(ELECTRONS, &batch),
        Err(BindingError::LengthMismatch {
            what: "attribute rows",
            ..
        })
    ));
    assert_eq!(mock.calls("addNParticles"), 0);
}

#[test]
fn column_major_attributes_are_reordered() {
    let mock = MockEngine::install_default();
    let mut sim = start(&mock);
    let p = random_particles(3, 3);
    // Weight in column 0, a second attribute in column 1, stored Fortran
    // order so the first column is contiguous.
    let mut values = p.weights.clone();
    values.extend([7.0, 8.0, 9.0]);
    let attrs = Array2::from_shape_vec((3, 2).f(), values).unwrap();
    let batch =
        ParticleBatch::new(&p.x, &p.y, &p.z, &p.ux, &p.uy, &p.uz).with_attributes(attrs.view());
    sim.add_particles(ELECTRONS, &batch).unwrap();

    assert_eq!(mock.last_attribute_count(), Some(2));
    assert_eq!(mock.component(0, ParticleComponent::Weight), p.weights);
}

#[test]
fn species_are_independent() {
    let mock = MockEngine::install_default();
    let mut sim = start(&mock);
    inject(&mut sim, SpeciesId(0), &random_particles(4, 3));
    inject(&mut sim, SpeciesId(1), &random_particles(5, 6));
    assert_eq!(mock.particle_count(0), 3);
    assert_eq!(mock.particle_count(1), 6);
    let n: usize = sim
        .particle_structs(SpeciesId(1))
        .unwrap()
        .iter()
        .map(|t| t.len())
        .sum();
    assert_eq!(n, 6);
}

// ── Aliasing and write-through ───────────────────────────────────────

#[test]
fn structured_writes_are_visible_through_named_columns() {
    let mock = MockEngine::builder().tile_size(3).install();
    let mut sim = start(&mock);
    inject(&mut sim, ELECTRONS, &random_particles(6, 5));

    let tiles = sim.particle_structs(ELECTRONS).unwrap();
    let mut r = tiles[1].get(0).unwrap();
    r.x = 42.0;
    r.cpu = 7;
    tiles[1].set(0, r);

    let xs = sim.particle_x(ELECTRONS).unwrap();
    assert_eq!(xs[1].get(0), Some(42.0));
    let cpus = sim.particle_cpu(ELECTRONS).unwrap();
    assert_eq!(cpus[1].get(0), Some(7));
}

#[test]
fn named_column_writes_are_visible_through_records() {
    let mock = MockEngine::builder().tile_size(8).install();
    let mut sim = start(&mock);
    inject(&mut sim, ELECTRONS, &random_particles(7, 4));

    let zs = sim.particle_z(ELECTRONS).unwrap();
    zs[0].fill(-1.0);
    sim.particle_id(ELECTRONS).unwrap()[0].set(2, 900);

    let records = sim.particle_structs(ELECTRONS).unwrap()[0].to_vec();
    assert!(records.iter().all(|r| r.z == -1.0));
    assert_eq!(records[2].id, 900);
    // The engine's storage is what changed.
    assert_eq!(mock.records(0)[2].id, 900);
}

#[test]
fn scalar_writes_land_in_engine_storage() {
    let mock = MockEngine::install_default();
    let mut sim = start(&mock);
    inject(&mut sim, ELECTRONS, &random_particles(8, 2));

    for tile in sim.particle_ux(ELECTRONS).unwrap() {
        tile.fill(0.25);
    }
    assert_eq!(mock.component(0, ParticleComponent::Ux), [0.25, 0.25]);
}

#[test]
fn named_accessors_match_the_general_accessor() {
    let mock = MockEngine::builder().tile_size(2).install();
    let mut sim = start(&mock);
    inject(&mut sim, ELECTRONS, &random_particles(9, 5));

    type Named = fn(&Simulation, SpeciesId) -> Result<Vec<ScalarTile<'_>>, BindingError>;
    let named: [(ParticleComponent, Named); 10] = [
        (ParticleComponent::Weight, Simulation::particle_weight),
        (ParticleComponent::Ux, Simulation::particle_ux),
        (ParticleComponent::Uy, Simulation::particle_uy),
        (ParticleComponent::Uz, Simulation::particle_uz),
        (ParticleComponent::Ex, Simulation::particle_ex),
        (ParticleComponent::Ey, Simulation::particle_ey),
        (ParticleComponent::Ez, Simulation::particle_ez),
        (ParticleComponent::Bx, Simulation::particle_bx),
        (ParticleComponent::By, Simulation::particle_by),
        (ParticleComponent::Bz, Simulation::particle_bz),
    ];
    for (component, accessor) in named {
        let general = sim.particle_arrays(ELECTRONS, component).unwrap();
        let aliased = accessor(&sim, ELECTRONS).unwrap();
        assert_eq!(general.len(), aliased.len(), "{component}");
        for (g, a) in general.iter().zip(&aliased) {
            assert_eq!(g.to_vec(), a.to_vec(), "{component}");
            assert_eq!(g.as_ptr(), a.as_ptr(), "{component}");
            assert_eq!(a.component(), component);
        }
    }
}

#[test]
fn position_columns_project_records() {
    let mock = MockEngine::builder().tile_size(3).install();
    let mut sim = start(&mock);
    let p = random_particles(10, 7);
    inject(&mut sim, ELECTRONS, &p);

    assert_eq!(flat(sim.particle_x(ELECTRONS).unwrap()), p.x);
    assert_eq!(flat(sim.particle_y(ELECTRONS).unwrap()), p.y);
    assert_eq!(flat(sim.particle_z(ELECTRONS).unwrap()), p.z);
    let ids: Vec<i32> = sim
        .particle_id(ELECTRONS)
        .unwrap()
        .iter()
        .flat_map(|c| c.to_vec())
        .collect();
    assert_eq!(ids, (1..=7).collect::<Vec<_>>());
    // One engine call per projection.
    assert_eq!(mock.calls("warpx_getParticleStructs"), 4);
}

// ── Bookkeeping release ──────────────────────────────────────────────

#[test]
fn accessors_release_bookkeeping_but_not_data() {
    let mock = MockEngine::builder().tile_size(2).install();
    let mut sim = start(&mock);
    let p = random_particles(11, 5);
    inject(&mut sim, ELECTRONS, &p);

    let tiles = sim.particle_structs(ELECTRONS).unwrap();
    // Pointer table and per-tile counts.
    assert_eq!(mock.released_bookkeeping(), 2);
    assert_eq!(mock.outstanding_bookkeeping(), 0);
    // Data is still readable after the release.
    let xs: Vec<f64> = tiles.iter().flat_map(|t| t.x().to_vec()).collect();
    assert_eq!(xs, p.x);

    let uz = sim.particle_uz(ELECTRONS).unwrap();
    assert_eq!(mock.released_bookkeeping(), 4);
    assert_eq!(uz.iter().map(|t| t.len()).sum::<usize>(), 5);

    assert_eq!(mock.data_buffer_frees(), 0);
    assert_eq!(mock.unknown_frees(), 0);
}

#[test]
fn negative_tile_count_is_rejected_after_release() {
    let mock = MockEngine::builder()
        .fault(Fault::NegativeTileCount)
        .install();
    let mut sim = start(&mock);
    inject(&mut sim, ELECTRONS, &random_particles(12, 3));

    assert_eq!(
        sim.particle_structs(ELECTRONS).unwrap_err(),
        BindingError::NegativeCount {
            what: "tile count",
            value: -1
        }
    );
    assert!(matches!(
        sim.particle_ex(ELECTRONS),
        Err(BindingError::NegativeCount { .. })
    ));
    assert_eq!(mock.outstanding_bookkeeping(), 0);
    assert_eq!(mock.data_buffer_frees(), 0);
}

// ── Push ─────────────────────────────────────────────────────────────

#[test]
fn push_moves_particles_seen_by_fresh_views() {
    let mock = MockEngine::install_default();
    let mut sim = start(&mock);
    let p = random_particles(13, 3);
    inject(&mut sim, ELECTRONS, &p);

    let dt = 0.5;
    sim.push_particles_and_deposit(Level::BASE, dt).unwrap();
    let xs: Vec<f64> = sim.particle_x(ELECTRONS).unwrap()[0].to_vec();
    let expected: Vec<f64> = p.x.iter().zip(&p.ux).map(|(x, u)| x + u * dt).collect();
    assert_eq!(xs, expected);
}
