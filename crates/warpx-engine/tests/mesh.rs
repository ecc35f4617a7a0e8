//! Integration test: mesh field and current-density views against the mock
//! engine.

use proptest::prelude::*;
use warpx_core::{BindingError, Direction, FieldKind, Level};
use warpx_engine::{BindingConfig, Simulation};
use warpx_test_utils::{init_logging, Fault, MockEngine};

fn start(mock: &MockEngine) -> Simulation {
    init_logging();
    Simulation::init(mock.api(), BindingConfig::default(), &["warpx"]).unwrap()
}

#[test]
fn full_grids_match_engine_storage() {
    let mock = MockEngine::builder()
        .ghosts(2)
        .level([[4, 4, 4], [2, 3, 5]])
        .install();
    let sim = start(&mock);

    for kind in FieldKind::ALL {
        for direction in Direction::ALL {
            let grids = sim.mesh_data(kind, Level::BASE, direction, true).unwrap();
            assert_eq!(grids.len(), 2);
            for (i, grid) in grids.iter().enumerate() {
                assert_eq!(grid.shape(), mock.grid_shapes(0)[i]);
                assert_eq!(grid.ghosts(), 2);
                assert_eq!(grid.kind(), kind);
                assert_eq!(grid.direction(), direction);
                let values: Vec<f64> = grid.to_owned_array().iter().copied().collect();
                assert_eq!(values, mock.grid_values(kind, 0, direction, i));
            }
        }
    }
    assert_eq!(mock.outstanding_bookkeeping(), 0);
    assert_eq!(mock.data_buffer_frees(), 0);
}

#[test]
fn interior_views_strip_ghosts_without_copying() {
    let mock = MockEngine::builder().ghosts(1).level([[3, 3, 3]]).install();
    let sim = start(&mock);

    let full = sim
        .mesh_electric_field(Level::BASE, Direction::Y, true)
        .unwrap();
    let inner = sim
        .mesh_electric_field(Level::BASE, Direction::Y, false)
        .unwrap();
    assert_eq!(full[0].shape(), [5, 5, 5]);
    assert_eq!(inner[0].shape(), [3, 3, 3]);
    assert_eq!(inner[0].ghosts(), 0);
    assert_eq!(inner[0].get([0, 0, 0]), full[0].get([1, 1, 1]));
    // Same memory: element [0,0,0] of the interior is element [1,1,1] of
    // the full buffer.
    assert_eq!(inner[0].as_ptr(), full[0].as_array()[[1, 1, 1]].as_ptr());
    assert_eq!(inner[0].strides(), full[0].strides());
}

#[test]
fn grid_writes_land_in_engine_storage() {
    let mock = MockEngine::builder().ghosts(1).level([[2, 2, 2]]).install();
    let sim = start(&mock);

    let j = sim
        .mesh_current_density(Level::BASE, Direction::Z, false)
        .unwrap();
    j[0].fill(3.5);
    let stored = mock.grid_values(FieldKind::CurrentDensity, 0, Direction::Z, 0);
    // 4x4x4 with a one-cell ghost shell: 8 interior cells.
    assert_eq!(stored.iter().filter(|&&v| v == 3.5).count(), 8);
    let full = sim
        .mesh_current_density(Level::BASE, Direction::Z, true)
        .unwrap();
    assert_eq!(full[0].get([0, 0, 0]), Some(stored[0]));
    assert_eq!(full[0].get([1, 1, 1]), Some(3.5));
}

#[test]
fn zero_ghosts_strip_nothing() {
    let mock = MockEngine::builder().ghosts(0).level([[2, 3, 4]]).install();
    let sim = start(&mock);
    let b = sim
        .mesh_magnetic_field(Level::BASE, Direction::X, false)
        .unwrap();
    assert_eq!(b[0].shape(), [2, 3, 4]);
}

#[test]
fn every_level_is_reachable() {
    let mock = MockEngine::builder()
        .level([[2, 2, 2]])
        .level([[4, 4, 4], [4, 4, 4], [2, 2, 2]])
        .install();
    let sim = start(&mock);
    assert_eq!(sim.finest_level(), 1);
    let fine = sim
        .mesh_electric_field(Level(1), Direction::X, false)
        .unwrap();
    assert_eq!(fine.len(), 3);
    assert_eq!(
        sim.mesh_electric_field(Level(2), Direction::X, false)
            .unwrap_err(),
        BindingError::LevelOutOfRange {
            level: 2,
            finest: 1
        }
    );
}

#[test]
fn negative_ghost_count_is_rejected_after_release() {
    let mock = MockEngine::builder()
        .fault(Fault::NegativeGhostCount)
        .install();
    let sim = start(&mock);
    assert_eq!(
        sim.mesh_electric_field(Level::BASE, Direction::X, true)
            .unwrap_err(),
        BindingError::NegativeCount {
            what: "ghost count",
            value: -1
        }
    );
    assert_eq!(mock.outstanding_bookkeeping(), 0);
}

#[test]
fn negative_extent_is_rejected_after_release() {
    let mock = MockEngine::builder()
        .fault(Fault::NegativeGridExtent)
        .install();
    let sim = start(&mock);
    assert!(matches!(
        sim.mesh_magnetic_field(Level::BASE, Direction::Z, true),
        Err(BindingError::NegativeCount {
            what: "grid extent",
            value: -1
        })
    ));
    assert_eq!(mock.outstanding_bookkeeping(), 0);
    assert_eq!(mock.data_buffer_frees(), 0);
}

#[test]
fn overflowing_extents_are_rejected_after_release() {
    let mock = MockEngine::builder()
        .fault(Fault::OversizedGridExtent)
        .install();
    let sim = start(&mock);
    let max = i32::MAX as usize;
    assert_eq!(
        sim.mesh_electric_field(Level::BASE, Direction::Y, false)
            .unwrap_err(),
        BindingError::GridTooLarge {
            shape: [max, max, max]
        }
    );
    assert_eq!(mock.outstanding_bookkeeping(), 0);
    assert_eq!(mock.data_buffer_frees(), 0);
}

proptest! {
    #[test]
    fn interior_is_the_ghost_free_core(
        ghosts in 0usize..3,
        nx in 1usize..5,
        ny in 1usize..5,
        nz in 1usize..5,
    ) {
        let mock = MockEngine::builder().ghosts(ghosts).level([[nx, ny, nz]]).install();
        let sim = start(&mock);
        let full = sim.mesh_data(FieldKind::Electric, Level::BASE, Direction::X, true).unwrap();
        let inner = sim.mesh_data(FieldKind::Electric, Level::BASE, Direction::X, false).unwrap();
        let g = ghosts;
        prop_assert_eq!(full[0].shape(), [nx + 2 * g, ny + 2 * g, nz + 2 * g]);
        prop_assert_eq!(inner[0].shape(), [nx, ny, nz]);
        prop_assert_eq!(inner[0].get([0, 0, 0]), full[0].get([g, g, g]));
        prop_assert_eq!(
            inner[0].get([nx - 1, ny - 1, nz - 1]),
            full[0].get([g + nx - 1, g + ny - 1, g + nz - 1])
        );
    }
}
