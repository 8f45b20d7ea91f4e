//! Validates grid state transitions, tile lattice arithmetic, and
//! conditioning-data construction

use geoquilt::spatial::conditioning::HardData;
use geoquilt::spatial::grid::{SimulationGrid, VoxelState};
use geoquilt::spatial::tiles::{
    TileLattice, advance_offset, coords_from_linear, linear_from_coords,
};
use geoquilt::QuiltingError;

#[test]
fn test_new_grid_is_entirely_unfilled() {
    let grid = SimulationGrid::new(&[3, 4]);
    assert_eq!(grid.state(&[0, 0]), Some(VoxelState::Unfilled));
    assert_eq!(grid.state(&[2, 3]), Some(VoxelState::Unfilled));
    assert!(grid.snapshot().iter().all(|v| v.is_nan()));
}

#[test]
fn test_set_commits_a_value() {
    let mut grid = SimulationGrid::new(&[3, 3]);
    assert!(grid.set(&[1, 2], 5.0).is_ok());
    assert_eq!(grid.state(&[1, 2]), Some(VoxelState::Filled));
    assert_eq!(grid.filled_value(&[1, 2]), Some(5.0));
    assert_eq!(grid.filled_value(&[0, 0]), None);
}

#[test]
fn test_inactive_voxels_reject_writes_forever() {
    let mut grid = SimulationGrid::new(&[3, 3]);
    grid.mark_inactive(&[1, 1]);
    assert!(!grid.is_fillable(&[1, 1]));
    assert_eq!(grid.state(&[1, 1]), Some(VoxelState::Inactive));

    let result = grid.set(&[1, 1], 2.0);
    assert!(matches!(result, Err(QuiltingError::InactiveWrite { .. })));
    assert!(grid
        .snapshot()
        .get([1usize, 1].as_slice())
        .copied()
        .is_some_and(f64::is_nan));
}

#[test]
fn test_set_out_of_bounds_is_rejected() {
    let mut grid = SimulationGrid::new(&[2, 2]);
    let result = grid.set(&[5, 0], 1.0);
    assert!(matches!(result, Err(QuiltingError::OutOfBounds { .. })));
}

#[test]
fn test_hard_data_conflicts_are_detected_at_insert() {
    let mut hard = HardData::new();
    assert!(hard.insert(vec![1, 1], 4.0).is_ok());
    assert!(hard.insert(vec![1, 1], 4.0).is_ok());

    let conflict = hard.insert(vec![1, 1], 7.0);
    assert!(matches!(
        conflict,
        Err(QuiltingError::HardDataConflict { .. })
    ));
    assert_eq!(hard.len(), 1);
}

#[test]
fn test_hard_data_accepts_repeated_inactive_markers() {
    let mut hard = HardData::new();
    assert!(hard.insert(vec![0, 2], f64::NAN).is_ok());
    assert!(hard.insert(vec![0, 2], f64::NAN).is_ok());
    assert!(hard.contains(&[0, 2]));
}

#[test]
fn test_lattice_counts_and_bounds() {
    let lattice = TileLattice::new(&[10, 10], &[4, 4], &[0.25, 0.25])
        .unwrap_or_else(|_| unreachable!("valid lattice configuration"));

    assert_eq!(lattice.overlap(), &[1, 1]);
    assert_eq!(lattice.spacing(), &[3, 3]);
    assert_eq!(lattice.tiles_per_axis(), &[3, 3]);
    assert_eq!(lattice.tile_count(), 9);

    let bounds = lattice.tile_bounds(&[2, 0]);
    assert_eq!(bounds.first().cloned(), Some(6..10));
    assert_eq!(bounds.get(1).cloned(), Some(0..4));
}

#[test]
fn test_lattice_clips_the_last_tile() {
    let lattice = TileLattice::new(&[11, 11], &[4, 4], &[0.25, 0.25])
        .unwrap_or_else(|_| unreachable!("valid lattice configuration"));

    assert_eq!(lattice.tiles_per_axis(), &[4, 4]);
    let bounds = lattice.tile_bounds(&[3, 3]);
    assert_eq!(bounds.first().cloned(), Some(9..11));
}

#[test]
fn test_lattice_rejects_oversized_tiles() {
    let result = TileLattice::new(&[3, 3], &[4, 4], &[0.25, 0.25]);
    assert!(matches!(result, Err(QuiltingError::TileExceedsGrid { .. })));
}

#[test]
fn test_lattice_rejects_rank_mismatch() {
    let result = TileLattice::new(&[5, 5], &[2, 2, 2], &[0.25, 0.25]);
    assert!(matches!(result, Err(QuiltingError::RankMismatch { .. })));
}

#[test]
fn test_lattice_rejects_full_overlap_fraction() {
    let result = TileLattice::new(&[5, 5], &[2, 2], &[1.0, 0.25]);
    assert!(matches!(
        result,
        Err(QuiltingError::InvalidParameter { .. })
    ));
}

#[test]
fn test_linear_index_roundtrip() {
    let shape = [3, 4, 5];
    for index in 0..60 {
        let coords = coords_from_linear(index, &shape);
        assert_eq!(linear_from_coords(&coords, &shape), index);
    }
}

#[test]
fn test_advance_offset_enumerates_every_position() {
    let extent = [2, 3, 2];
    let mut offset = [0; 3];
    let mut visited = 1;
    while advance_offset(&mut offset, &extent) {
        visited += 1;
    }
    assert_eq!(visited, 12);
    assert_eq!(offset, [0; 3]);
}
