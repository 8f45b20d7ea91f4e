//! Simulation path construction over the tile lattice
//!
//! A path is an ordered permutation of tile indices, created once per
//! realization and consumed by the orchestrator. Later tiles condition on
//! voxels committed by earlier ones, so the path determines which tiles
//! constrain which.

use crate::math::distance::chebyshev;
use crate::spatial::tiles::coords_from_linear;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

/// Visitation order strategy for tiles
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PathKind {
    /// Axis-major linear order
    #[default]
    Raster,
    /// Uniformly shuffled order
    Random,
    /// Outward expansion from seed tiles by Chebyshev distance
    Dilation,
    /// Tiles containing hard data first, raster order after
    DataFirst,
}

/// Produce a visitation order covering every tile index exactly once
///
/// `data_tiles` lists tiles known to contain hard data; it seeds the
/// dilation expansion and fills the front of the data-first order. Indices
/// outside the lattice are ignored. A rank-0 or size-1 lattice yields a
/// single-element path.
pub fn generate_path(
    lattice_shape: &[usize],
    kind: PathKind,
    data_tiles: &[usize],
    rng: &mut StdRng,
) -> Vec<usize> {
    let count: usize = lattice_shape.iter().product();
    if count == 0 {
        return Vec::new();
    }

    match kind {
        PathKind::Raster => (0..count).collect(),
        PathKind::Random => {
            let mut path: Vec<usize> = (0..count).collect();
            path.shuffle(rng);
            path
        }
        PathKind::Dilation => dilation_path(lattice_shape, count, data_tiles, rng),
        PathKind::DataFirst => data_first_path(count, data_tiles),
    }
}

/// Expand outward from seed tiles, nearest first
///
/// Every tile is ranked by its Chebyshev distance to the closest seed;
/// ties break on the linear tile index so the order is stable.
fn dilation_path(
    lattice_shape: &[usize],
    count: usize,
    data_tiles: &[usize],
    rng: &mut StdRng,
) -> Vec<usize> {
    let seeds: Vec<Vec<usize>> = {
        let in_range: Vec<usize> = data_tiles.iter().copied().filter(|&t| t < count).collect();
        let chosen = if in_range.is_empty() {
            vec![rng.random_range(0..count)]
        } else {
            in_range
        };
        chosen
            .iter()
            .map(|&t| coords_from_linear(t, lattice_shape))
            .collect()
    };

    let mut ranked: Vec<(usize, usize)> = (0..count)
        .map(|index| {
            let coords = coords_from_linear(index, lattice_shape);
            let distance = seeds
                .iter()
                .map(|seed| chebyshev(&coords, seed))
                .min()
                .unwrap_or(0);
            (distance, index)
        })
        .collect();

    ranked.sort_unstable();
    ranked.into_iter().map(|(_, index)| index).collect()
}

/// Data tiles first (stable, deduplicated), remaining tiles in raster order
fn data_first_path(count: usize, data_tiles: &[usize]) -> Vec<usize> {
    let mut visited = vec![false; count];
    let mut path = Vec::with_capacity(count);

    for &tile in data_tiles {
        if let Some(seen) = visited.get_mut(tile) {
            if !*seen {
                *seen = true;
                path.push(tile);
            }
        }
    }

    for (tile, seen) in visited.iter().enumerate() {
        if !*seen {
            path.push(tile);
        }
    }

    path
}
