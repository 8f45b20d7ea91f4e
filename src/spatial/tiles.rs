//! Tile lattice partitioning and index arithmetic
//!
//! Partitions the simulation domain into a regular lattice of tiles whose
//! neighbours share an overlap band along each axis. Tiles are spaced by
//! `tile - overlap` voxels, so every tile after the first shares its
//! leading band with the preceding tile; the last tile per axis is clipped
//! when the domain is not an exact multiple of the spacing.

use crate::io::error::{QuiltingError, Result, invalid_parameter};
use std::ops::Range;

/// Regular tile lattice over an N-dimensional domain
#[derive(Clone, Debug)]
pub struct TileLattice {
    grid_shape: Vec<usize>,
    tile_shape: Vec<usize>,
    overlap: Vec<usize>,
    spacing: Vec<usize>,
    tiles_per_axis: Vec<usize>,
}

impl TileLattice {
    /// Partition a domain into tiles with per-axis overlap fractions
    ///
    /// Overlap sizes are the fractions rounded to whole voxels and capped
    /// at one voxel less than the tile extent, so spacing stays positive.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when ranks disagree, a tile extent is
    /// zero or exceeds the domain, or a fraction lies outside `[0, 1)`.
    pub fn new(grid_shape: &[usize], tile_shape: &[usize], overlap_fractions: &[f64]) -> Result<Self> {
        if tile_shape.len() != grid_shape.len() {
            return Err(QuiltingError::RankMismatch {
                context: "tile shape",
                expected: grid_shape.len(),
                found: tile_shape.len(),
            });
        }
        if overlap_fractions.len() != grid_shape.len() {
            return Err(QuiltingError::RankMismatch {
                context: "overlap fractions",
                expected: grid_shape.len(),
                found: overlap_fractions.len(),
            });
        }

        let mut overlap = Vec::with_capacity(grid_shape.len());
        let mut spacing = Vec::with_capacity(grid_shape.len());
        let mut tiles_per_axis = Vec::with_capacity(grid_shape.len());

        for (axis, ((&grid, &tile), &fraction)) in grid_shape
            .iter()
            .zip(tile_shape.iter())
            .zip(overlap_fractions.iter())
            .enumerate()
        {
            if tile == 0 {
                return Err(invalid_parameter(
                    "tile_shape",
                    &tile,
                    &format!("tile extent along axis {axis} must be positive"),
                ));
            }
            if tile > grid {
                return Err(QuiltingError::TileExceedsGrid { axis, tile, grid });
            }
            if !(0.0..1.0).contains(&fraction) {
                return Err(invalid_parameter(
                    "overlap",
                    &fraction,
                    &format!("overlap fraction along axis {axis} must lie in [0, 1)"),
                ));
            }

            let band = ((fraction * tile as f64).round() as usize).min(tile - 1);
            let step = tile - band;
            let count = if grid <= tile {
                1
            } else {
                (grid - tile).div_ceil(step) + 1
            };

            overlap.push(band);
            spacing.push(step);
            tiles_per_axis.push(count);
        }

        Ok(Self {
            grid_shape: grid_shape.to_vec(),
            tile_shape: tile_shape.to_vec(),
            overlap,
            spacing,
            tiles_per_axis,
        })
    }

    /// Number of spatial axes
    pub fn rank(&self) -> usize {
        self.grid_shape.len()
    }

    /// Shape of the underlying domain
    pub fn grid_shape(&self) -> &[usize] {
        &self.grid_shape
    }

    /// Nominal (unclipped) tile shape
    pub fn tile_shape(&self) -> &[usize] {
        &self.tile_shape
    }

    /// Overlap band width in voxels per axis
    pub fn overlap(&self) -> &[usize] {
        &self.overlap
    }

    /// Distance between neighbouring tile origins per axis
    pub fn spacing(&self) -> &[usize] {
        &self.spacing
    }

    /// Tile counts per axis
    pub fn tiles_per_axis(&self) -> &[usize] {
        &self.tiles_per_axis
    }

    /// Total number of tiles in the lattice
    pub fn tile_count(&self) -> usize {
        self.tiles_per_axis.iter().product()
    }

    /// Lattice coordinates of a tile from its linear index
    pub fn tile_coords(&self, index: usize) -> Vec<usize> {
        coords_from_linear(index, &self.tiles_per_axis)
    }

    /// Linear index of a tile from its lattice coordinates
    pub fn tile_index(&self, coords: &[usize]) -> usize {
        linear_from_coords(coords, &self.tiles_per_axis)
    }

    /// Domain bounds of a tile, clipped to the grid
    pub fn tile_bounds(&self, coords: &[usize]) -> Vec<Range<usize>> {
        coords
            .iter()
            .zip(self.spacing.iter())
            .zip(self.tile_shape.iter().zip(self.grid_shape.iter()))
            .map(|((&c, &step), (&tile, &grid))| {
                let start = c * step;
                start..(start + tile).min(grid)
            })
            .collect()
    }

    /// Whether a domain coordinate falls inside a tile's bounds
    pub fn tile_contains(&self, tile_coords: &[usize], point: &[usize]) -> bool {
        self.tile_bounds(tile_coords)
            .iter()
            .zip(point.iter())
            .all(|(range, &p)| range.contains(&p))
    }
}

/// Decompose a row-major linear index into coordinates
pub fn coords_from_linear(index: usize, shape: &[usize]) -> Vec<usize> {
    let mut coords = vec![0; shape.len()];
    let mut remainder = index;

    for (coord, &extent) in coords.iter_mut().zip(shape.iter()).rev() {
        if extent > 0 {
            *coord = remainder % extent;
            remainder /= extent;
        }
    }

    coords
}

/// Compose coordinates into a row-major linear index
pub fn linear_from_coords(coords: &[usize], shape: &[usize]) -> usize {
    coords
        .iter()
        .zip(shape.iter())
        .fold(0, |acc, (&c, &extent)| acc * extent + c)
}

/// Advance a row-major offset odometer within `extent`
///
/// Returns `false` once every offset has been visited. Starting from the
/// all-zero offset this enumerates `extent.iter().product()` positions.
pub fn advance_offset(offset: &mut [usize], extent: &[usize]) -> bool {
    for (o, &e) in offset.iter_mut().zip(extent.iter()).rev() {
        *o += 1;
        if *o < e {
            return true;
        }
        *o = 0;
    }
    false
}
