//! Verbatim training-image reuse statistics
//!
//! Measures how much of a realization is copied wholesale from the
//! training image: the fraction of tiles whose committed pattern exactly
//! matches some contiguous training-image window, as opposed to tiles
//! blended across a seam. The estimator is self-contained: it simulates
//! on a grid shaped like the training image and needs no conditioning
//! data.

use crate::algorithm::executor::{SimulationOptions, simulate};
use crate::io::configuration::{
    DEFAULT_NREAL, DEFAULT_OVERLAP_FRACTION, DEFAULT_SEED, DEFAULT_TOLERANCE,
};
use crate::io::error::Result;
use crate::math::stats::{mean, std_dev};
use crate::spatial::tiles::{TileLattice, advance_offset, coords_from_linear};
use ndarray::ArrayD;

/// Parameters for the reuse estimator
#[derive(Clone, Debug)]
pub struct ReuseOptions {
    /// Number of realizations entering the statistic
    pub nreal: usize,
    /// Base seed for the internal simulation
    pub seed: u64,
    /// Per-axis overlap fractions; `None` uses the default on every axis
    pub overlap: Option<Vec<f64>>,
    /// Relative tolerance forwarded to patch selection
    pub tol: f64,
}

impl Default for ReuseOptions {
    fn default() -> Self {
        Self {
            nreal: DEFAULT_NREAL,
            seed: DEFAULT_SEED,
            overlap: None,
            tol: DEFAULT_TOLERANCE,
        }
    }
}

/// Mean and standard deviation of the verbatim-reuse fraction
///
/// Runs `nreal` unconditional realizations on a grid shaped like the
/// training image and reports, per realization, the fraction of tiles
/// exactly matching a contiguous training-image window. Both statistics
/// lie in `[0, 1]`; a spatially constant training image yields a mean
/// of one.
///
/// # Errors
///
/// Propagates configuration errors from the internal simulation (tile
/// larger than the training image, masked training image without a valid
/// window).
pub fn voxel_reuse(
    ti: &ArrayD<f64>,
    tile_shape: &[usize],
    options: &ReuseOptions,
) -> Result<(f64, f64)> {
    let grid_shape = ti.shape().to_vec();
    let simulation = SimulationOptions {
        tol: options.tol,
        nreal: options.nreal,
        overlap: options.overlap.clone(),
        seed: options.seed,
        ..SimulationOptions::default()
    };

    let output = simulate(ti, tile_shape, &grid_shape, &simulation)?;

    let fractions = options
        .overlap
        .clone()
        .unwrap_or_else(|| vec![DEFAULT_OVERLAP_FRACTION; grid_shape.len()]);
    let lattice = TileLattice::new(&grid_shape, tile_shape, &fractions)?;

    let reuse: Vec<f64> = output
        .realizations
        .iter()
        .map(|realization| verbatim_fraction(ti, &lattice, realization))
        .collect();

    Ok((mean(&reuse), std_dev(&reuse)))
}

/// Fraction of lattice tiles copied verbatim from the training image
fn verbatim_fraction(ti: &ArrayD<f64>, lattice: &TileLattice, realization: &ArrayD<f64>) -> f64 {
    let tile_count = lattice.tile_count();
    if tile_count == 0 {
        return 0.0;
    }

    let matches = (0..tile_count)
        .filter(|&index| {
            let tile_coords = lattice.tile_coords(index);
            let bounds = lattice.tile_bounds(&tile_coords);
            let origin: Vec<usize> = bounds.iter().map(|range| range.start).collect();
            let extent: Vec<usize> = bounds.iter().map(|range| range.end - range.start).collect();
            let values = gather_region(realization, &origin, &extent);
            matches_some_window(ti, &extent, &values)
        })
        .count();

    matches as f64 / tile_count as f64
}

/// Row-major values of a domain region
fn gather_region(array: &ArrayD<f64>, origin: &[usize], extent: &[usize]) -> Vec<f64> {
    let rank = extent.len();
    let mut offset = vec![0; rank];
    let mut cell = vec![0; rank];
    let mut values = Vec::with_capacity(extent.iter().product());

    loop {
        for ((slot, &base), &o) in cell.iter_mut().zip(origin.iter()).zip(offset.iter()) {
            *slot = base + o;
        }
        values.push(array.get(cell.as_slice()).copied().unwrap_or(f64::NAN));

        if !advance_offset(&mut offset, extent) {
            break;
        }
    }

    values
}

/// Whether some training-image window equals the region exactly
///
/// Unknown markers never match, so masked training windows and inactive
/// output voxels both count as synthesized rather than reused.
fn matches_some_window(ti: &ArrayD<f64>, extent: &[usize], values: &[f64]) -> bool {
    let anchor_shape: Vec<usize> = ti
        .shape()
        .iter()
        .zip(extent.iter())
        .map(|(&training, &e)| training.saturating_sub(e) + 1)
        .collect();
    let anchor_count: usize = anchor_shape.iter().product();
    let rank = extent.len();

    (0..anchor_count).any(|anchor| {
        let anchor_coords = coords_from_linear(anchor, &anchor_shape);
        let mut offset = vec![0; rank];
        let mut probe = vec![0; rank];
        let mut position = 0;

        loop {
            for ((slot, &base), &o) in probe
                .iter_mut()
                .zip(anchor_coords.iter())
                .zip(offset.iter())
            {
                *slot = base + o;
            }

            let training = ti.get(probe.as_slice()).copied().unwrap_or(f64::NAN);
            let observed = values.get(position).copied().unwrap_or(f64::NAN);
            if training != observed {
                return false;
            }

            position += 1;
            if !advance_offset(&mut offset, extent) {
                return true;
            }
        }
    })
}
