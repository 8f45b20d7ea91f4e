use crate::io::error::{QuiltingError, Result};
use crate::math::distance::finite_sq_diff;
use crate::spatial::SimulationGrid;
use crate::spatial::conditioning::SoftPair;
use crate::spatial::tiles::{advance_offset, coords_from_linear};
use bitvec::prelude::*;
use ndarray::ArrayD;
use rand::Rng;
use rand::rngs::StdRng;

/// Exhaustive training-image patch search under conditioning constraints
///
/// Scores every valid anchor position against the committed voxels inside
/// a tile footprint, then draws uniformly among the anchors within a
/// relative tolerance of the minimum score. The anchor-validity mask is
/// precomputed once and shared by all realizations: windows touching the
/// training image's masked (unknown) region are excluded outright.
pub struct PatchMatcher<'a> {
    ti: &'a ArrayD<f64>,
    anchor_shape: Vec<usize>,
    valid: BitVec,
    tol: f64,
}

impl<'a> PatchMatcher<'a> {
    /// Index all valid tile-shaped windows of a training image
    ///
    /// # Errors
    ///
    /// Returns [`QuiltingError::TrainingImageTooSmall`] when no anchor
    /// position exists along some axis, and
    /// [`QuiltingError::NoValidAnchor`] when the masked region of the
    /// training image intersects every window.
    pub fn new(ti: &'a ArrayD<f64>, tile_shape: &[usize], tol: f64) -> Result<Self> {
        let mut anchor_shape = Vec::with_capacity(tile_shape.len());
        for (axis, (&training, &tile)) in ti.shape().iter().zip(tile_shape.iter()).enumerate() {
            if training < tile {
                return Err(QuiltingError::TrainingImageTooSmall {
                    axis,
                    training,
                    tile,
                });
            }
            anchor_shape.push(training - tile + 1);
        }

        let anchor_count: usize = anchor_shape.iter().product();
        let mut valid = bitvec![1; anchor_count];
        for anchor in 0..anchor_count {
            let anchor_coords = coords_from_linear(anchor, &anchor_shape);
            if window_contains_unknown(ti, &anchor_coords, tile_shape) {
                valid.set(anchor, false);
            }
        }

        if valid.not_any() {
            return Err(QuiltingError::NoValidAnchor {
                reason: "training image mask intersects every tile-shaped window".to_string(),
            });
        }

        Ok(Self {
            ti,
            anchor_shape,
            valid,
            tol,
        })
    }

    /// Number of candidate anchor positions (valid or not)
    pub fn anchor_count(&self) -> usize {
        self.anchor_shape.iter().product()
    }

    /// Select one training-image anchor for a tile
    ///
    /// `origin` is the tile's domain origin and `extent` its clipped
    /// shape; only offsets inside the extent are scored, so edge tiles
    /// condition on exactly the voxels they will commit. Soft pairs each
    /// restrict the candidate pool to anchors within the tolerance of the
    /// best trend agreement; a pair that would empty the pool is skipped.
    ///
    /// # Errors
    ///
    /// Currently infallible for a constructed matcher (construction
    /// guarantees at least one valid anchor), but kept fallible so callers
    /// propagate uniformly.
    pub fn select(
        &self,
        grid: &SimulationGrid,
        origin: &[usize],
        extent: &[usize],
        soft: &[SoftPair],
        rng: &mut StdRng,
    ) -> Result<Vec<usize>> {
        let anchor_count = self.anchor_count();
        let mut best = f64::INFINITY;
        let mut costs = Vec::with_capacity(anchor_count);

        for anchor in 0..anchor_count {
            if !self.is_valid(anchor) {
                costs.push(f64::INFINITY);
                continue;
            }

            let cost = self.conditioning_cost(grid, anchor, origin, extent);
            best = best.min(cost);
            costs.push(cost);
        }

        let threshold = best * (1.0 + self.tol);
        let mut candidates: Vec<usize> = costs
            .iter()
            .enumerate()
            .filter(|&(_, &cost)| cost <= threshold)
            .map(|(anchor, _)| anchor)
            .collect();

        for pair in soft {
            self.restrict_by_trend(&mut candidates, pair, origin, extent);
        }

        let chosen = candidates
            .get(rng.random_range(0..candidates.len().max(1)))
            .copied()
            .unwrap_or(0);
        Ok(coords_from_linear(chosen, &self.anchor_shape))
    }

    fn is_valid(&self, anchor: usize) -> bool {
        self.valid.get(anchor).as_deref() == Some(&true)
    }

    /// Squared mismatch against every committed voxel in the footprint
    ///
    /// Hard observations are committed before any tile is placed, so this
    /// single accumulation covers both the overlap bands and the
    /// hard-conditioned voxels of the tile.
    fn conditioning_cost(
        &self,
        grid: &SimulationGrid,
        anchor: usize,
        origin: &[usize],
        extent: &[usize],
    ) -> f64 {
        let anchor_coords = coords_from_linear(anchor, &self.anchor_shape);
        let rank = extent.len();
        let mut offset = vec![0; rank];
        let mut cell = vec![0; rank];
        let mut probe = vec![0; rank];
        let mut cost = 0.0;

        loop {
            fill_coords(&mut cell, origin, &offset);
            fill_coords(&mut probe, &anchor_coords, &offset);

            if let Some(value) = grid.filled_value(&cell) {
                let training = self.ti.get(probe.as_slice()).copied().unwrap_or(f64::NAN);
                cost += finite_sq_diff(training, value);
            }

            if !advance_offset(&mut offset, extent) {
                break;
            }
        }

        cost
    }

    /// Keep only candidates near the best trend agreement for one pair
    ///
    /// Falls back to the unrestricted pool if the restriction would empty
    /// it: pure overlap/hard matching always has a candidate, the trend is
    /// a bias rather than a constraint.
    fn restrict_by_trend(
        &self,
        candidates: &mut Vec<usize>,
        pair: &SoftPair,
        origin: &[usize],
        extent: &[usize],
    ) {
        let distances: Vec<(usize, f64)> = candidates
            .iter()
            .map(|&anchor| (anchor, self.trend_distance(pair, anchor, origin, extent)))
            .collect();

        let best = distances
            .iter()
            .map(|&(_, d)| d)
            .fold(f64::INFINITY, f64::min);
        if !best.is_finite() {
            return;
        }

        let threshold = best * (1.0 + self.tol);
        let restricted: Vec<usize> = distances
            .iter()
            .filter(|&&(_, d)| d <= threshold)
            .map(|&(anchor, _)| anchor)
            .collect();

        if !restricted.is_empty() {
            *candidates = restricted;
        }
    }

    /// Squared distance between the training-scale and grid-scale trends
    fn trend_distance(
        &self,
        pair: &SoftPair,
        anchor: usize,
        origin: &[usize],
        extent: &[usize],
    ) -> f64 {
        let anchor_coords = coords_from_linear(anchor, &self.anchor_shape);
        let rank = extent.len();
        let mut offset = vec![0; rank];
        let mut cell = vec![0; rank];
        let mut probe = vec![0; rank];
        let mut distance = 0.0;

        loop {
            fill_coords(&mut cell, origin, &offset);
            fill_coords(&mut probe, &anchor_coords, &offset);

            let local = pair.grid_aux.get(cell.as_slice()).copied().unwrap_or(f64::NAN);
            let training = pair.ti_aux.get(probe.as_slice()).copied().unwrap_or(f64::NAN);
            distance += finite_sq_diff(training, local);

            if !advance_offset(&mut offset, extent) {
                break;
            }
        }

        distance
    }
}

/// Whether a tile-shaped window contains the unknown marker
fn window_contains_unknown(ti: &ArrayD<f64>, anchor_coords: &[usize], tile_shape: &[usize]) -> bool {
    let rank = tile_shape.len();
    let mut offset = vec![0; rank];
    let mut probe = vec![0; rank];

    loop {
        fill_coords(&mut probe, anchor_coords, &offset);
        let known = ti
            .get(probe.as_slice())
            .copied()
            .is_some_and(f64::is_finite);
        if !known {
            return true;
        }

        if !advance_offset(&mut offset, tile_shape) {
            return false;
        }
    }
}

/// Element-wise `base + offset` into a reused buffer
fn fill_coords(target: &mut [usize], base: &[usize], offset: &[usize]) {
    for ((slot, &b), &o) in target.iter_mut().zip(base.iter()).zip(offset.iter()) {
        *slot = b + o;
    }
}
