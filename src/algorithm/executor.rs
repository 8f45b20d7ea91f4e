//! Quilting orchestration across tiles and realizations
//!
//! One realization applies hard data up front, plans a path over the tile
//! lattice, and then for each tile matches a training-image patch, cuts
//! seams against committed neighbouring territory, and commits the result.
//! Realizations are independent: each owns a private grid, path, and
//! random stream derived from the base seed, so the `nreal` loop runs on
//! worker threads with only read-only shared inputs.

use crate::algorithm::mincut::min_cut;
use crate::algorithm::path::{PathKind, generate_path};
use crate::algorithm::selection::PatchMatcher;
use crate::io::configuration::{
    DEFAULT_NREAL, DEFAULT_OVERLAP_FRACTION, DEFAULT_SEED, DEFAULT_TOLERANCE, MAX_GRID_DIMENSION,
};
use crate::io::error::{QuiltingError, Result, invalid_parameter};
use crate::io::progress::RealizationProgress;
use crate::spatial::conditioning::{HardData, SoftPair};
use crate::spatial::grid::{SimulationGrid, UNKNOWN};
use crate::spatial::tiles::{TileLattice, advance_offset};
use ndarray::{ArrayD, IxDyn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use std::ops::Range;

/// Simulation parameters beyond the training image and shapes
///
/// Unset fields fall back to the documented defaults: no conditioning
/// data, tolerance 0.1, one realization, 1/6 overlap per axis, raster
/// path, diagnostics off.
#[derive(Clone, Debug)]
pub struct SimulationOptions {
    /// Point observations and inactive-voxel markers
    pub hard: HardData,
    /// Auxiliary trend field pairs biasing patch selection
    pub soft: Vec<SoftPair>,
    /// Relative tolerance for near-optimal anchor pooling
    pub tol: f64,
    /// Number of independent realizations
    pub nreal: usize,
    /// Per-axis overlap fractions; `None` uses the default on every axis
    pub overlap: Option<Vec<f64>>,
    /// Tile visitation order strategy
    pub path_kind: PathKind,
    /// Base seed; realization `i` derives its own stream from `seed + i`
    pub seed: u64,
    /// Collect per-tile seam statistics
    pub debug: bool,
    /// Display a progress bar over realizations
    pub progress: bool,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            hard: HardData::new(),
            soft: Vec::new(),
            tol: DEFAULT_TOLERANCE,
            nreal: DEFAULT_NREAL,
            overlap: None,
            path_kind: PathKind::Raster,
            seed: DEFAULT_SEED,
            debug: false,
            progress: false,
        }
    }
}

/// Result of a `simulate` call
#[derive(Clone, Debug)]
pub struct SimulationOutput {
    /// One synthesized grid per realization
    pub realizations: Vec<ArrayD<f64>>,
    /// Resolved overlap band width in voxels per axis
    pub overlap: Vec<usize>,
    /// Per realization, per tile: voxels retained from committed
    /// territory by the seam cut (present when `debug` was requested)
    pub cut_stats: Option<Vec<Vec<usize>>>,
}

/// Read-only inputs shared by every realization of one run
struct RealizationContext<'a> {
    ti: &'a ArrayD<f64>,
    lattice: &'a TileLattice,
    matcher: &'a PatchMatcher<'a>,
    hard: &'a HardData,
    soft: &'a [SoftPair],
    grid_shape: &'a [usize],
    path_kind: PathKind,
    data_tiles: Vec<usize>,
}

/// Synthesize `nreal` realizations of a training image over a grid
///
/// The training image is an immutable exemplar whose non-finite entries
/// mark masked training voxels; hard-data entries with the unknown marker
/// declare grid coordinates permanently inactive. Conditioning inputs are
/// only ever read, so one options value serves arbitrarily many calls.
///
/// # Errors
///
/// Returns a configuration error (incompatible ranks, tile larger than
/// grid, training image too small) or a conflict error (contradictory
/// hard data, mismatched soft-field shapes) before any realization
/// starts. No partial results are returned.
pub fn simulate(
    ti: &ArrayD<f64>,
    tile_shape: &[usize],
    grid_shape: &[usize],
    options: &SimulationOptions,
) -> Result<SimulationOutput> {
    validate_dimensions(ti, grid_shape, options)?;

    let fractions = options
        .overlap
        .clone()
        .unwrap_or_else(|| vec![DEFAULT_OVERLAP_FRACTION; grid_shape.len()]);
    let lattice = TileLattice::new(grid_shape, tile_shape, &fractions)?;

    validate_conditioning(ti, grid_shape, options)?;

    let matcher = PatchMatcher::new(ti, lattice.tile_shape(), options.tol)?;
    let data_tiles = locate_data_tiles(&lattice, &options.hard);

    let context = RealizationContext {
        ti,
        lattice: &lattice,
        matcher: &matcher,
        hard: &options.hard,
        soft: &options.soft,
        grid_shape,
        path_kind: options.path_kind,
        data_tiles,
    };

    let progress = RealizationProgress::new(options.progress, options.nreal);
    let results: Vec<(ArrayD<f64>, Vec<usize>)> = (0..options.nreal)
        .into_par_iter()
        .map(|index| {
            run_realization(&context, options.seed.wrapping_add(index as u64))
                .inspect(|_| progress.tick())
        })
        .collect::<Result<Vec<_>>>()?;
    progress.finish();

    let (realizations, stats): (Vec<_>, Vec<_>) = results.into_iter().unzip();

    Ok(SimulationOutput {
        realizations,
        overlap: lattice.overlap().to_vec(),
        cut_stats: options.debug.then_some(stats),
    })
}

/// Reject incompatible ranks and out-of-range scalar parameters
fn validate_dimensions(
    ti: &ArrayD<f64>,
    grid_shape: &[usize],
    options: &SimulationOptions,
) -> Result<()> {
    if ti.ndim() != grid_shape.len() {
        return Err(QuiltingError::RankMismatch {
            context: "training image",
            expected: grid_shape.len(),
            found: ti.ndim(),
        });
    }
    if options.nreal == 0 {
        return Err(invalid_parameter(
            "nreal",
            &options.nreal,
            &"at least one realization is required",
        ));
    }
    if !options.tol.is_finite() || options.tol < 0.0 {
        return Err(invalid_parameter(
            "tol",
            &options.tol,
            &"tolerance must be finite and non-negative",
        ));
    }
    for &extent in grid_shape {
        if extent == 0 || extent > MAX_GRID_DIMENSION {
            return Err(invalid_parameter(
                "grid_shape",
                &extent,
                &format!("grid extents must lie in [1, {MAX_GRID_DIMENSION}]"),
            ));
        }
    }
    if let Some(fractions) = &options.overlap {
        if fractions.len() != grid_shape.len() {
            return Err(QuiltingError::RankMismatch {
                context: "overlap fractions",
                expected: grid_shape.len(),
                found: fractions.len(),
            });
        }
    }
    Ok(())
}

/// Reject malformed hard observations and mis-shaped soft fields
fn validate_conditioning(
    ti: &ArrayD<f64>,
    grid_shape: &[usize],
    options: &SimulationOptions,
) -> Result<()> {
    for (coords, _) in options.hard.iter() {
        if coords.len() != grid_shape.len() {
            return Err(QuiltingError::RankMismatch {
                context: "hard data coordinate",
                expected: grid_shape.len(),
                found: coords.len(),
            });
        }
        let inside = coords
            .iter()
            .zip(grid_shape.iter())
            .all(|(&c, &extent)| c < extent);
        if !inside {
            return Err(QuiltingError::OutOfBounds {
                coords: coords.to_vec(),
                shape: grid_shape.to_vec(),
            });
        }
    }

    for pair in &options.soft {
        if pair.grid_aux.shape() != grid_shape {
            return Err(QuiltingError::ShapeMismatch {
                context: "soft grid field",
                expected: grid_shape.to_vec(),
                found: pair.grid_aux.shape().to_vec(),
            });
        }
        if pair.ti_aux.shape() != ti.shape() {
            return Err(QuiltingError::ShapeMismatch {
                context: "soft training field",
                expected: ti.shape().to_vec(),
                found: pair.ti_aux.shape().to_vec(),
            });
        }
    }

    Ok(())
}

/// Tiles whose bounds contain at least one hard observation
fn locate_data_tiles(lattice: &TileLattice, hard: &HardData) -> Vec<usize> {
    if hard.is_empty() {
        return Vec::new();
    }

    (0..lattice.tile_count())
        .filter(|&index| {
            let tile_coords = lattice.tile_coords(index);
            hard.iter()
                .any(|(coords, _)| lattice.tile_contains(&tile_coords, coords))
        })
        .collect()
}

/// Run one realization: private grid, private path, private random stream
fn run_realization(
    context: &RealizationContext<'_>,
    seed: u64,
) -> Result<(ArrayD<f64>, Vec<usize>)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut grid = SimulationGrid::new(context.grid_shape);

    // Hard data is fixed before any tile is placed and never overwritten.
    for (coords, value) in context.hard.iter() {
        if value.is_nan() {
            grid.mark_inactive(coords);
        } else {
            grid.set(coords, value)?;
        }
    }

    let path = generate_path(
        context.lattice.tiles_per_axis(),
        context.path_kind,
        &context.data_tiles,
        &mut rng,
    );

    let mut cut_counts = vec![0; context.lattice.tile_count()];
    for &tile_index in &path {
        let kept = process_tile(context, &mut grid, tile_index, &mut rng)?;
        if let Some(slot) = cut_counts.get_mut(tile_index) {
            *slot = kept;
        }
    }

    Ok((grid.snapshot(), cut_counts))
}

/// Match, cut, and commit a single tile; returns voxels kept by seams
fn process_tile(
    context: &RealizationContext<'_>,
    grid: &mut SimulationGrid,
    tile_index: usize,
    rng: &mut StdRng,
) -> Result<usize> {
    let lattice = context.lattice;
    let tile_coords = lattice.tile_coords(tile_index);
    let bounds = lattice.tile_bounds(&tile_coords);
    let origin: Vec<usize> = bounds.iter().map(|range| range.start).collect();
    let extent: Vec<usize> = bounds.iter().map(|range| range.end - range.start).collect();

    // A tile fully covered by observations or inactive voxels copies its
    // hard values directly and constrains no seam.
    if fully_determined(context, grid, &origin, &extent) {
        return Ok(0);
    }

    let anchor = context
        .matcher
        .select(grid, &origin, &extent, context.soft, rng)?;

    // A voxel surrenders to the new patch only when every seam selector
    // that covers it agrees; the union of "keep" decisions avoids seam
    // conflicts where bands meet at corners.
    let mut keep = ArrayD::<u8>::zeros(IxDyn(&extent));
    for axis in 0..lattice.rank() {
        let band = lattice.overlap().get(axis).copied().unwrap_or(0);
        if band == 0 {
            continue;
        }
        let coord = tile_coords.get(axis).copied().unwrap_or(0);
        let count = lattice.tiles_per_axis().get(axis).copied().unwrap_or(1);
        let range = bounds
            .get(axis)
            .cloned()
            .unwrap_or(0..0);

        if coord > 0 {
            let leading = range.start..(range.start + band).min(range.end);
            mark_seam(
                context, grid, &anchor, &origin, &bounds, axis, leading, false, &mut keep,
            )?;
        }

        if coord + 1 < count {
            let step = lattice.spacing().get(axis).copied().unwrap_or(1);
            let start = range.start + step;
            if start < range.end {
                let trailing = start..range.end;
                mark_seam(
                    context, grid, &anchor, &origin, &bounds, axis, trailing, true, &mut keep,
                )?;
            }
        }
    }

    commit_patch(context, grid, &anchor, &origin, &extent, &keep)
}

/// Whether every voxel of the tile is hard-conditioned or inactive
fn fully_determined(
    context: &RealizationContext<'_>,
    grid: &SimulationGrid,
    origin: &[usize],
    extent: &[usize],
) -> bool {
    let rank = extent.len();
    let mut offset = vec![0; rank];
    let mut cell = vec![0; rank];

    loop {
        fill_coords(&mut cell, origin, &offset);
        let determined = !grid.is_fillable(&cell) || context.hard.contains(&cell);
        if !determined {
            return false;
        }
        if !advance_offset(&mut offset, extent) {
            return true;
        }
    }
}

/// Cut one overlap band and fold its selector into the keep mask
///
/// The band is gathered reversed along the axis for trailing seams, so the
/// committed neighbour's side is always the forced "old" slice, and the
/// selector maps back through the recorded coordinates.
fn mark_seam(
    context: &RealizationContext<'_>,
    grid: &SimulationGrid,
    anchor: &[usize],
    origin: &[usize],
    bounds: &[Range<usize>],
    axis: usize,
    band_range: Range<usize>,
    reversed: bool,
    keep: &mut ArrayD<u8>,
) -> Result<()> {
    let mut band_bounds = bounds.to_vec();
    if let Some(slot) = band_bounds.get_mut(axis) {
        *slot = band_range.clone();
    }
    let band_shape: Vec<usize> = band_bounds
        .iter()
        .map(|range| range.end - range.start)
        .collect();
    let volume: usize = band_shape.iter().product();
    if volume == 0 {
        return Ok(());
    }

    let rank = band_shape.len();
    let mut offset = vec![0; rank];
    let mut cell = vec![0; rank];
    let mut probe = vec![0; rank];
    let mut committed = Vec::with_capacity(volume);
    let mut candidate = Vec::with_capacity(volume);
    let mut cells = Vec::with_capacity(volume);
    let mut any_committed = false;

    loop {
        for (slot, (range, &o)) in cell
            .iter_mut()
            .zip(band_bounds.iter().zip(offset.iter()))
        {
            *slot = range.start + o;
        }
        if reversed {
            if let (Some(slot), Some(&o)) = (cell.get_mut(axis), offset.get(axis)) {
                *slot = band_range.end - 1 - o;
            }
        }

        for ((slot, &c), (&base, &a)) in probe
            .iter_mut()
            .zip(cell.iter())
            .zip(origin.iter().zip(anchor.iter()))
        {
            *slot = a + (c - base);
        }

        let old = grid.filled_value(&cell).unwrap_or(UNKNOWN);
        any_committed |= old.is_finite();
        committed.push(old);
        candidate.push(
            context
                .ti
                .get(probe.as_slice())
                .copied()
                .unwrap_or(UNKNOWN),
        );
        cells.push(cell.clone());

        if !advance_offset(&mut offset, &band_shape) {
            break;
        }
    }

    // An untouched band constrains nothing.
    if !any_committed {
        return Ok(());
    }

    let old_side = array_from(&band_shape, committed)?;
    let new_side = array_from(&band_shape, candidate)?;
    let selector = min_cut(&old_side, &new_side, axis)?;

    for (&choice, cell) in selector.iter().zip(cells.iter()) {
        if choice == 1 {
            let local: Vec<usize> = cell
                .iter()
                .zip(origin.iter())
                .map(|(&c, &base)| c - base)
                .collect();
            if let Some(slot) = keep.get_mut(local.as_slice()) {
                *slot = 1;
            }
        }
    }

    Ok(())
}

/// Write the selected patch into the grid, respecting seams and conditioning
fn commit_patch(
    context: &RealizationContext<'_>,
    grid: &mut SimulationGrid,
    anchor: &[usize],
    origin: &[usize],
    extent: &[usize],
    keep: &ArrayD<u8>,
) -> Result<usize> {
    let rank = extent.len();
    let mut offset = vec![0; rank];
    let mut cell = vec![0; rank];
    let mut probe = vec![0; rank];
    let mut kept = 0;

    loop {
        fill_coords(&mut cell, origin, &offset);
        fill_coords(&mut probe, anchor, &offset);

        if grid.is_fillable(&cell) && !context.hard.contains(&cell) {
            let retain = keep.get(offset.as_slice()).copied().unwrap_or(0) == 1;
            if retain && grid.is_filled(&cell) {
                kept += 1;
            } else {
                let value = context
                    .ti
                    .get(probe.as_slice())
                    .copied()
                    .unwrap_or(UNKNOWN);
                grid.set(&cell, value)?;
            }
        }

        if !advance_offset(&mut offset, extent) {
            break;
        }
    }

    Ok(kept)
}

/// Element-wise `base + offset` into a reused buffer
fn fill_coords(target: &mut [usize], base: &[usize], offset: &[usize]) {
    for ((slot, &b), &o) in target.iter_mut().zip(base.iter()).zip(offset.iter()) {
        *slot = b + o;
    }
}

/// Row-major vector into a dynamic array of the given shape
fn array_from(shape: &[usize], values: Vec<f64>) -> Result<ArrayD<f64>> {
    ArrayD::from_shape_vec(IxDyn(shape), values)
        .map_err(|err| invalid_parameter("band", &"shape", &err))
}
