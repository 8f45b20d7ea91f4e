//! Multiple-point geostatistical simulation by image quilting
//!
//! Synthesizes realizations of a spatial process by tiling a simulation grid
//! with patches drawn from a training image, stitching neighbouring patches
//! along minimum-error seams, and honoring point observations, trend fields,
//! and inactive-voxel masks.

#![forbid(unsafe_code)]

/// Core algorithm implementation: path planning, patch matching, seam cutting, orchestration
pub mod algorithm;
/// Post-hoc analysis of synthesized realizations
pub mod analysis;
/// Error handling, runtime defaults, and progress reporting
pub mod io;
/// Mathematical utilities for distances and summary statistics
pub mod math;
/// Spatial data structures: simulation grid, tile lattice, conditioning data
pub mod spatial;

pub use algorithm::executor::{SimulationOptions, SimulationOutput, simulate};
pub use algorithm::mincut::min_cut;
pub use algorithm::path::{PathKind, generate_path};
pub use analysis::reuse::{ReuseOptions, voxel_reuse};
pub use io::error::{QuiltingError, Result};
pub use spatial::conditioning::{HardData, SoftPair};
