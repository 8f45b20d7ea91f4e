//! Algorithm constants and runtime configuration defaults

/// Relative tolerance used both for the near-optimal anchor pool and for
/// soft-data candidate restriction
pub const DEFAULT_TOLERANCE: f64 = 0.1;

/// Fraction of the tile extent shared with each neighbouring tile
pub const DEFAULT_OVERLAP_FRACTION: f64 = 1.0 / 6.0;

/// Number of realizations produced when the caller does not ask for more
pub const DEFAULT_NREAL: usize = 1;

/// Fixed seed for reproducible simulation
pub const DEFAULT_SEED: u64 = 42;

// Safety limit to prevent excessive memory allocation
/// Maximum allowed simulation grid dimension
pub const MAX_GRID_DIMENSION: usize = 10_000;

// Progress bar display settings
/// Template for the realization progress bar
pub const PROGRESS_TEMPLATE: &str =
    "[{elapsed_precise}] Realizations: [{bar:40.cyan/blue}] {pos}/{len}";
