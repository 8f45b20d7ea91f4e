//! Error types for simulation operations

use std::fmt;

/// Main error type for all simulation operations
///
/// Configuration problems (incompatible ranks, undersized training image)
/// and conditioning conflicts (contradictory hard data, mismatched soft
/// fields) are both fatal: they abort a `simulate` call before any
/// realization starts, and no partial results are returned.
#[derive(Debug, Clone, PartialEq)]
pub enum QuiltingError {
    /// Two inputs that must share a rank do not
    RankMismatch {
        /// What carried the unexpected rank
        context: &'static str,
        /// Rank required by the other inputs
        expected: usize,
        /// Rank actually supplied
        found: usize,
    },

    /// Two arrays that must share a shape do not
    ShapeMismatch {
        /// What carried the unexpected shape
        context: &'static str,
        /// Shape required by the other inputs
        expected: Vec<usize>,
        /// Shape actually supplied
        found: Vec<usize>,
    },

    /// Tile shape exceeds the simulation grid along an axis
    TileExceedsGrid {
        /// Offending axis
        axis: usize,
        /// Tile extent along the axis
        tile: usize,
        /// Grid extent along the axis
        grid: usize,
    },

    /// Training image too small to host a single tile-shaped window
    TrainingImageTooSmall {
        /// Offending axis
        axis: usize,
        /// Training image extent along the axis
        training: usize,
        /// Tile extent along the axis
        tile: usize,
    },

    /// Every candidate anchor was excluded from pattern search
    ///
    /// Occurs when the training image's masked region intersects every
    /// tile-shaped window.
    NoValidAnchor {
        /// Description of why no anchor survived
        reason: String,
    },

    /// Simulation parameter validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// A hard-data coordinate was assigned two different values
    HardDataConflict {
        /// Conflicting grid coordinate
        coords: Vec<usize>,
        /// Value recorded first
        existing: f64,
        /// Value of the rejected insertion
        requested: f64,
    },

    /// Coordinate lies outside the simulation grid
    OutOfBounds {
        /// Offending coordinate
        coords: Vec<usize>,
        /// Shape of the grid it was checked against
        shape: Vec<usize>,
    },

    /// Attempted to write a value into a permanently inactive voxel
    InactiveWrite {
        /// Offending coordinate
        coords: Vec<usize>,
    },
}

impl fmt::Display for QuiltingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RankMismatch {
                context,
                expected,
                found,
            } => {
                write!(f, "Rank mismatch for {context}: expected {expected}, found {found}")
            }
            Self::ShapeMismatch {
                context,
                expected,
                found,
            } => {
                write!(
                    f,
                    "Shape mismatch for {context}: expected {expected:?}, found {found:?}"
                )
            }
            Self::TileExceedsGrid { axis, tile, grid } => {
                write!(
                    f,
                    "Tile extent {tile} exceeds grid extent {grid} along axis {axis}"
                )
            }
            Self::TrainingImageTooSmall {
                axis,
                training,
                tile,
            } => {
                write!(
                    f,
                    "Training image extent {training} is smaller than tile extent {tile} along axis {axis}"
                )
            }
            Self::NoValidAnchor { reason } => {
                write!(f, "No valid training-image anchor: {reason}")
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::HardDataConflict {
                coords,
                existing,
                requested,
            } => {
                write!(
                    f,
                    "Hard data conflict at {coords:?}: already {existing}, requested {requested}"
                )
            }
            Self::OutOfBounds { coords, shape } => {
                write!(f, "Coordinate {coords:?} lies outside grid of shape {shape:?}")
            }
            Self::InactiveWrite { coords } => {
                write!(f, "Cannot assign a value to inactive voxel {coords:?}")
            }
        }
    }
}

impl std::error::Error for QuiltingError {}

/// Convenience type alias for simulation results
pub type Result<T> = std::result::Result<T, QuiltingError>;

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> QuiltingError {
    QuiltingError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
