//! Simulation grid state management
//!
//! The grid tracks a value and a fill state per voxel. State transitions are
//! strictly additive within a realization: an unfilled voxel may become
//! filled or inactive, a filled voxel may be re-stitched with another value,
//! and an inactive voxel never changes again.

use crate::io::error::{QuiltingError, Result};
use ndarray::{ArrayD, IxDyn};

/// Marker stored at voxels that carry no value (unfilled or inactive)
pub const UNKNOWN: f64 = f64::NAN;

const STATE_UNFILLED: u8 = 0;
const STATE_FILLED: u8 = 1;
const STATE_INACTIVE: u8 = 2;

/// Fill state of a single voxel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoxelState {
    /// Never assigned a value
    Unfilled,
    /// Holds a synthesized or observed value
    Filled,
    /// Permanently excluded from simulation
    Inactive,
}

/// Mutable N-dimensional simulation domain
///
/// Values and states are kept in separate arrays of identical shape so a
/// snapshot is a plain clone of the value array: unfilled and inactive
/// voxels already hold the unknown marker.
#[derive(Clone, Debug)]
pub struct SimulationGrid {
    values: ArrayD<f64>,
    states: ArrayD<u8>,
    shape: Vec<usize>,
}

impl SimulationGrid {
    /// Create a grid with every voxel unfilled
    pub fn new(shape: &[usize]) -> Self {
        Self {
            values: ArrayD::from_elem(IxDyn(shape), UNKNOWN),
            states: ArrayD::from_elem(IxDyn(shape), STATE_UNFILLED),
            shape: shape.to_vec(),
        }
    }

    /// Shape of the simulation domain
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of spatial axes
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Fill state of a voxel, `None` outside the domain
    pub fn state(&self, coords: &[usize]) -> Option<VoxelState> {
        self.states.get(coords).map(|&s| match s {
            STATE_FILLED => VoxelState::Filled,
            STATE_INACTIVE => VoxelState::Inactive,
            _ => VoxelState::Unfilled,
        })
    }

    /// Whether the voxel may still receive a value
    pub fn is_fillable(&self, coords: &[usize]) -> bool {
        self.states
            .get(coords)
            .is_some_and(|&s| s != STATE_INACTIVE)
    }

    /// Whether the voxel currently holds a committed value
    pub fn is_filled(&self, coords: &[usize]) -> bool {
        self.states.get(coords).is_some_and(|&s| s == STATE_FILLED)
    }

    /// Committed value at a voxel, `None` when unfilled, inactive, or out of bounds
    pub fn filled_value(&self, coords: &[usize]) -> Option<f64> {
        if self.is_filled(coords) {
            self.values.get(coords).copied()
        } else {
            None
        }
    }

    /// Permanently exclude a voxel from simulation
    ///
    /// The voxel holds the unknown marker forever afterwards.
    pub fn mark_inactive(&mut self, coords: &[usize]) {
        if let Some(state) = self.states.get_mut(coords) {
            *state = STATE_INACTIVE;
        }
        if let Some(value) = self.values.get_mut(coords) {
            *value = UNKNOWN;
        }
    }

    /// Commit a value to a voxel
    ///
    /// Re-stitching an already filled voxel is allowed; reviving an
    /// inactive one is not.
    ///
    /// # Errors
    ///
    /// Returns [`QuiltingError::InactiveWrite`] for inactive voxels and
    /// [`QuiltingError::OutOfBounds`] for coordinates outside the domain.
    pub fn set(&mut self, coords: &[usize], value: f64) -> Result<()> {
        match self.states.get_mut(coords) {
            None => Err(QuiltingError::OutOfBounds {
                coords: coords.to_vec(),
                shape: self.shape.clone(),
            }),
            Some(state) if *state == STATE_INACTIVE => Err(QuiltingError::InactiveWrite {
                coords: coords.to_vec(),
            }),
            Some(state) => {
                *state = STATE_FILLED;
                if let Some(slot) = self.values.get_mut(coords) {
                    *slot = value;
                }
                Ok(())
            }
        }
    }

    /// Materialize current values, unfilled and inactive voxels as the unknown marker
    pub fn snapshot(&self) -> ArrayD<f64> {
        self.values.clone()
    }
}
