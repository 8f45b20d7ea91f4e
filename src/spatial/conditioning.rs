//! Hard and soft conditioning data shared across realizations
//!
//! Both kinds are read-only inputs: one `HardData`/`SoftPair` set serves
//! every realization of a run, so conflicts are rejected at construction
//! rather than surfacing mid-simulation.

use crate::io::error::{QuiltingError, Result};
use ndarray::ArrayD;
use std::collections::HashMap;

/// Point observations keyed by grid coordinate
///
/// An entry whose value is the unknown marker declares the coordinate
/// permanently inactive. Hard data is typically sparse, so entries live in
/// a coordinate-keyed map rather than a dense domain-sized array.
#[derive(Clone, Debug, Default)]
pub struct HardData {
    entries: HashMap<Vec<usize>, f64>,
}

impl HardData {
    /// Create an empty observation set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an observation set from coordinate/value pairs
    ///
    /// # Errors
    ///
    /// Returns [`QuiltingError::HardDataConflict`] if a coordinate appears
    /// twice with different values.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Vec<usize>, f64)>) -> Result<Self> {
        let mut data = Self::new();
        for (coords, value) in pairs {
            data.insert(coords, value)?;
        }
        Ok(data)
    }

    /// Record an observation
    ///
    /// Re-inserting the value already present (unknown markers included) is
    /// a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`QuiltingError::HardDataConflict`] if the coordinate is
    /// already bound to a different value.
    pub fn insert(&mut self, coords: Vec<usize>, value: f64) -> Result<()> {
        if let Some(&existing) = self.entries.get(&coords) {
            let same = existing == value || (existing.is_nan() && value.is_nan());
            if same {
                return Ok(());
            }
            return Err(QuiltingError::HardDataConflict {
                coords,
                existing,
                requested: value,
            });
        }

        self.entries.insert(coords, value);
        Ok(())
    }

    /// Observed value at a coordinate
    pub fn get(&self, coords: &[usize]) -> Option<f64> {
        self.entries.get(coords).copied()
    }

    /// Whether a coordinate carries an observation (or inactive marker)
    pub fn contains(&self, coords: &[usize]) -> bool {
        self.entries.contains_key(coords)
    }

    /// Iterate over all observations
    pub fn iter(&self) -> impl Iterator<Item = (&[usize], f64)> {
        self.entries.iter().map(|(k, &v)| (k.as_slice(), v))
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no observations are present
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Auxiliary trend field pair biasing patch selection
///
/// The grid-scale field describes the target trend over the simulation
/// domain; the training-scale field describes the same auxiliary variable
/// over the training image. Patch selection prefers anchors whose
/// training-scale window resembles the local grid-scale values.
#[derive(Clone, Debug)]
pub struct SoftPair {
    /// Auxiliary variable sampled over the simulation domain
    pub grid_aux: ArrayD<f64>,
    /// Auxiliary variable sampled over the training image
    pub ti_aux: ArrayD<f64>,
}

impl SoftPair {
    /// Pair a grid-scale trend with its training-scale counterpart
    pub const fn new(grid_aux: ArrayD<f64>, ti_aux: ArrayD<f64>) -> Self {
        Self { grid_aux, ti_aux }
    }
}
