//! Mathematical utilities for the engine

/// Lattice distance metrics and mismatch energies
pub mod distance;
/// Summary statistics over realization ensembles
pub mod stats;
