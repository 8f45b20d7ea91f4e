//! Spatial data structures and domain partitioning
//!
//! This module contains spatial-related functionality including:
//! - Simulation grid state management
//! - Tile lattice partitioning of the domain
//! - Hard and soft conditioning data

/// Hard and soft conditioning data shared across realizations
pub mod conditioning;
/// Simulation grid state management
pub mod grid;
/// Tile lattice partitioning and index arithmetic
pub mod tiles;

pub use grid::SimulationGrid;
pub use tiles::TileLattice;
