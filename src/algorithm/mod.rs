/// Quilting orchestration across tiles and realizations
pub mod executor;
/// Minimum-error seam computation over overlap bands
pub mod mincut;
/// Simulation path construction over the tile lattice
pub mod path;
/// Training-image patch search under conditioning constraints
pub mod selection;
