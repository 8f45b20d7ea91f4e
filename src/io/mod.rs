//! Runtime support: error types, configuration defaults, progress reporting

/// Algorithm constants and runtime configuration defaults
pub mod configuration;
/// Error types for simulation operations
pub mod error;
/// Progress display for multi-realization runs
pub mod progress;
