//! Post-hoc analysis of synthesized realizations

/// Verbatim training-image reuse statistics
pub mod reuse;
