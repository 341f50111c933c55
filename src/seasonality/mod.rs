//! Seasonal decomposition.
//!
//! Provides classical additive decomposition of daily sales into trend,
//! seasonal and residual components.

mod decompose;

pub use decompose::{ClassicalDecomposition, DecompositionResult, DEFAULT_PERIOD};
