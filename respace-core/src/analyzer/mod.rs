//! Text normalization pipeline.
//!
//! This module provides the spacing-repair components:
//! - **Passes**: Individual pure rewrite steps, each testable on its own
//! - **Normalizer**: Runs the enabled passes in canonical order

pub mod normalizer;
pub mod passes;

pub use normalizer::{normalize, normalize_opt, NormalizerConfig, PassList, TextNormalizer};
