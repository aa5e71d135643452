use ndarray::NdFloat;
use num_traits::{FromPrimitive, NumCast};

use std::iter::Sum;

// Include submodules
mod sample;

// Re-export types from submodules
pub use sample::Sample;

/// Floating-point scalar bound shared by every model in the workspace.
///
/// Covers the arithmetic the tree and ensemble crates need on feature
/// values; implemented for `f32` and `f64`.
pub trait Float: NdFloat + FromPrimitive + Default + Sum + std::marker::Unpin {
    fn cast<T: NumCast>(x: T) -> Option<Self> {
        NumCast::from(x)
    }
}

impl Float for f32 {}

impl Float for f64 {}
