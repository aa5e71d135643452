use crate::Float;
use ndarray::Array1;
use std::fmt::Debug;

/// A single labeled record: a feature vector plus its label.
///
/// L: The type of the label (e.g., String, usize, enum).
/// F: The float type for the features (e.g., f32, f64).
#[derive(Debug, Clone)]
pub struct Sample<L, F>
where
    L: Clone + Eq + std::hash::Hash + Debug,
    F: Float,
{
    pub features: Array1<F>,
    pub label: L,
}

impl<L, F> Sample<L, F>
where
    L: Clone + Eq + std::hash::Hash + Debug,
    F: Float,
{
    pub fn new(features: Array1<F>, label: L) -> Self {
        Sample { features, label }
    }
}
