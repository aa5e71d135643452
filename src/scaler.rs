//! Feature standardization.

use ndarray::{Array1, ArrayView1};
use thiserror::Error;

/// Errors from fitting or applying a [`StandardScaler`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScalerError {
    #[error("cannot fit a scaler on zero rows")]
    Empty,
    #[error("expected a vector of {expected} features, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
}

/// Per-feature standardization to zero mean and unit variance.
///
/// Fitting is the constructor, so a `StandardScaler` always carries
/// valid parameters and "transform before fit" cannot be expressed.
/// The parameters are computed once, from the training split only, and
/// never change afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: Array1<f64>,
    std_dev: Array1<f64>,
}

impl StandardScaler {
    /// Computes the per-feature mean and population (ddof = 0)
    /// standard deviation of `rows`.
    ///
    /// A feature with zero variance keeps a divisor of 1.0, so
    /// [`transform`](Self::transform) centers it without rescaling
    /// rather than dividing by zero.
    ///
    /// # Errors
    ///
    /// Returns `ScalerError::Empty` for zero rows and
    /// `ScalerError::DimensionMismatch` if the rows disagree on length.
    pub fn fit(rows: &[ArrayView1<'_, f64>]) -> Result<Self, ScalerError> {
        let Some(first) = rows.first() else {
            return Err(ScalerError::Empty);
        };
        let dim = first.len();

        let mut mean = Array1::<f64>::zeros(dim);
        for row in rows {
            if row.len() != dim {
                return Err(ScalerError::DimensionMismatch {
                    expected: dim,
                    found: row.len(),
                });
            }
            mean += row;
        }
        mean /= rows.len() as f64;

        let mut variance = Array1::<f64>::zeros(dim);
        for row in rows {
            let centered = row - &mean;
            variance += &(&centered * &centered);
        }
        variance /= rows.len() as f64;

        let std_dev = variance.mapv(|v| {
            let s = v.sqrt();
            if s == 0.0 { 1.0 } else { s }
        });

        Ok(Self { mean, std_dev })
    }

    /// Standardizes one feature vector with the fitted parameters.
    ///
    /// # Errors
    ///
    /// Returns `ScalerError::DimensionMismatch` if the vector's length
    /// differs from the fitted dimensionality.
    pub fn transform(&self, features: ArrayView1<'_, f64>) -> Result<Array1<f64>, ScalerError> {
        if features.len() != self.mean.len() {
            return Err(ScalerError::DimensionMismatch {
                expected: self.mean.len(),
                found: features.len(),
            });
        }
        Ok((&features - &self.mean) / &self.std_dev)
    }

    /// Per-feature means of the training split.
    pub fn mean(&self) -> ArrayView1<'_, f64> {
        self.mean.view()
    }

    /// Per-feature standard deviations of the training split.
    ///
    /// Zero-variance features are stored as 1.0 (see [`fit`](Self::fit)).
    pub fn std_dev(&self) -> ArrayView1<'_, f64> {
        self.std_dev.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_population_statistics() {
        let a = array![1.0, 10.0];
        let b = array![3.0, 30.0];
        let scaler = StandardScaler::fit(&[a.view(), b.view()]).unwrap();

        assert_abs_diff_eq!(scaler.mean()[0], 2.0);
        assert_abs_diff_eq!(scaler.mean()[1], 20.0);
        // Population std over {1, 3} is 1, over {10, 30} is 10.
        assert_abs_diff_eq!(scaler.std_dev()[0], 1.0);
        assert_abs_diff_eq!(scaler.std_dev()[1], 10.0);
    }

    #[test]
    fn test_transform_standardizes() {
        let a = array![1.0, 10.0];
        let b = array![3.0, 30.0];
        let scaler = StandardScaler::fit(&[a.view(), b.view()]).unwrap();

        let scaled = scaler.transform(array![3.0, 10.0].view()).unwrap();
        assert_abs_diff_eq!(scaled[0], 1.0);
        assert_abs_diff_eq!(scaled[1], -1.0);
    }

    #[test]
    fn test_zero_variance_feature_is_centered_not_scaled() {
        let a = array![5.0, 1.0];
        let b = array![5.0, 2.0];
        let c = array![5.0, 3.0];
        let scaler = StandardScaler::fit(&[a.view(), b.view(), c.view()]).unwrap();

        assert_abs_diff_eq!(scaler.std_dev()[0], 1.0);
        let scaled = scaler.transform(array![7.0, 2.0].view()).unwrap();
        // Constant column: divisor 1.0 leaves the centered value as is.
        assert_abs_diff_eq!(scaled[0], 2.0);
        assert_abs_diff_eq!(scaled[1], 0.0);
    }

    #[test]
    fn test_empty_fit_is_an_error() {
        assert_eq!(StandardScaler::fit(&[]), Err(ScalerError::Empty));
    }

    #[test]
    fn test_mismatched_rows_are_an_error() {
        let a = array![1.0, 2.0];
        let b = array![1.0];
        assert_eq!(
            StandardScaler::fit(&[a.view(), b.view()]),
            Err(ScalerError::DimensionMismatch {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_transform_dimension_mismatch() {
        let a = array![1.0, 2.0];
        let scaler = StandardScaler::fit(&[a.view()]).unwrap();
        assert_eq!(
            scaler.transform(array![1.0].view()),
            Err(ScalerError::DimensionMismatch {
                expected: 2,
                found: 1
            })
        );
    }
}
