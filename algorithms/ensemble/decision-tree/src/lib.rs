use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::hash::Hash;

// ndarray and petal_helpers are used in the public function signatures.
use ndarray::ArrayView1;
use petal_helpers::{Float, Sample};

/// Errors that can occur when fitting or querying a decision tree.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeError {
    /// Cannot fit a tree on an empty training set
    EmptyTrainingSet,
    /// Training samples disagree on feature dimensionality
    MismatchedDimensions,
    /// Query vector length differs from the fitted dimensionality
    DimensionMismatch { expected: usize, found: usize },
}

impl Display for TreeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TreeError::EmptyTrainingSet => write!(f, "Cannot fit a tree on an empty training set"),
            TreeError::MismatchedDimensions => {
                write!(f, "Training samples disagree on feature dimensionality")
            }
            TreeError::DimensionMismatch { expected, found } => write!(
                f,
                "Expected a feature vector of length {}, found {}",
                expected, found
            ),
        }
    }
}

impl Error for TreeError {}

#[derive(Debug, Clone)]
enum TreeNode<L, F> {
    Leaf {
        label: L,
    },
    Split {
        feature: usize,
        threshold: F,
        left: Box<TreeNode<L, F>>,
        right: Box<TreeNode<L, F>>,
    },
}

/// A CART classification tree.
///
/// Grows by recursively choosing the axis-aligned split with the
/// largest Gini impurity reduction; candidate thresholds are the
/// midpoints between consecutive distinct feature values. Leaves hold
/// the majority label of the samples that reached them, ties resolving
/// to the lowest label.
///
/// # Type Parameters
///
/// * `L`: The type of the label (e.g., `String`, `usize`, or a custom `enum`).
/// * `F`: The float type for the features (e.g., `f32`, `f64`).
#[derive(Debug, Clone)]
pub struct DecisionTree<L, F>
where
    L: Clone + Eq + Hash + Debug + Ord,
    F: Float,
{
    root: TreeNode<L, F>,
    n_features: usize,
}

impl<L, F> DecisionTree<L, F>
where
    L: Clone + Eq + Hash + Debug + Ord,
    F: Float,
{
    /// Grows a tree with no depth limit.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::EmptyTrainingSet` if `data` is empty, and
    /// `TreeError::MismatchedDimensions` if the samples do not all share
    /// one feature dimensionality.
    pub fn fit(data: &[Sample<L, F>]) -> Result<Self, TreeError> {
        Self::fit_with_max_depth(data, None)
    }

    /// Grows a tree, stopping `max_depth` splits below the root when given.
    pub fn fit_with_max_depth(
        data: &[Sample<L, F>],
        max_depth: Option<usize>,
    ) -> Result<Self, TreeError> {
        if data.is_empty() {
            return Err(TreeError::EmptyTrainingSet);
        }
        let n_features = data[0].features.len();
        for sample in data {
            if sample.features.len() != n_features {
                return Err(TreeError::MismatchedDimensions);
            }
        }

        let indices: Vec<usize> = (0..data.len()).collect();
        let root = grow(data, indices, 0, max_depth);
        Ok(Self { root, n_features })
    }

    /// Predicts the label for a new, unseen feature vector.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::DimensionMismatch` if the vector's length
    /// differs from the training dimensionality.
    pub fn predict(&self, features: ArrayView1<F>) -> Result<L, TreeError> {
        if features.len() != self.n_features {
            return Err(TreeError::DimensionMismatch {
                expected: self.n_features,
                found: features.len(),
            });
        }

        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf { label } => return Ok(label.clone()),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if features[*feature] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    /// Number of features the tree was fitted on.
    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

// Callers guarantee `indices` is non-empty.
fn grow<L, F>(
    data: &[Sample<L, F>],
    indices: Vec<usize>,
    depth: usize,
    max_depth: Option<usize>,
) -> TreeNode<L, F>
where
    L: Clone + Eq + Hash + Debug + Ord,
    F: Float,
{
    let first = &data[indices[0]].label;
    let pure = indices.iter().all(|&i| data[i].label == *first);
    let depth_capped = max_depth.is_some_and(|limit| depth >= limit);
    if pure || depth_capped || indices.len() < 2 {
        return TreeNode::Leaf {
            label: majority_label(data, &indices),
        };
    }

    let Some((feature, threshold)) = best_split(data, &indices) else {
        return TreeNode::Leaf {
            label: majority_label(data, &indices),
        };
    };

    // Thresholds sit strictly between observed values, so both sides
    // are non-empty and the recursion shrinks.
    let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
        .into_iter()
        .partition(|&i| data[i].features[feature] <= threshold);

    let left = grow(data, left_indices, depth + 1, max_depth);
    let right = grow(data, right_indices, depth + 1, max_depth);
    TreeNode::Split {
        feature,
        threshold,
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Finds the (feature, threshold) pair with the largest Gini impurity
/// reduction, or `None` when no candidate split improves on the parent.
fn best_split<L, F>(data: &[Sample<L, F>], indices: &[usize]) -> Option<(usize, F)>
where
    L: Clone + Eq + Hash + Debug + Ord,
    F: Float,
{
    let n_features = data[indices[0]].features.len();
    let parent_impurity = gini(data, indices);

    let mut best: Option<(usize, F)> = None;
    let mut best_gain = 0.0_f64;

    for feature in 0..n_features {
        let mut values: Vec<F> = indices.iter().map(|&i| data[i].features[feature]).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        for pair in values.windows(2) {
            if pair[0] == pair[1] {
                continue;
            }
            let threshold = (pair[0] + pair[1]) / F::cast(2.0).unwrap();

            let (left, right): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .copied()
                .partition(|&i| data[i].features[feature] <= threshold);
            let n_left = left.len() as f64;
            let n_right = right.len() as f64;
            let n_total = n_left + n_right;
            let child_impurity = (n_left / n_total) * gini(data, &left)
                + (n_right / n_total) * gini(data, &right);

            let gain = parent_impurity - child_impurity;
            if gain > best_gain {
                best_gain = gain;
                best = Some((feature, threshold));
            }
        }
    }

    best
}

/// Gini impurity of the labels selected by `indices`: 1 - Σ p_i².
fn gini<L, F>(data: &[Sample<L, F>], indices: &[usize]) -> f64
where
    L: Clone + Eq + Hash + Debug + Ord,
    F: Float,
{
    if indices.is_empty() {
        return 0.0;
    }

    let mut counts: HashMap<&L, usize> = HashMap::new();
    for &i in indices {
        *counts.entry(&data[i].label).or_insert(0) += 1;
    }

    let n = indices.len() as f64;
    let mut impurity = 1.0;
    for count in counts.values() {
        let p = *count as f64 / n;
        impurity -= p * p;
    }
    impurity
}

/// Majority label among `indices`; ties resolve to the lowest label.
fn majority_label<L, F>(data: &[Sample<L, F>], indices: &[usize]) -> L
where
    L: Clone + Eq + Hash + Debug + Ord,
    F: Float,
{
    let mut counts: HashMap<&L, usize> = HashMap::new();
    for &i in indices {
        *counts.entry(&data[i].label).or_insert(0) += 1;
    }

    // We expect this to be Some, since callers never pass empty indices.
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(label, _)| label.clone())
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn separable_data() -> Vec<Sample<&'static str, f64>> {
        vec![
            Sample::new(array![1.0, 1.0], "A"),
            Sample::new(array![2.0, 2.0], "A"),
            Sample::new(array![1.0, 2.0], "A"),
            Sample::new(array![8.0, 8.0], "B"),
            Sample::new(array![9.0, 8.0], "B"),
            Sample::new(array![8.0, 9.0], "B"),
        ]
    }

    #[test]
    fn test_fit_and_predict_separable() {
        let tree = DecisionTree::fit(&separable_data()).unwrap();
        assert_eq!(tree.predict(array![1.5, 1.5].view()).unwrap(), "A");
        assert_eq!(tree.predict(array![8.5, 8.5].view()).unwrap(), "B");
    }

    #[test]
    fn test_single_class_data_yields_that_class() {
        let data = vec![
            Sample::new(array![1.0], "only"),
            Sample::new(array![2.0], "only"),
            Sample::new(array![3.0], "only"),
        ];
        let tree = DecisionTree::fit(&data).unwrap();
        assert_eq!(tree.predict(array![-5.0].view()).unwrap(), "only");
        assert_eq!(tree.predict(array![99.0].view()).unwrap(), "only");
    }

    #[test]
    fn test_nested_splits() {
        // One feature, three bands: A below 2, B between 2 and 4, A above 4.
        let data = vec![
            Sample::new(array![1.0], "A"),
            Sample::new(array![1.5], "A"),
            Sample::new(array![2.5], "B"),
            Sample::new(array![3.0], "B"),
            Sample::new(array![3.5], "B"),
            Sample::new(array![5.0], "A"),
            Sample::new(array![5.5], "A"),
        ];
        let tree = DecisionTree::fit(&data).unwrap();
        assert_eq!(tree.predict(array![1.2].view()).unwrap(), "A");
        assert_eq!(tree.predict(array![3.2].view()).unwrap(), "B");
        assert_eq!(tree.predict(array![5.2].view()).unwrap(), "A");
    }

    #[test]
    fn test_max_depth_zero_is_a_single_leaf() {
        let data = separable_data();
        let tree = DecisionTree::fit_with_max_depth(&data, Some(0)).unwrap();
        // Six samples, three of each class; the tie falls to the lowest label.
        assert_eq!(tree.predict(array![8.5, 8.5].view()).unwrap(), "A");
    }

    #[test]
    fn test_error_on_empty_training_set() {
        let data: Vec<Sample<&str, f64>> = vec![];
        assert!(matches!(
            DecisionTree::fit(&data),
            Err(TreeError::EmptyTrainingSet)
        ));
    }

    #[test]
    fn test_error_on_mismatched_dimensions() {
        let data = vec![
            Sample::new(array![1.0, 2.0], "A"),
            Sample::new(array![3.0], "B"),
        ];
        assert!(matches!(
            DecisionTree::fit(&data),
            Err(TreeError::MismatchedDimensions)
        ));
    }

    #[test]
    fn test_error_on_query_dimension_mismatch() {
        let tree = DecisionTree::fit(&separable_data()).unwrap();
        let result = tree.predict(array![1.0].view());
        assert_eq!(
            result,
            Err(TreeError::DimensionMismatch {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_gini_pure_and_even() {
        let pure = vec![
            Sample::new(array![0.0], "A"),
            Sample::new(array![1.0], "A"),
        ];
        assert_abs_diff_eq!(gini(&pure, &[0, 1]), 0.0);

        let even = vec![
            Sample::new(array![0.0], "A"),
            Sample::new(array![1.0], "B"),
        ];
        assert_abs_diff_eq!(gini(&even, &[0, 1]), 0.5);
    }

    #[test]
    fn test_majority_tie_breaks_to_lowest_label() {
        let data = vec![
            Sample::new(array![0.0], 2_usize),
            Sample::new(array![1.0], 0_usize),
            Sample::new(array![2.0], 2_usize),
            Sample::new(array![3.0], 0_usize),
        ];
        assert_eq!(majority_label(&data, &[0, 1, 2, 3]), 0);
    }
}
