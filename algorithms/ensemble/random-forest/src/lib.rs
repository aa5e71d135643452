use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::hash::Hash;

use decision_tree::{DecisionTree, TreeError};
use ndarray::ArrayView1;
use petal_helpers::{Float, Sample};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

/// Errors that can occur when fitting or querying a bagged ensemble.
#[derive(Debug, Clone, PartialEq)]
pub enum ForestError {
    /// An ensemble needs at least one tree
    NoTrees,
    /// Cannot fit with an empty training set
    EmptyTrainingSet,
    /// A member tree failed to fit or to answer a query
    Tree(TreeError),
}

impl Display for ForestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ForestError::NoTrees => write!(f, "An ensemble needs at least one tree"),
            ForestError::EmptyTrainingSet => {
                write!(f, "Cannot fit with an empty training set")
            }
            ForestError::Tree(err) => write!(f, "Member tree error: {}", err),
        }
    }
}

impl Error for ForestError {}

impl From<TreeError> for ForestError {
    fn from(err: TreeError) -> Self {
        ForestError::Tree(err)
    }
}

/// A bagged ensemble of decision trees.
///
/// Each tree is grown on a bootstrap resample of the training set
/// (drawn with replacement, same size as the input). Prediction is a
/// majority vote across the trees, ties resolving to the lowest label.
///
/// # Type Parameters
///
/// * `L`: The type of the label (e.g., `String`, `usize`, or a custom `enum`).
/// * `F`: The float type for the features (e.g., `f32`, `f64`).
#[derive(Debug, Clone)]
pub struct RandomForest<L, F>
where
    L: Clone + Eq + Hash + Debug + Ord,
    F: Float,
{
    trees: Vec<DecisionTree<L, F>>,
}

/// Trains an ensemble of `n_trees` trees with a specific seed for
/// reproducible results.
///
/// All bootstrap draws come from one `Xoshiro256PlusPlus` seeded with
/// `seed`, so fitting is fully deterministic given the same data, tree
/// count, and seed.
///
/// # Errors
///
/// Returns `ForestError::NoTrees` if `n_trees` is 0,
/// `ForestError::EmptyTrainingSet` if `data` is empty, and
/// `ForestError::Tree` if a member tree rejects the data (e.g. mixed
/// feature dimensionality).
pub fn fit_with_seed<L, F>(
    data: &[Sample<L, F>],
    n_trees: usize,
    seed: u64,
) -> Result<RandomForest<L, F>, ForestError>
where
    L: Clone + Eq + Hash + Debug + Ord,
    F: Float,
{
    if n_trees == 0 {
        return Err(ForestError::NoTrees);
    }
    if data.is_empty() {
        return Err(ForestError::EmptyTrainingSet);
    }

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut trees = Vec::with_capacity(n_trees);
    for _ in 0..n_trees {
        let resample: Vec<Sample<L, F>> = (0..data.len())
            .map(|_| data[rng.random_range(0..data.len())].clone())
            .collect();
        trees.push(DecisionTree::fit(&resample)?);
    }

    Ok(RandomForest { trees })
}

impl<L, F> RandomForest<L, F>
where
    L: Clone + Eq + Hash + Debug + Ord,
    F: Float,
{
    /// Predicts the label for a new feature vector by majority vote.
    ///
    /// # Errors
    ///
    /// Returns `ForestError::Tree` if the vector's length differs from
    /// the dimensionality the ensemble was fitted on.
    pub fn predict(&self, features: ArrayView1<F>) -> Result<L, ForestError> {
        let mut votes: HashMap<L, usize> = HashMap::new();
        for tree in &self.trees {
            *votes.entry(tree.predict(features)?).or_insert(0) += 1;
        }

        // We expect this to be Some, since a fitted forest holds at
        // least one tree.
        Ok(winning_label(votes).unwrap())
    }

    /// Number of trees in the ensemble.
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

/// The label with the most votes; ties resolve to the lowest label.
fn winning_label<L: Ord>(votes: HashMap<L, usize>) -> Option<L> {
    votes
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
        .map(|(label, _)| label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable_data() -> Vec<Sample<&'static str, f64>> {
        vec![
            Sample::new(array![1.0, 1.0], "A"),
            Sample::new(array![2.0, 2.0], "A"),
            Sample::new(array![1.0, 2.0], "A"),
            Sample::new(array![2.0, 1.0], "A"),
            Sample::new(array![8.0, 8.0], "B"),
            Sample::new(array![9.0, 8.0], "B"),
            Sample::new(array![8.0, 9.0], "B"),
            Sample::new(array![9.0, 9.0], "B"),
        ]
    }

    #[test]
    fn test_majority_vote_on_separable_data() {
        let forest = fit_with_seed(&separable_data(), 25, 7).unwrap();
        assert_eq!(forest.n_trees(), 25);
        assert_eq!(forest.predict(array![1.5, 1.5].view()).unwrap(), "A");
        assert_eq!(forest.predict(array![8.5, 8.5].view()).unwrap(), "B");
    }

    #[test]
    fn test_same_seed_reproduces_predictions() {
        let data = separable_data();
        let first = fit_with_seed(&data, 15, 42).unwrap();
        let second = fit_with_seed(&data, 15, 42).unwrap();

        for x in 0..10 {
            for y in 0..10 {
                let point = array![x as f64, y as f64];
                assert_eq!(
                    first.predict(point.view()).unwrap(),
                    second.predict(point.view()).unwrap()
                );
            }
        }
    }

    #[test]
    fn test_error_on_zero_trees() {
        let result = fit_with_seed(&separable_data(), 0, 42);
        assert!(matches!(result, Err(ForestError::NoTrees)));
    }

    #[test]
    fn test_error_on_empty_training_set() {
        let data: Vec<Sample<&str, f64>> = vec![];
        let result = fit_with_seed(&data, 10, 42);
        assert!(matches!(result, Err(ForestError::EmptyTrainingSet)));
    }

    #[test]
    fn test_error_on_query_dimension_mismatch() {
        let forest = fit_with_seed(&separable_data(), 5, 42).unwrap();
        let result = forest.predict(array![1.0].view());
        assert_eq!(
            result,
            Err(ForestError::Tree(TreeError::DimensionMismatch {
                expected: 2,
                found: 1
            }))
        );
    }

    #[test]
    fn test_vote_tie_breaks_to_lowest_label() {
        let mut votes = HashMap::new();
        votes.insert(2_usize, 5);
        votes.insert(0_usize, 5);
        votes.insert(1_usize, 3);
        assert_eq!(winning_label(votes), Some(0));
    }
}
