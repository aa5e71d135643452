//! The training and inference pipeline.
//!
//! [`train`] runs the full sequence once — load, encode, split, scale,
//! fit — and yields an immutable [`FittedPipeline`]. Every inference
//! call reads that value; nothing is mutated after training, so the
//! fitted state can be shared freely.

use std::fmt::{Display, Formatter};

use ndarray::Array1;
use petal_helpers::Sample;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_xoshiro::Xoshiro256PlusPlus;
use thiserror::Error;
use tracing::{error, info};

use crate::dataset::{self, Dataset, DatasetError, DatasetSource};
use crate::encoder::{CodebookError, LabelCodebook};
use crate::scaler::{ScalerError, StandardScaler};
use random_forest::{ForestError, RandomForest};

/// Measurements per sample.
pub const N_FEATURES: usize = 4;
/// Trees in the ensemble.
pub const N_TREES: usize = 100;
/// Seed for the train/held-out shuffle.
pub const SPLIT_SEED: u64 = 42;
/// Seed for the ensemble's bootstrap draws.
pub const FOREST_SEED: u64 = 42;
/// Share of the dataset set aside and not fitted on.
pub const HELD_OUT_FRACTION: f64 = 0.2;
/// Inclusive bounds every raw measurement must fall in, in centimeters.
pub const FEATURE_MIN: f64 = 0.1;
pub const FEATURE_MAX: f64 = 10.0;

/// One of the four raw input fields, in input order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    SepalLength,
    SepalWidth,
    PetalLength,
    PetalWidth,
}

impl InputField {
    pub const ALL: [InputField; N_FEATURES] = [
        InputField::SepalLength,
        InputField::SepalWidth,
        InputField::PetalLength,
        InputField::PetalWidth,
    ];

    pub fn name(self) -> &'static str {
        match self {
            InputField::SepalLength => "sepal length",
            InputField::SepalWidth => "sepal width",
            InputField::PetalLength => "petal length",
            InputField::PetalWidth => "petal width",
        }
    }
}

impl Display for InputField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a raw input field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    NotANumber,
    OutOfRange,
}

/// One rejected input field, with the offending raw value.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidField {
    pub field: InputField,
    pub value: String,
    pub reason: InvalidReason,
}

impl Display for InvalidField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.reason {
            InvalidReason::NotANumber => {
                write!(f, "{}: `{}` is not a number", self.field, self.value)
            }
            InvalidReason::OutOfRange => write!(
                f,
                "{}: {} is outside {FEATURE_MIN} to {FEATURE_MAX}",
                self.field, self.value
            ),
        }
    }
}

/// Errors that abort training. No partially initialized pipeline is
/// ever produced: on error there is no model, no scaler, no codebook.
#[derive(Debug, Error)]
pub enum TrainError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("dataset has too few samples to split: {n_samples}")]
    TooFewSamples { n_samples: usize },
    #[error("species `{species}` has no samples in the training split")]
    MissingTrainingClass { species: String },
    #[error("failed to build the label codebook: {0}")]
    Codebook(#[from] CodebookError),
    #[error("failed to fit the feature scaler: {0}")]
    Scaler(#[from] ScalerError),
    #[error("failed to fit the ensemble: {0}")]
    Forest(#[from] ForestError),
}

/// Contract violations inside a fitted pipeline. These should be
/// unreachable; they are logged at `error` level when they surface.
#[derive(Debug, Error)]
pub enum InternalError {
    #[error("classifier produced a code outside the codebook: {0}")]
    UnknownCode(usize),
    #[error("feature scaling failed: {0}")]
    Scaler(#[from] ScalerError),
    #[error("ensemble query failed: {0}")]
    Forest(#[from] ForestError),
}

/// Errors from one inference call.
#[derive(Debug, Error)]
pub enum PredictError {
    /// One or more raw inputs failed validation; every offending field
    /// is reported. Recoverable — pipeline state is unaffected.
    #[error("invalid input: {}", describe_fields(.0))]
    Invalid(Vec<InvalidField>),
    #[error(transparent)]
    Internal(#[from] InternalError),
}

fn describe_fields(fields: &[InvalidField]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// The immutable result of training: codebook, scaling parameters,
/// fitted ensemble, and the provenance of the data they came from.
///
/// Constructing one is the only way to train, so holding a
/// `FittedPipeline` is proof the full training sequence succeeded.
#[derive(Debug, Clone)]
pub struct FittedPipeline {
    codebook: LabelCodebook,
    scaler: StandardScaler,
    forest: RandomForest<usize, f64>,
    source: DatasetSource,
}

/// Trains the pipeline on the dataset at the fixed external location,
/// falling back to the built-in reference table if it is absent.
pub fn train() -> Result<FittedPipeline, TrainError> {
    FittedPipeline::fit(dataset::load()?)
}

impl FittedPipeline {
    /// Runs the full training sequence on an already loaded dataset:
    /// codebook over all labels, seeded shuffle-split, scaler and
    /// ensemble fitted on the training share only.
    pub fn fit(dataset: Dataset) -> Result<Self, TrainError> {
        let Dataset { samples, source } = dataset;

        let codebook = LabelCodebook::fit(samples.iter().map(|s| s.label.as_str()))?;
        let (train_indices, held_out) = split_indices(samples.len())?;
        info!(
            source = ?source,
            samples = samples.len(),
            training = train_indices.len(),
            held_out = held_out.len(),
            species = codebook.len(),
            "training pipeline"
        );

        let mut class_seen = vec![false; codebook.len()];
        let mut train_codes = Vec::with_capacity(train_indices.len());
        for &index in &train_indices {
            let code = codebook.encode(&samples[index].label)?;
            class_seen[code] = true;
            train_codes.push(code);
        }
        if let Some(code) = class_seen.iter().position(|&seen| !seen) {
            let species = codebook.decode(code)?.to_string();
            return Err(TrainError::MissingTrainingClass { species });
        }

        let train_features: Vec<_> = train_indices
            .iter()
            .map(|&index| samples[index].features.view())
            .collect();
        let scaler = StandardScaler::fit(&train_features)?;

        let mut train_set = Vec::with_capacity(train_indices.len());
        for (&index, &code) in train_indices.iter().zip(&train_codes) {
            let scaled = scaler.transform(samples[index].features.view())?;
            train_set.push(Sample::new(scaled, code));
        }
        let forest = random_forest::fit_with_seed(&train_set, N_TREES, FOREST_SEED)?;
        info!(trees = forest.n_trees(), "ensemble fitted");

        Ok(Self {
            codebook,
            scaler,
            forest,
            source,
        })
    }

    /// Classifies one flower from its four raw text measurements.
    ///
    /// Each field must parse as a real number between [`FEATURE_MIN`]
    /// and [`FEATURE_MAX`], inclusive. On validation failure every
    /// offending field is reported and the classifier is never
    /// consulted. Trained state is read, never written.
    pub fn predict_species(&self, raw_inputs: [&str; N_FEATURES]) -> Result<String, PredictError> {
        let mut values = [0.0_f64; N_FEATURES];
        let mut invalid = Vec::new();
        for ((slot, field), raw) in values.iter_mut().zip(InputField::ALL).zip(raw_inputs) {
            match validate_field(field, raw) {
                Ok(value) => *slot = value,
                Err(rejection) => invalid.push(rejection),
            }
        }
        if !invalid.is_empty() {
            return Err(PredictError::Invalid(invalid));
        }

        let features = Array1::from_iter(values);
        let scaled = match self.scaler.transform(features.view()) {
            Ok(scaled) => scaled,
            Err(err) => return Err(self.internal(InternalError::Scaler(err))),
        };
        let code = match self.forest.predict(scaled.view()) {
            Ok(code) => code,
            Err(err) => return Err(self.internal(InternalError::Forest(err))),
        };
        match self.codebook.decode(code) {
            Ok(species) => Ok(species.to_string()),
            Err(_) => Err(self.internal(InternalError::UnknownCode(code))),
        }
    }

    /// Which source the training data came from.
    pub fn dataset_source(&self) -> &DatasetSource {
        &self.source
    }

    /// The species the pipeline can predict, in code order.
    pub fn species(&self) -> &[String] {
        self.codebook.labels()
    }

    /// The fitted scaling parameters.
    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    fn internal(&self, err: InternalError) -> PredictError {
        error!(%err, "inference hit an internal invariant failure");
        PredictError::Internal(err)
    }
}

fn validate_field(field: InputField, raw: &str) -> Result<f64, InvalidField> {
    let reject = |reason| InvalidField {
        field,
        value: raw.to_string(),
        reason,
    };

    let Ok(value) = raw.trim().parse::<f64>() else {
        return Err(reject(InvalidReason::NotANumber));
    };
    if value.is_nan() {
        return Err(reject(InvalidReason::NotANumber));
    }
    if !(FEATURE_MIN..=FEATURE_MAX).contains(&value) {
        return Err(reject(InvalidReason::OutOfRange));
    }
    Ok(value)
}

/// Deterministic 80/20 shuffle-split: indices are shuffled with a
/// fixed-seed rng, the first `ceil(n × 0.2)` are held out, the rest
/// train. The held-out share is not evaluated in this deployment, but
/// it must never influence the fitted parameters.
fn split_indices(n_samples: usize) -> Result<(Vec<usize>, Vec<usize>), TrainError> {
    let held_out = ((n_samples as f64) * HELD_OUT_FRACTION).ceil() as usize;
    if held_out >= n_samples {
        return Err(TrainError::TooFewSamples { n_samples });
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(SPLIT_SEED);
    indices.shuffle(&mut rng);

    let train = indices.split_off(held_out);
    Ok((train, indices))
}
