//! Iris species classification from four flower measurements.
//!
//! Training runs once at startup: dataset acquisition (external file
//! or the built-in reference table), label encoding, feature
//! standardization, and a bagged tree ensemble, all folded into one
//! immutable [`FittedPipeline`]. Inference validates raw text inputs,
//! scales them with the fitted parameters, takes the ensemble's
//! majority vote, and decodes the winning code back to a species name.
//!
//! ```no_run
//! let pipeline = petal::train()?;
//! let species = pipeline.predict_species(["5.1", "3.5", "1.4", "0.2"])?;
//! println!("predicted: {species}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod dataset;
pub mod encoder;
pub mod logging;
pub mod pipeline;
pub mod scaler;

pub use dataset::{Dataset, DatasetError, DatasetSource};
pub use encoder::{CodebookError, LabelCodebook};
pub use pipeline::{
    FittedPipeline, InputField, InternalError, InvalidField, InvalidReason, PredictError,
    TrainError, train,
};
pub use scaler::{ScalerError, StandardScaler};

pub use decision_tree::{DecisionTree, TreeError};
pub use petal_helpers::{Float, Sample};
pub use random_forest::{ForestError, RandomForest};
