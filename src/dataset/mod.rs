//! Dataset acquisition: an external tabular file when present, the
//! embedded reference table otherwise.

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};

use ndarray::Array1;
use petal_helpers::Sample;
use thiserror::Error;
use tracing::info;

mod builtin;

/// Fixed location the loader checks for an external dataset, resolved
/// against the working directory.
pub const DEFAULT_DATASET_PATH: &str = "iris.csv";

/// Canonical species names, indexed by the built-in table's class codes.
pub const SPECIES_NAMES: [&str; 3] = ["setosa", "versicolor", "virginica"];

const EXPECTED_COLUMNS: [&str; 5] = [
    "sepal_length",
    "sepal_width",
    "petal_length",
    "petal_width",
    "species",
];

/// Where a [`Dataset`] came from.
///
/// Falling back to the built-in table is legitimate behavior, but a
/// reproducibility hazard if it happens silently; the flag keeps the
/// substitution observable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    /// Read from an external file at the recorded path.
    External(PathBuf),
    /// The embedded reference table; used when no external file exists.
    BuiltIn,
}

/// An ordered collection of labeled samples plus its provenance.
///
/// Every sample holds exactly four features and a non-empty label; the
/// loader rejects anything else, so no partial dataset can exist.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub samples: Vec<Sample<String, f64>>,
    pub source: DatasetSource,
}

/// Errors from reading or parsing an external dataset file.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("dataset {path} is empty; expected a header row")]
    MissingHeader { path: PathBuf },
    #[error(
        "dataset {path} has unexpected columns `{found}`; expected \
         `sepal_length,sepal_width,petal_length,petal_width,species`"
    )]
    WrongColumns { path: PathBuf, found: String },
    #[error("line {line} of {path}: expected 5 fields, found {found}")]
    WrongFieldCount {
        path: PathBuf,
        line: usize,
        found: usize,
    },
    #[error("line {line} of {path}: `{value}` is not a positive numeric {column} value")]
    BadFeature {
        path: PathBuf,
        line: usize,
        column: &'static str,
        value: String,
    },
    #[error("line {line} of {path}: species label is empty")]
    EmptyLabel { path: PathBuf, line: usize },
    #[error("dataset {path} contains no samples")]
    Empty { path: PathBuf },
}

/// Loads the dataset from [`DEFAULT_DATASET_PATH`], falling back to
/// the built-in table if the file does not exist.
pub fn load() -> Result<Dataset, DatasetError> {
    load_or_builtin(Path::new(DEFAULT_DATASET_PATH))
}

/// Loads the dataset from `path`, falling back to the built-in table
/// if the file does not exist.
///
/// Only absence triggers the fallback: a file that exists but cannot
/// be read or parsed is an error, never a silent substitution.
pub fn load_or_builtin(path: &Path) -> Result<Dataset, DatasetError> {
    match File::open(path) {
        Ok(file) => {
            let samples = parse(BufReader::new(file), path)?;
            info!(
                path = %path.display(),
                samples = samples.len(),
                "loaded external dataset"
            );
            Ok(Dataset {
                samples,
                source: DatasetSource::External(path.to_path_buf()),
            })
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {
            info!(
                path = %path.display(),
                "dataset file not found; using the built-in reference table"
            );
            Ok(builtin())
        }
        Err(source) => Err(DatasetError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// The built-in reference dataset: 150 samples, 3 species, fixed.
pub fn builtin() -> Dataset {
    let samples = builtin::ROWS
        .iter()
        .map(|&(features, class)| {
            Sample::new(
                Array1::from_iter(features),
                SPECIES_NAMES[class].to_string(),
            )
        })
        .collect();
    Dataset {
        samples,
        source: DatasetSource::BuiltIn,
    }
}

fn parse<R: BufRead>(reader: R, path: &Path) -> Result<Vec<Sample<String, f64>>, DatasetError> {
    let mut lines = reader.lines();

    let header = match lines.next() {
        Some(Ok(line)) => line,
        Some(Err(source)) => return Err(read_error(path, source)),
        None => {
            return Err(DatasetError::MissingHeader {
                path: path.to_path_buf(),
            });
        }
    };
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();
    if columns != EXPECTED_COLUMNS {
        return Err(DatasetError::WrongColumns {
            path: path.to_path_buf(),
            found: header.trim().to_string(),
        });
    }

    let mut samples = Vec::new();
    for (index, line) in lines.enumerate() {
        let line_number = index + 2; // 1-based, after the header
        let line = line.map_err(|source| read_error(path, source))?;
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != EXPECTED_COLUMNS.len() {
            return Err(DatasetError::WrongFieldCount {
                path: path.to_path_buf(),
                line: line_number,
                found: fields.len(),
            });
        }

        let mut features = [0.0_f64; 4];
        for (slot, (value, column)) in features
            .iter_mut()
            .zip(fields.iter().zip(EXPECTED_COLUMNS))
        {
            match value.parse::<f64>() {
                Ok(parsed) if parsed.is_finite() && parsed > 0.0 => *slot = parsed,
                _ => {
                    return Err(DatasetError::BadFeature {
                        path: path.to_path_buf(),
                        line: line_number,
                        column,
                        value: value.to_string(),
                    });
                }
            }
        }

        let label = fields[4];
        if label.is_empty() {
            return Err(DatasetError::EmptyLabel {
                path: path.to_path_buf(),
                line: line_number,
            });
        }

        samples.push(Sample::new(
            Array1::from_iter(features),
            label.to_string(),
        ));
    }

    if samples.is_empty() {
        return Err(DatasetError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(samples)
}

fn read_error(path: &Path, source: std::io::Error) -> DatasetError {
    DatasetError::Read {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const HEADER: &str = "sepal_length,sepal_width,petal_length,petal_width,species";

    fn write_dataset(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("iris.csv");
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_builtin_shape() {
        let dataset = builtin();
        assert_eq!(dataset.source, DatasetSource::BuiltIn);
        assert_eq!(dataset.samples.len(), 150);
        for name in SPECIES_NAMES {
            let count = dataset
                .samples
                .iter()
                .filter(|sample| sample.label == name)
                .count();
            assert_eq!(count, 50, "expected 50 samples of {name}");
        }
    }

    #[test]
    fn test_loads_external_file() {
        let (_dir, path) = write_dataset(&format!(
            "{HEADER}\n5.1,3.5,1.4,0.2,setosa\n6.2,2.9,4.3,1.3,versicolor\n"
        ));
        let dataset = load_or_builtin(&path).unwrap();
        assert_eq!(dataset.source, DatasetSource::External(path));
        assert_eq!(dataset.samples.len(), 2);
        assert_eq!(dataset.samples[0].label, "setosa");
        assert_eq!(dataset.samples[0].features[2], 1.4);
    }

    #[test]
    fn test_missing_file_falls_back_to_builtin() {
        let dir = tempdir().unwrap();
        let dataset = load_or_builtin(&dir.path().join("nowhere.csv")).unwrap();
        assert_eq!(dataset.source, DatasetSource::BuiltIn);
        assert_eq!(dataset.samples.len(), 150);
    }

    #[test]
    fn test_wrong_columns_are_rejected() {
        let (_dir, path) = write_dataset("a,b,c,d,e\n1,2,3,4,setosa\n");
        assert!(matches!(
            load_or_builtin(&path),
            Err(DatasetError::WrongColumns { .. })
        ));
    }

    #[test]
    fn test_bad_feature_value_names_line_and_column() {
        let (_dir, path) = write_dataset(&format!(
            "{HEADER}\n5.1,3.5,1.4,0.2,setosa\n5.1,oops,1.4,0.2,setosa\n"
        ));
        match load_or_builtin(&path) {
            Err(DatasetError::BadFeature {
                line,
                column,
                value,
                ..
            }) => {
                assert_eq!(line, 3);
                assert_eq!(column, "sepal_width");
                assert_eq!(value, "oops");
            }
            other => panic!("expected BadFeature, got {other:?}"),
        }
    }

    #[test]
    fn test_non_positive_feature_is_rejected() {
        let (_dir, path) = write_dataset(&format!("{HEADER}\n5.1,-3.5,1.4,0.2,setosa\n"));
        assert!(matches!(
            load_or_builtin(&path),
            Err(DatasetError::BadFeature { .. })
        ));
    }

    #[test]
    fn test_wrong_field_count_is_rejected() {
        let (_dir, path) = write_dataset(&format!("{HEADER}\n5.1,3.5,1.4,setosa\n"));
        match load_or_builtin(&path) {
            Err(DatasetError::WrongFieldCount { line, found, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(found, 4);
            }
            other => panic!("expected WrongFieldCount, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_label_is_rejected() {
        let (_dir, path) = write_dataset(&format!("{HEADER}\n5.1,3.5,1.4,0.2,\n"));
        assert!(matches!(
            load_or_builtin(&path),
            Err(DatasetError::EmptyLabel { line: 2, .. })
        ));
    }

    #[test]
    fn test_header_only_file_is_empty() {
        let (_dir, path) = write_dataset(&format!("{HEADER}\n"));
        assert!(matches!(
            load_or_builtin(&path),
            Err(DatasetError::Empty { .. })
        ));
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let (_dir, path) = write_dataset(&format!(
            "{HEADER}\n5.1,3.5,1.4,0.2,setosa\n\n6.2,2.9,4.3,1.3,versicolor\n"
        ));
        let dataset = load_or_builtin(&path).unwrap();
        assert_eq!(dataset.samples.len(), 2);
    }
}
