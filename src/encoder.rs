//! Species label encoding.

use thiserror::Error;

/// Errors from building or querying a [`LabelCodebook`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodebookError {
    #[error("cannot build a codebook from zero labels")]
    Empty,
    #[error("label `{0}` was not present when the codebook was fitted")]
    UnknownLabel(String),
    #[error("code {0} was never assigned")]
    UnknownCode(usize),
}

/// Bijective mapping between label strings and dense integer codes.
///
/// Codes are assigned in lexicographic label order, so repeated runs
/// over the same label set always produce the same codebook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelCodebook {
    labels: Vec<String>,
}

impl LabelCodebook {
    /// Builds the codebook from the labels observed at training time.
    ///
    /// Duplicates are collapsed; the distinct labels are sorted and
    /// numbered 0..k.
    ///
    /// # Errors
    ///
    /// Returns `CodebookError::Empty` if `labels` yields nothing.
    pub fn fit<'a, I>(labels: I) -> Result<Self, CodebookError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut labels: Vec<String> = labels.into_iter().map(str::to_string).collect();
        if labels.is_empty() {
            return Err(CodebookError::Empty);
        }
        labels.sort();
        labels.dedup();
        Ok(Self { labels })
    }

    /// The code assigned to `label`.
    ///
    /// Total over the labels seen at fit time; anything else is
    /// `CodebookError::UnknownLabel`.
    pub fn encode(&self, label: &str) -> Result<usize, CodebookError> {
        self.labels
            .binary_search_by(|probe| probe.as_str().cmp(label))
            .map_err(|_| CodebookError::UnknownLabel(label.to_string()))
    }

    /// The label that was assigned `code`.
    ///
    /// `CodebookError::UnknownCode` should be unreachable in normal
    /// operation, since decode only ever receives codes the classifier
    /// produced; the pipeline treats it as an internal invariant
    /// failure.
    pub fn decode(&self, code: usize) -> Result<&str, CodebookError> {
        self.labels
            .get(code)
            .map(String::as_str)
            .ok_or(CodebookError::UnknownCode(code))
    }

    /// All labels, in code order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
