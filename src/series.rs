//! Control observations and the canonical ordered series.
//!
//! Every engine in this crate consumes a [`Series`]: the included,
//! non-missing control results in run order, re-indexed from zero. Run
//! order is significant for the window rules, EWMA, and CUSUM, so values
//! are never sorted.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A single control measurement as entered or uploaded.
///
/// `timestamp` and `index` are carried for the presentation layer and play
/// no part in evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// The control result, or `None` if the cell was empty.
    pub value: Option<f64>,
    /// Optional run timestamp, opaque to the engine.
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Optional user-supplied run index.
    #[serde(default)]
    pub index: Option<i64>,
    /// Whether the observation takes part in evaluation.
    #[serde(default = "default_included")]
    pub included: bool,
}

fn default_included() -> bool {
    true
}

impl Observation {
    /// An included observation with the given value and no metadata.
    pub fn new(value: f64) -> Self {
        Self {
            value: Some(value),
            timestamp: None,
            index: None,
            included: true,
        }
    }

    /// An included observation with no value.
    pub fn missing() -> Self {
        Self {
            value: None,
            timestamp: None,
            index: None,
            included: true,
        }
    }

    /// Sets the inclusion flag.
    pub fn with_included(mut self, included: bool) -> Self {
        self.included = included;
        self
    }

    /// Sets the run timestamp.
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Sets the run index.
    pub fn with_index(mut self, index: i64) -> Self {
        self.index = Some(index);
        self
    }
}

/// Ordered control values ready for evaluation.
///
/// # Invariants
///
/// - Values are in run order, indexed contiguously from 0.
/// - All values are finite. Construction drops NaN and ±∞ along with
///   missing and excluded entries, so chart engines fed from a `Series`
///   never see non-finite input.
///
/// An empty series is valid; engines that need data report
/// [`QcError::MissingData`](crate::QcError::MissingData).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    values: Vec<f64>,
}

impl Series {
    /// Builds a series from observations, keeping included, non-missing,
    /// finite values in order.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_iqc::series::{Observation, Series};
    ///
    /// let observations = vec![
    ///     Observation::new(10.0),
    ///     Observation::missing(),
    ///     Observation::new(11.0).with_included(false),
    ///     Observation::new(12.0),
    /// ];
    /// let series = Series::prepare(&observations);
    /// assert_eq!(series.values(), &[10.0, 12.0]);
    /// ```
    pub fn prepare(observations: &[Observation]) -> Self {
        let values: Vec<f64> = observations
            .iter()
            .filter(|o| o.included)
            .filter_map(|o| o.value)
            .filter(|v| v.is_finite())
            .collect();
        debug!(
            observations = observations.len(),
            kept = values.len(),
            "prepared control series"
        );
        Self { values }
    }

    /// Builds a series from a raw value column, dropping missing entries.
    ///
    /// This is the uploaded-column path: every row counts as included.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let values = values
            .into_iter()
            .flatten()
            .filter(|v| v.is_finite())
            .collect();
        Self { values }
    }

    /// The values in run order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series has no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `index`, or `None` past either end.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }
}

impl From<Vec<f64>> for Series {
    /// Wraps already-clean values. Non-finite values are dropped so the
    /// finiteness invariant holds.
    fn from(values: Vec<f64>) -> Self {
        Self::from_values(values.into_iter().map(Some))
    }
}

impl From<&[f64]> for Series {
    fn from(values: &[f64]) -> Self {
        Self::from_values(values.iter().copied().map(Some))
    }
}
