//! Levey-Jennings control limits.
//!
//! A [`LimitSet`] holds the center line and the ±1, ±2, ±3 SD bands that
//! the Westgard rules are evaluated against. The mean and SD come either
//! from the series itself or from a target the laboratory supplies.
//!
//! # References
//!
//! - Levey, S. & Jennings, E.R. (1950). "The use of control charts in the
//!   clinical laboratory", *American Journal of Clinical Pathology* 20(11),
//!   pp. 1059-1066.

use serde::{Deserialize, Serialize};
use tracing::debug;
use u_numflow::stats;

use crate::error::{QcError, Result};
use crate::series::Series;

/// Where the mean and SD of a [`LimitSet`] come from.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum LimitMode {
    /// Mean and population SD of the series.
    #[default]
    Sample,
    /// A user-supplied target mean and SD, independent of the series.
    Custom { mean: f64, sd: f64 },
}

/// Which [`LimitMode`] produced a [`LimitSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitSource {
    Sample,
    Custom,
}

/// Center line and SD bands of a Levey-Jennings chart.
///
/// # Invariants
///
/// - `sd >= 0` and all values are finite.
/// - `plus_ksd - mean == mean - minus_ksd == k * sd` for k in 1..=3.
/// - When `sd == 0` every band collapses onto the mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimitSet {
    pub mean: f64,
    pub sd: f64,
    pub plus_1sd: f64,
    pub minus_1sd: f64,
    pub plus_2sd: f64,
    pub minus_2sd: f64,
    pub plus_3sd: f64,
    pub minus_3sd: f64,
    pub source: LimitSource,
}

impl LimitSet {
    /// Computes limits for `series` under `mode`.
    ///
    /// In [`LimitMode::Sample`] the SD is the population SD (divisor `N`),
    /// so a single observation yields `sd = 0`.
    ///
    /// # Errors
    ///
    /// - [`QcError::MissingData`] for an empty series in sample mode.
    /// - [`QcError::InvalidParameter`] named `series` when the sample mean or
    ///   SD overflows `f64`.
    /// - [`QcError::InvalidParameter`] for a negative or non-finite custom SD,
    ///   or a non-finite custom mean.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_iqc::series::Series;
    /// use u_iqc::spc::{LimitMode, LimitSet};
    ///
    /// let series = Series::from(vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
    /// let limits = LimitSet::compute(&series, LimitMode::Sample).unwrap();
    /// assert!((limits.mean - 5.0).abs() < 1e-12);
    /// assert!((limits.sd - 2.0).abs() < 1e-12);
    /// assert!((limits.plus_3sd - 11.0).abs() < 1e-12);
    /// ```
    pub fn compute(series: &Series, mode: LimitMode) -> Result<Self> {
        match mode {
            LimitMode::Sample => {
                let (mean, sd) = sample_mean_sd(series)?;
                debug!(n = series.len(), mean, sd, "sample limits");
                Self::from_mean_sd(mean, sd, LimitSource::Sample)
            }
            LimitMode::Custom { mean, sd } => {
                debug!(mean, sd, "custom limits");
                Self::from_mean_sd(mean, sd, LimitSource::Custom)
            }
        }
    }

    /// Builds the bands `mean ± k·sd` for k in 1..=3.
    ///
    /// # Errors
    ///
    /// [`QcError::InvalidParameter`] if `mean` is not finite or `sd` is
    /// negative or not finite.
    pub fn from_mean_sd(mean: f64, sd: f64, source: LimitSource) -> Result<Self> {
        if !mean.is_finite() {
            return Err(QcError::invalid("mean", "must be finite"));
        }
        if !sd.is_finite() || sd < 0.0 {
            return Err(QcError::invalid("sd", "must be finite and non-negative"));
        }
        Ok(Self {
            mean,
            sd,
            plus_1sd: mean + sd,
            minus_1sd: mean - sd,
            plus_2sd: mean + 2.0 * sd,
            minus_2sd: mean - 2.0 * sd,
            plus_3sd: mean + 3.0 * sd,
            minus_3sd: mean - 3.0 * sd,
            source,
        })
    }

    /// The `+k SD` line, for k in 1..=3. Other values of `k` scale linearly.
    pub fn upper(&self, k: u8) -> f64 {
        self.mean + f64::from(k) * self.sd
    }

    /// The `-k SD` line.
    pub fn lower(&self, k: u8) -> f64 {
        self.mean - f64::from(k) * self.sd
    }
}

/// Arithmetic mean and population SD of the series.
pub(crate) fn sample_mean_sd(series: &Series) -> Result<(f64, f64)> {
    let data = series.values();
    let mean = stats::mean(data).ok_or(QcError::MissingData {
        what: "sample mean",
    })?;
    let sd = stats::population_std_dev(data).ok_or(QcError::MissingData {
        what: "sample standard deviation",
    })?;
    // Finite values can still overflow the accumulated sums.
    if !mean.is_finite() || !sd.is_finite() {
        return Err(QcError::invalid(
            "series",
            "sample statistics overflow; values are too large to summarize",
        ));
    }
    Ok((mean, sd))
}
