//! Analytical performance characteristics of a control series.
//!
//! Mean, SD, and CV% as reported beneath the Levey-Jennings chart, rounded
//! half-up to two decimals.

use serde::{Deserialize, Serialize};

use super::limits::LimitSet;
use crate::error::{QcError, Result};
use crate::numeric::{coefficient_of_variation, round_half_up};

/// Decimal places used for reported figures.
pub const REPORT_DECIMALS: u32 = 2;

/// Mean, SD, and CV% of the values behind a [`LimitSet`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub mean: f64,
    pub sd: f64,
    /// `100 * sd / mean`; `None` when the mean is zero.
    pub cv_percent: Option<f64>,
}

impl PerformanceSummary {
    /// Summarizes `limits`, rounding each figure half-up to two decimals.
    ///
    /// The CV is computed from the unrounded mean and SD; a zero mean leaves
    /// `cv_percent` empty and [`cv`](Self::cv) reports it.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_iqc::spc::{LimitSet, LimitSource, PerformanceSummary};
    ///
    /// let limits = LimitSet::from_mean_sd(120.0, 3.0, LimitSource::Custom).unwrap();
    /// let summary = PerformanceSummary::from_limits(&limits);
    /// assert_eq!(summary.cv_percent, Some(2.5));
    /// ```
    pub fn from_limits(limits: &LimitSet) -> Self {
        let cv_percent = coefficient_of_variation(limits.mean, limits.sd)
            .map(|cv| round_half_up(cv, REPORT_DECIMALS))
            .ok();
        Self {
            mean: round_half_up(limits.mean, REPORT_DECIMALS),
            sd: round_half_up(limits.sd, REPORT_DECIMALS),
            cv_percent,
        }
    }

    /// CV%.
    ///
    /// # Errors
    ///
    /// [`QcError::InvalidParameter`] when the mean is zero.
    pub fn cv(&self) -> Result<f64> {
        self.cv_percent
            .ok_or_else(|| QcError::invalid("mean", "mean value cannot be zero"))
    }
}
