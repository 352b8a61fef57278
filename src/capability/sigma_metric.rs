//! Sigma-metrics of analytical performance.
//!
//! # Formulas
//!
//! The conventional metric relates the allowable total error left after
//! bias to the imprecision:
//!
//! ```text
//! sigma = (TEa - bias) / CV
//! ```
//!
//! The biological-variation alternative replaces the allowable error with
//! the within-subject biological variation:
//!
//! ```text
//! sigma = CVI / CV
//! ```
//!
//! All quantities are percentages.
//!
//! # References
//!
//! - Westgard, J.O. & Westgard, S.A. (2006). "The quality of laboratory
//!   testing today", *American Journal of Clinical Pathology* 125(3),
//!   pp. 343-354.
//! - Westgard, S. et al. (2018). "Six Sigma metric analysis for analytical
//!   testing processes", *Clinical Chemistry and Laboratory Medicine*.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{QcError, Result};
use crate::numeric::checked_ratio;

const ZERO_CV: &str = "imprecision cannot be zero";

fn check_cv(cv: f64) -> Result<()> {
    if !cv.is_finite() || cv < 0.0 {
        return Err(QcError::invalid("cv", "must be finite and non-negative"));
    }
    if cv == 0.0 {
        return Err(QcError::invalid("cv", ZERO_CV));
    }
    Ok(())
}

/// Conventional sigma-metric, `(TEa - bias) / CV`.
///
/// # Errors
///
/// - [`QcError::InvalidParameter`] if `cv` is zero, negative, or not finite,
///   or if `tea` or `bias` is not finite.
/// - [`QcError::DegenerateMetric`] if `bias >= tea`: no allowable error is
///   left, so any sigma would be zero or negative.
///
/// # Examples
///
/// ```
/// use u_iqc::capability::sigma_metric;
///
/// assert_eq!(sigma_metric(12.0, 2.0, 2.0).unwrap(), 5.0);
/// assert!(sigma_metric(12.0, 2.0, 0.0).is_err());
/// ```
pub fn sigma_metric(tea: f64, bias: f64, cv: f64) -> Result<f64> {
    if !tea.is_finite() {
        return Err(QcError::invalid("tea", "must be finite"));
    }
    if !bias.is_finite() {
        return Err(QcError::invalid("bias", "must be finite"));
    }
    check_cv(cv)?;
    if bias >= tea {
        warn!(tea, bias, "bias leaves no allowable error");
        return Err(QcError::DegenerateMetric { bias, tea });
    }
    checked_ratio(tea - bias, cv, "cv", ZERO_CV)
}

/// Biological-variation sigma-metric, `CVI / CV`.
///
/// # Errors
///
/// [`QcError::InvalidParameter`] if `cv` is zero, negative, or not finite,
/// or `cvi` is negative or not finite.
///
/// # Examples
///
/// ```
/// use u_iqc::capability::biological_sigma_metric;
///
/// assert_eq!(biological_sigma_metric(12.0, 2.0).unwrap(), 6.0);
/// ```
pub fn biological_sigma_metric(cvi: f64, cv: f64) -> Result<f64> {
    if !cvi.is_finite() || cvi < 0.0 {
        return Err(QcError::invalid("cvi", "must be finite and non-negative"));
    }
    check_cv(cv)?;
    checked_ratio(cvi, cv, "cv", ZERO_CV)
}

/// Performance band of a sigma value, matching the iso-sigma lines of an
/// OPSpecs chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SigmaGrade {
    /// Below 2 sigma.
    Unacceptable,
    /// 2 to 3 sigma.
    Poor,
    /// 3 to 4 sigma.
    Marginal,
    /// 4 to 5 sigma.
    Good,
    /// 5 to 6 sigma.
    Excellent,
    /// 6 sigma and above.
    WorldClass,
}

impl SigmaGrade {
    /// Classifies `sigma`. NaN grades as unacceptable.
    pub fn from_sigma(sigma: f64) -> Self {
        match sigma {
            s if s >= 6.0 => SigmaGrade::WorldClass,
            s if s >= 5.0 => SigmaGrade::Excellent,
            s if s >= 4.0 => SigmaGrade::Good,
            s if s >= 3.0 => SigmaGrade::Marginal,
            s if s >= 2.0 => SigmaGrade::Poor,
            _ => SigmaGrade::Unacceptable,
        }
    }
}

impl fmt::Display for SigmaGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SigmaGrade::Unacceptable => "unacceptable",
            SigmaGrade::Poor => "poor",
            SigmaGrade::Marginal => "marginal",
            SigmaGrade::Good => "good",
            SigmaGrade::Excellent => "excellent",
            SigmaGrade::WorldClass => "world class",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conventional_known_value() {
        assert_eq!(sigma_metric(12.0, 2.0, 2.0).expect("valid"), 5.0);
    }

    #[test]
    fn test_conventional_negative_bias_adds_headroom() {
        let sigma = sigma_metric(10.0, -2.0, 3.0).expect("valid");
        assert!((sigma - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_biological_known_value() {
        assert_eq!(biological_sigma_metric(12.0, 2.0).expect("valid"), 6.0);
    }

    #[test]
    fn test_zero_cv_is_invalid_parameter() {
        for err in [
            sigma_metric(12.0, 2.0, 0.0).unwrap_err(),
            biological_sigma_metric(12.0, 0.0).unwrap_err(),
        ] {
            assert_eq!(
                err,
                QcError::InvalidParameter {
                    name: "cv",
                    reason: "imprecision cannot be zero".to_string(),
                }
            );
        }
    }

    #[test]
    fn test_bias_at_or_above_tea_is_degenerate() {
        assert_eq!(
            sigma_metric(10.0, 10.0, 2.0).unwrap_err(),
            QcError::DegenerateMetric {
                bias: 10.0,
                tea: 10.0
            }
        );
        assert!(matches!(
            sigma_metric(10.0, 12.0, 2.0),
            Err(QcError::DegenerateMetric { .. })
        ));
    }

    #[test]
    fn test_zero_cv_takes_precedence_over_degenerate() {
        assert!(matches!(
            sigma_metric(10.0, 12.0, 0.0),
            Err(QcError::InvalidParameter { name: "cv", .. })
        ));
    }

    #[test]
    fn test_non_finite_inputs_rejected() {
        assert!(sigma_metric(f64::NAN, 1.0, 1.0).is_err());
        assert!(sigma_metric(10.0, f64::INFINITY, 1.0).is_err());
        assert!(sigma_metric(10.0, 1.0, -1.0).is_err());
        assert!(biological_sigma_metric(-1.0, 1.0).is_err());
    }

    #[test]
    fn test_grade_bands() {
        assert_eq!(SigmaGrade::from_sigma(6.0), SigmaGrade::WorldClass);
        assert_eq!(SigmaGrade::from_sigma(5.99), SigmaGrade::Excellent);
        assert_eq!(SigmaGrade::from_sigma(4.0), SigmaGrade::Good);
        assert_eq!(SigmaGrade::from_sigma(3.5), SigmaGrade::Marginal);
        assert_eq!(SigmaGrade::from_sigma(2.0), SigmaGrade::Poor);
        assert_eq!(SigmaGrade::from_sigma(1.0), SigmaGrade::Unacceptable);
        assert_eq!(SigmaGrade::from_sigma(f64::NAN), SigmaGrade::Unacceptable);
        assert!(SigmaGrade::WorldClass > SigmaGrade::Good);
        assert_eq!(SigmaGrade::WorldClass.to_string(), "world class");
    }
}
