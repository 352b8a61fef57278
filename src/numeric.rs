//! Shared numeric helpers: report rounding and guarded division.

use crate::error::{QcError, Result};

/// Rounds `value` to `decimals` places with ties going up.
///
/// Reported figures (mean, SD, CV, sigma) use half-up rounding rather than
/// the banker's rounding some spreadsheet tools apply, so `2.345` reports
/// as `2.35`.
///
/// ```text
/// round_half_up(n, d) = floor(n * 10^d + 0.5) / 10^d
/// ```
///
/// # Examples
///
/// ```
/// use u_iqc::numeric::round_half_up;
///
/// assert_eq!(round_half_up(2.5, 0), 3.0);
/// assert_eq!(round_half_up(1.005_1, 2), 1.01);
/// assert_eq!(round_half_up(-2.5, 0), -2.0);
/// ```
pub fn round_half_up(value: f64, decimals: u32) -> f64 {
    let multiplier = 10f64.powi(decimals as i32);
    (value * multiplier + 0.5).floor() / multiplier
}

/// Divides `numerator` by `denominator`, refusing a zero or non-finite divisor.
///
/// `name` and `reason` describe the divisor in the returned
/// [`QcError::InvalidParameter`].
pub fn checked_ratio(
    numerator: f64,
    denominator: f64,
    name: &'static str,
    reason: &str,
) -> Result<f64> {
    if denominator == 0.0 || !denominator.is_finite() {
        return Err(QcError::invalid(name, reason));
    }
    let ratio = numerator / denominator;
    if ratio.is_finite() {
        Ok(ratio)
    } else {
        Err(QcError::invalid(name, reason))
    }
}

/// Coefficient of variation in percent, `100 * sd / mean`.
///
/// # Errors
///
/// [`QcError::InvalidParameter`] when `mean` is zero.
pub fn coefficient_of_variation(mean: f64, sd: f64) -> Result<f64> {
    checked_ratio(sd * 100.0, mean, "mean", "mean value cannot be zero")
}
