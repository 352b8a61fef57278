//! Tabular Cumulative Sum (CUSUM) chart for detecting small persistent shifts.
//!
//! # Algorithm
//!
//! Given observations x_0, ..., x_{n-1} with target mean mu_0 and standard
//! deviation sigma, the standardized values are:
//!
//! ```text
//! z_i = (x_i - mu_0) / sigma
//! ```
//!
//! The first observation anchors the run; both sums start at zero there and
//! accumulate from the second observation on:
//!
//! ```text
//! C+_0 = 0,  C-_0 = 0
//! C+_i = max(0, z_i - k + C+_{i-1})
//! C-_i = max(0, -k - z_i + C-_{i-1})
//! ```
//!
//! `C-` is stored as a magnitude; charts draw it as `-C-`. A point is out of
//! control when either sum reaches the decision interval `h`.
//!
//! # Parameters
//!
//! - **k**: reference value (allowance), default 0.5 (tuned to a 1-sigma shift)
//! - **h**: decision interval, default 5
//!
//! # Reference
//!
//! Page, E.S. (1954). "Continuous inspection schemes", *Biometrika* 41(1-2), pp. 100-115.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{QcError, Result};

/// Default reference value.
pub const DEFAULT_K: f64 = 0.5;

/// Default decision interval.
pub const DEFAULT_H: f64 = 5.0;

/// CUSUM chart parameters.
///
/// # Examples
///
/// ```
/// use u_iqc::detection::Cusum;
///
/// let cusum = Cusum::new(10.0, 1.0).unwrap();
/// let mut data = vec![10.0; 10];
/// data.extend(vec![12.0; 10]); // shift of 2 sigma
/// let result = cusum.analyze(&data).unwrap();
/// assert!(!result.signal_points().is_empty());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cusum {
    /// Target process mean (mu_0).
    mean: f64,
    /// Process standard deviation (sigma).
    sd: f64,
    /// Reference value (allowance).
    k: f64,
    /// Decision interval.
    h: f64,
}

/// Upper and lower cumulative sums with their excursion masks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CusumResult {
    /// Upper cumulative sum C+.
    pub upper: Vec<f64>,
    /// Lower cumulative sum C-, as a non-negative magnitude.
    pub lower: Vec<f64>,
    /// `C+_i >= h`.
    pub upper_signal: Vec<bool>,
    /// `C-_i >= h`.
    pub lower_signal: Vec<bool>,
    /// Reference value used.
    pub k: f64,
    /// Decision interval used, applied to both sums.
    pub h: f64,
}

impl CusumResult {
    /// The lower sum negated for plotting below the axis.
    pub fn lower_display(&self) -> Vec<f64> {
        self.lower.iter().map(|c| -c).collect()
    }

    /// Indices where either sum reached `h`.
    pub fn signal_points(&self) -> Vec<usize> {
        self.upper_signal
            .iter()
            .zip(&self.lower_signal)
            .enumerate()
            .filter(|(_, (&up, &down))| up || down)
            .map(|(i, _)| i)
            .collect()
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.upper.len()
    }

    /// Whether the result has no points.
    pub fn is_empty(&self) -> bool {
        self.upper.is_empty()
    }
}

impl Cusum {
    /// Creates a CUSUM chart with k = 0.5 and h = 5.
    ///
    /// # Errors
    ///
    /// See [`with_params`](Self::with_params).
    pub fn new(mean: f64, sd: f64) -> Result<Self> {
        Self::with_params(mean, sd, DEFAULT_K, DEFAULT_H)
    }

    /// Creates a CUSUM chart with custom k and h.
    ///
    /// # Errors
    ///
    /// [`QcError::InvalidParameter`] if `mean` is not finite, `sd` is not
    /// positive, `k` is negative, or `h` is not positive.
    pub fn with_params(mean: f64, sd: f64, k: f64, h: f64) -> Result<Self> {
        if !mean.is_finite() {
            return Err(QcError::invalid("mean", "must be finite"));
        }
        if !sd.is_finite() || sd <= 0.0 {
            return Err(QcError::invalid("sd", "must be finite and positive"));
        }
        if !k.is_finite() || k < 0.0 {
            return Err(QcError::invalid("k", "must be finite and non-negative"));
        }
        if !h.is_finite() || h <= 0.0 {
            return Err(QcError::invalid("h", "must be finite and positive"));
        }
        Ok(Self { mean, sd, k, h })
    }

    /// Reference value.
    pub fn k(&self) -> f64 {
        self.k
    }

    /// Decision interval.
    pub fn h(&self) -> f64 {
        self.h
    }

    /// Computes both cumulative sums over `data`.
    ///
    /// # Errors
    ///
    /// - [`QcError::MissingData`] if `data` is empty.
    /// - [`QcError::InvalidData`] if any value is NaN or infinite.
    ///
    /// # Complexity
    ///
    /// Time: O(n), Space: O(n)
    pub fn analyze(&self, data: &[f64]) -> Result<CusumResult> {
        if data.is_empty() {
            return Err(QcError::MissingData {
                what: "CUSUM chart",
            });
        }
        if let Some((index, &value)) = data.iter().enumerate().find(|(_, x)| !x.is_finite()) {
            return Err(QcError::InvalidData { index, value });
        }

        let n = data.len();
        let mut upper = Vec::with_capacity(n);
        let mut lower = Vec::with_capacity(n);
        let mut c_plus = 0.0_f64;
        let mut c_minus = 0.0_f64;

        for (i, &x) in data.iter().enumerate() {
            if i > 0 {
                let z = (x - self.mean) / self.sd;
                c_plus = (z - self.k + c_plus).max(0.0);
                c_minus = (-self.k - z + c_minus).max(0.0);
            }
            upper.push(c_plus);
            lower.push(c_minus);
        }

        let upper_signal: Vec<bool> = upper.iter().map(|&c| c >= self.h).collect();
        let lower_signal: Vec<bool> = lower.iter().map(|&c| c >= self.h).collect();
        let result = CusumResult {
            upper,
            lower,
            upper_signal,
            lower_signal,
            k: self.k,
            h: self.h,
        };
        debug!(
            n,
            k = self.k,
            h = self.h,
            signals = result.signal_points().len(),
            "CUSUM chart"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cusum_flat_series_accumulates_nothing() {
        let cusum = Cusum::new(10.0, 1.0).expect("valid params");
        let result = cusum.analyze(&[10.0; 50]).expect("valid data");
        assert_eq!(result.len(), 50);
        assert!(result.upper.iter().all(|&c| c == 0.0));
        assert!(result.lower.iter().all(|&c| c == 0.0));
        assert!(result.signal_points().is_empty());
    }

    #[test]
    fn test_cusum_first_point_is_anchor() {
        let cusum = Cusum::new(0.0, 1.0).expect("valid params");
        let result = cusum.analyze(&[100.0, 2.0]).expect("valid data");
        // The first value is not accumulated.
        assert_eq!(result.upper[0], 0.0);
        assert_eq!(result.lower[0], 0.0);
        // C+_1 = max(0, 2 - 0.5 + 0) = 1.5
        assert!((result.upper[1] - 1.5).abs() < 1e-12);
        assert_eq!(result.lower[1], 0.0);
    }

    #[test]
    fn test_cusum_hand_computed_sequence() {
        let cusum = Cusum::new(0.0, 2.0).expect("valid params");
        let result = cusum.analyze(&[0.0, 4.0, 4.0, -6.0]).expect("valid data");
        // z = [_, 2, 2, -3]
        // C+ = [0, 1.5, 3.0, 0.0]; C- = [0, 0, 0, 2.5]
        let expected_upper = [0.0, 1.5, 3.0, 0.0];
        let expected_lower = [0.0, 0.0, 0.0, 2.5];
        for i in 0..4 {
            assert!((result.upper[i] - expected_upper[i]).abs() < 1e-12, "C+ at {i}");
            assert!((result.lower[i] - expected_lower[i]).abs() < 1e-12, "C- at {i}");
        }
        assert_eq!(result.lower_display()[3], -2.5);
    }

    #[test]
    fn test_cusum_signal_is_inclusive_of_h() {
        // k = 0, h = 2: C+ reaches exactly 2 on the third point.
        let cusum = Cusum::with_params(0.0, 1.0, 0.0, 2.0).expect("valid params");
        let result = cusum.analyze(&[0.0, 1.0, 1.0]).expect("valid data");
        assert_eq!(result.upper_signal, vec![false, false, true]);
        assert_eq!(result.signal_points(), vec![2]);
    }

    #[test]
    fn test_cusum_step_shift_detected() {
        let cusum = Cusum::new(100.0, 5.0).expect("valid params");
        let mut data = vec![100.0; 50];
        for x in data.iter_mut().skip(20) {
            *x = 110.0;
        }
        let signals = cusum.analyze(&data).expect("valid data").signal_points();
        assert!(!signals.is_empty(), "CUSUM should detect a 2-sigma step shift");
        assert!(signals[0] >= 20 && signals[0] <= 30, "got {}", signals[0]);
    }

    #[test]
    fn test_cusum_downward_shift_uses_lower_sum() {
        let cusum = Cusum::new(50.0, 3.0).expect("valid params");
        let mut data = vec![50.0; 40];
        for x in data.iter_mut().skip(15) {
            *x = 44.0;
        }
        let result = cusum.analyze(&data).expect("valid data");
        assert!(result.lower_signal.iter().any(|&s| s));
        assert!(result.upper_signal.iter().all(|&s| !s));
    }

    #[test]
    fn test_cusum_invalid_params() {
        assert!(matches!(
            Cusum::new(0.0, 0.0),
            Err(QcError::InvalidParameter { name: "sd", .. })
        ));
        assert!(Cusum::new(0.0, -1.0).is_err());
        assert!(Cusum::new(0.0, f64::NAN).is_err());
        assert!(Cusum::new(f64::INFINITY, 1.0).is_err());
        assert!(Cusum::with_params(0.0, 1.0, -0.1, 5.0).is_err());
        assert!(Cusum::with_params(0.0, 1.0, 0.5, 0.0).is_err());
    }

    #[test]
    fn test_cusum_empty_and_non_finite() {
        let cusum = Cusum::new(0.0, 1.0).expect("valid params");
        assert!(matches!(cusum.analyze(&[]), Err(QcError::MissingData { .. })));
        assert!(matches!(
            cusum.analyze(&[0.0, f64::INFINITY]),
            Err(QcError::InvalidData { index: 1, .. })
        ));
    }

    #[test]
    fn test_cusum_reports_parameters() {
        let cusum = Cusum::with_params(0.0, 1.0, 0.25, 4.0).expect("valid params");
        let result = cusum.analyze(&[0.0]).expect("valid data");
        assert_eq!(result.k, 0.25);
        assert_eq!(result.h, 4.0);
        assert_eq!(cusum.k(), 0.25);
        assert_eq!(cusum.h(), 4.0);
    }
}
