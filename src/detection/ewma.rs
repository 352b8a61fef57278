//! Exponentially Weighted Moving Average (EWMA) chart for detecting small shifts.
//!
//! # Algorithm
//!
//! The EWMA statistic is seeded with the first observation:
//!
//! ```text
//! Z_1 = x_1
//! Z_i = lambda * x_i + (1 - lambda) * Z_{i-1}
//! ```
//!
//! Time-varying (exact) control limits, with 1-based `i`:
//!
//! ```text
//! UCL_i = mu_0 + L * sigma * sqrt(lambda * (1 - (1 - lambda)^(2*i)) / (2 - lambda))
//! LCL_i = mu_0 - L * sigma * sqrt(lambda * (1 - (1 - lambda)^(2*i)) / (2 - lambda))
//! ```
//!
//! The limits widen with `i` toward the asymptotic half-width
//! `L * sigma * sqrt(lambda / (2 - lambda))`, so they are recomputed for
//! every index.
//!
//! # Parameters
//!
//! - **lambda**: smoothing constant, one of 0.05, 0.1, 0.2, 0.3, 0.4, 0.5,
//!   0.75, 1.0.
//! - **L**: limit width, looked up from `lambda` (2.615 .. 3.090). The pairs
//!   give an in-control ARL of about 500 for each lambda.
//!
//! # Reference
//!
//! - Roberts, S.W. (1959). "Control Chart Tests Based on Geometric Moving Averages",
//!   *Technometrics* 1(3), pp. 239-250.
//! - Lucas, J.M. & Saccucci, M.S. (1990). "Exponentially Weighted Moving
//!   Average Control Schemes: Properties and Enhancements", *Technometrics*
//!   32(1), pp. 1-12.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{QcError, Result};

/// Supported smoothing constants and their limit multipliers `L`.
const LAMBDA_TABLE: [(f64, f64); 8] = [
    (0.05, 2.615),
    (0.1, 2.814),
    (0.2, 2.962),
    (0.3, 3.023),
    (0.4, 3.054),
    (0.5, 3.071),
    (0.75, 3.087),
    (1.0, 3.090),
];

/// Tolerance when matching a requested lambda against the table.
const LAMBDA_TOLERANCE: f64 = 1e-9;

/// EWMA chart parameters.
///
/// # Examples
///
/// ```
/// use u_iqc::detection::Ewma;
///
/// let ewma = Ewma::new(100.0, 2.0, 0.2).unwrap();
/// let result = ewma.analyze(&[100.0, 101.0, 99.5, 100.5]).unwrap();
/// assert_eq!(result.ewma[0], 100.0);
/// assert!(result.signal_points().is_empty());
///
/// // Only tabulated lambda values are accepted.
/// assert!(Ewma::new(100.0, 2.0, 0.15).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ewma {
    /// Center line (mu_0).
    mean: f64,
    /// Process standard deviation (sigma).
    sd: f64,
    /// Smoothing constant.
    lambda: f64,
    /// Control limit width factor, from the lambda table.
    l_factor: f64,
}

/// EWMA series and per-index limits, all the same length as the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EwmaResult {
    /// EWMA statistic Z_i.
    pub ewma: Vec<f64>,
    /// Upper control limit at each index.
    pub ucl: Vec<f64>,
    /// Lower control limit at each index.
    pub lcl: Vec<f64>,
    /// `Z_i >= UCL_i`.
    pub above: Vec<bool>,
    /// `Z_i <= LCL_i`.
    pub below: Vec<bool>,
    /// Smoothing constant used.
    pub lambda: f64,
    /// Limit multiplier used.
    pub l_factor: f64,
}

impl EwmaResult {
    /// Indices where the statistic reached either limit.
    pub fn signal_points(&self) -> Vec<usize> {
        self.above
            .iter()
            .zip(&self.below)
            .enumerate()
            .filter(|(_, (&a, &b))| a || b)
            .map(|(i, _)| i)
            .collect()
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.ewma.len()
    }

    /// Whether the result has no points.
    pub fn is_empty(&self) -> bool {
        self.ewma.is_empty()
    }
}

impl Ewma {
    /// Creates an EWMA chart centered on `mean` with spread `sd`.
    ///
    /// # Errors
    ///
    /// [`QcError::InvalidParameter`] if `mean` is not finite, `sd` is negative
    /// or not finite, or `lambda` is not one of
    /// [`supported_lambdas`](Self::supported_lambdas).
    pub fn new(mean: f64, sd: f64, lambda: f64) -> Result<Self> {
        if !mean.is_finite() {
            return Err(QcError::invalid("mean", "must be finite"));
        }
        if !sd.is_finite() || sd < 0.0 {
            return Err(QcError::invalid("sd", "must be finite and non-negative"));
        }
        let l_factor = Self::limit_multiplier(lambda)?;
        Ok(Self {
            mean,
            sd,
            lambda,
            l_factor,
        })
    }

    /// The smoothing constants with a tabulated limit multiplier.
    pub fn supported_lambdas() -> impl Iterator<Item = f64> {
        LAMBDA_TABLE.iter().map(|&(lambda, _)| lambda)
    }

    /// The limit multiplier `L` for `lambda`.
    ///
    /// # Errors
    ///
    /// [`QcError::InvalidParameter`] for a lambda outside the table.
    pub fn limit_multiplier(lambda: f64) -> Result<f64> {
        LAMBDA_TABLE
            .iter()
            .find(|&&(l, _)| (l - lambda).abs() < LAMBDA_TOLERANCE)
            .map(|&(_, factor)| factor)
            .ok_or_else(|| {
                warn!(lambda, "unsupported EWMA lambda");
                QcError::invalid(
                    "lambda",
                    format!(
                        "{lambda} is not supported; use one of 0.05, 0.1, 0.2, 0.3, 0.4, 0.5, 0.75, 1"
                    ),
                )
            })
    }

    /// Smoothing constant.
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Limit multiplier.
    pub fn l_factor(&self) -> f64 {
        self.l_factor
    }

    /// Control limit half-width at 1-based index `i`.
    fn control_limit_half_width(&self, i: usize) -> f64 {
        let decay = (1.0 - self.lambda).powi(2 * i as i32);
        let variance_factor = self.lambda * (1.0 - decay) / (2.0 - self.lambda);
        self.l_factor * self.sd * variance_factor.sqrt()
    }

    /// Computes the EWMA statistic and limits for every observation.
    ///
    /// # Errors
    ///
    /// - [`QcError::MissingData`] if `data` is empty.
    /// - [`QcError::InvalidData`] if any value is NaN or infinite.
    ///
    /// # Complexity
    ///
    /// Time: O(n), Space: O(n)
    pub fn analyze(&self, data: &[f64]) -> Result<EwmaResult> {
        if data.is_empty() {
            return Err(QcError::MissingData { what: "EWMA chart" });
        }
        if let Some((index, &value)) = data.iter().enumerate().find(|(_, x)| !x.is_finite()) {
            return Err(QcError::InvalidData { index, value });
        }

        let n = data.len();
        let mut result = EwmaResult {
            ewma: Vec::with_capacity(n),
            ucl: Vec::with_capacity(n),
            lcl: Vec::with_capacity(n),
            above: Vec::with_capacity(n),
            below: Vec::with_capacity(n),
            lambda: self.lambda,
            l_factor: self.l_factor,
        };

        let mut z = data[0];
        for (i, &x) in data.iter().enumerate() {
            if i > 0 {
                z = self.lambda * x + (1.0 - self.lambda) * z;
            }
            // i is 0-based, but the control limit formula uses 1-based indexing
            let half_width = self.control_limit_half_width(i + 1);
            let ucl = self.mean + half_width;
            let lcl = self.mean - half_width;

            result.ewma.push(z);
            result.ucl.push(ucl);
            result.lcl.push(lcl);
            result.above.push(z >= ucl);
            result.below.push(z <= lcl);
        }

        debug!(
            n,
            lambda = self.lambda,
            signals = result.signal_points().len(),
            "EWMA chart"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ewma_lambda_1_reproduces_series() {
        let ewma = Ewma::new(50.0, 5.0, 1.0).expect("valid params");
        let data = [50.0, 55.0, 45.0, 70.0, 30.0];
        let result = ewma.analyze(&data).expect("valid data");
        for (i, (&z, &x)) in result.ewma.iter().zip(&data).enumerate() {
            assert!(
                (z - x).abs() < 1e-12,
                "with lambda=1, Z_{i}={z} should equal x_{i}={x}"
            );
        }
        // lambda = 1: half-width = 3.090 * 5 * sqrt(1 * (1 - 0) / 1) = 15.45
        assert!((result.ucl[0] - 65.45).abs() < 1e-9);
        assert!(result.above[3], "70 should exceed UCL of 65.45");
        assert!(result.below[4], "30 should fall below LCL of 34.55");
        assert_eq!(result.signal_points(), vec![3, 4]);
    }

    #[test]
    fn test_ewma_seeded_with_first_value() {
        let ewma = Ewma::new(0.0, 1.0, 0.2).expect("valid params");
        let result = ewma.analyze(&[10.0, 0.0]).expect("valid data");
        assert_eq!(result.ewma[0], 10.0);
        // Z_2 = 0.2 * 0 + 0.8 * 10 = 8
        assert!((result.ewma[1] - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_ewma_limits_first_index() {
        // lambda=0.2, L=2.962: sqrt(0.2 * (1 - 0.64) / 1.8) = sqrt(0.04) = 0.2
        let ewma = Ewma::new(0.0, 1.0, 0.2).expect("valid params");
        let result = ewma.analyze(&[0.0]).expect("valid data");
        assert!((result.ucl[0] - 2.962 * 0.2).abs() < 1e-12);
        assert!((result.lcl[0] + 2.962 * 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_ewma_time_varying_limits_converge() {
        let lambda = 0.1;
        let ewma = Ewma::new(0.0, 1.0, lambda).expect("valid params");
        let asymptotic_hw = 2.814 * (lambda / (2.0 - lambda)).sqrt();

        let result = ewma.analyze(&vec![0.0; 200]).expect("valid data");
        assert!(result.ucl[0] < asymptotic_hw);
        assert!((result.ucl[199] - asymptotic_hw).abs() < 1e-6);
        for i in 1..result.len() {
            assert!(
                result.ucl[i] >= result.ucl[i - 1] - 1e-15,
                "UCL should be non-decreasing at {i}"
            );
        }
    }

    #[test]
    fn test_ewma_limits_symmetric() {
        let ewma = Ewma::new(42.0, 3.0, 0.3).expect("valid params");
        let result = ewma.analyze(&[42.0; 20]).expect("valid data");
        for (ucl, lcl) in result.ucl.iter().zip(&result.lcl) {
            assert!(((ucl - 42.0) - (42.0 - lcl)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_ewma_step_shift_detected() {
        let ewma = Ewma::new(0.0, 1.0, 0.2).expect("valid params");
        let mut data = vec![0.0; 50];
        for x in data.iter_mut().skip(20) {
            *x = 2.0;
        }
        let signals = ewma.analyze(&data).expect("valid data").signal_points();
        assert!(!signals.is_empty(), "EWMA should detect a 2-sigma step shift");
        assert!(signals[0] >= 20, "no signal before the shift, got {}", signals[0]);
    }

    #[test]
    fn test_ewma_downward_shift_flags_below() {
        let ewma = Ewma::new(0.0, 1.0, 0.2).expect("valid params");
        let mut data = vec![0.0; 30];
        for x in data.iter_mut().skip(10) {
            *x = -2.0;
        }
        let result = ewma.analyze(&data).expect("valid data");
        assert!(result.below.iter().any(|&b| b));
        assert!(result.above.iter().all(|&a| !a));
    }

    #[test]
    fn test_ewma_supported_lambdas() {
        let lambdas: Vec<f64> = Ewma::supported_lambdas().collect();
        assert_eq!(lambdas, vec![0.05, 0.1, 0.2, 0.3, 0.4, 0.5, 0.75, 1.0]);
        for lambda in lambdas {
            assert!(Ewma::new(0.0, 1.0, lambda).is_ok());
        }
        assert_eq!(Ewma::limit_multiplier(0.75).expect("tabulated"), 3.087);
    }

    #[test]
    fn test_ewma_invalid_params() {
        for lambda in [0.0, 0.15, 0.25, 1.1, -0.2, f64::NAN] {
            assert!(
                matches!(
                    Ewma::new(0.0, 1.0, lambda),
                    Err(QcError::InvalidParameter { name: "lambda", .. })
                ),
                "lambda {lambda} should be rejected"
            );
        }
        assert!(Ewma::new(0.0, -1.0, 0.2).is_err());
        assert!(Ewma::new(f64::NAN, 1.0, 0.2).is_err());
        assert!(Ewma::new(0.0, f64::INFINITY, 0.2).is_err());
    }

    #[test]
    fn test_ewma_empty_data() {
        let ewma = Ewma::new(0.0, 1.0, 0.2).expect("valid params");
        assert!(matches!(ewma.analyze(&[]), Err(QcError::MissingData { .. })));
    }

    #[test]
    fn test_ewma_non_finite_data_rejected() {
        let ewma = Ewma::new(0.0, 1.0, 0.2).expect("valid params");
        let err = ewma.analyze(&[0.0, 1.0, f64::NAN]).unwrap_err();
        assert!(matches!(err, QcError::InvalidData { index: 2, .. }));
    }

    #[test]
    fn test_ewma_zero_sd_collapses_limits() {
        let ewma = Ewma::new(5.0, 0.0, 0.5).expect("sd = 0 is allowed");
        let result = ewma.analyze(&[5.0, 5.0]).expect("valid data");
        assert_eq!(result.ucl, vec![5.0, 5.0]);
        // Z sits exactly on both collapsed limits.
        assert_eq!(result.above, vec![true, true]);
        assert_eq!(result.below, vec![true, true]);
    }
}
