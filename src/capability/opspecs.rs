//! Operating Specifications (OPSpecs) chart coordinates.
//!
//! An OPSpecs chart plots allowable bias (y) against allowable imprecision
//! (x). For a sigma level `n`, every point on the line from `(TEa/n, 0)` to
//! `(0, TEa)` satisfies `(TEa - bias) / CV = n`; the chart draws these lines
//! for n = 2..=6 and places the method's operating point among them.
//!
//! The normalized chart expresses bias and CV as a percentage of each test's
//! own TEa, so tests with different quality requirements share one chart
//! whose lines are fixed at `(100/n, 0)` to `(0, 100)`.
//!
//! # References
//!
//! - Westgard, J.O. (1992). "Charts of operational process specifications
//!   (OPSpecs charts) for assessing the precision, accuracy, and quality
//!   control needed to satisfy proficiency testing performance criteria",
//!   *Clinical Chemistry* 38(7), pp. 1226-1233.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::sigma_metric::sigma_metric;
use crate::error::{QcError, Result};

/// Sigma levels drawn on an OPSpecs chart.
pub const SIGMA_LEVELS: [u8; 5] = [2, 3, 4, 5, 6];

/// Scale of the normalized chart axes.
pub const NORMALIZED_SCALE: f64 = 100.0;

/// One iso-sigma line, from `(x_intercept, 0)` to `(0, y_intercept)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpSpecsLine {
    /// Sigma level of the line.
    pub sigma: u8,
    /// Imprecision where the line meets the x axis (`TEa / sigma`).
    pub x_intercept: f64,
    /// Bias where the line meets the y axis (`TEa`).
    pub y_intercept: f64,
    /// Where the sigma label sits: `(x/2 + x/20, TEa/2)`.
    pub label_anchor: (f64, f64),
}

impl OpSpecsLine {
    fn new(tea: f64, sigma: u8) -> Self {
        let x = tea / f64::from(sigma);
        Self {
            sigma,
            x_intercept: x,
            y_intercept: tea,
            label_anchor: (x / 2.0 + x / 20.0, tea / 2.0),
        }
    }

    /// End points of the line, x-axis end first.
    pub fn endpoints(&self) -> [(f64, f64); 2] {
        [(self.x_intercept, 0.0), (0.0, self.y_intercept)]
    }

    /// Bias on this line at imprecision `cv`.
    pub fn bias_at(&self, cv: f64) -> f64 {
        self.y_intercept - f64::from(self.sigma) * cv
    }
}

/// Axes and iso-sigma lines of an OPSpecs chart for one TEa.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpSpecsChart {
    /// Total allowable error the chart is drawn for.
    pub tea: f64,
    /// Iso-sigma lines for n = 2..=6.
    pub lines: Vec<OpSpecsLine>,
    /// Imprecision axis, `[0, TEa/2]`.
    pub x_axis: (f64, f64),
    /// Bias axis, `[0, TEa]`.
    pub y_axis: (f64, f64),
    /// Imprecision axis padded by 20% for display.
    pub x_view: (f64, f64),
    /// Bias axis padded by 10% for display.
    pub y_view: (f64, f64),
}

/// A method's position on an OPSpecs chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperatingPoint {
    /// Imprecision (%CV).
    pub cv: f64,
    /// Bias (%).
    pub bias: f64,
    /// Conventional sigma-metric, `None` when it is not defined.
    pub sigma: Option<f64>,
}

impl OpSpecsChart {
    /// Builds the chart for `tea`.
    ///
    /// # Errors
    ///
    /// [`QcError::InvalidParameter`] if `tea` is not positive and finite.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_iqc::capability::OpSpecsChart;
    ///
    /// let chart = OpSpecsChart::new(12.0).unwrap();
    /// assert_eq!(chart.lines.len(), 5);
    /// assert_eq!(chart.lines[0].endpoints(), [(6.0, 0.0), (0.0, 12.0)]);
    /// assert_eq!(chart.x_axis, (0.0, 6.0));
    /// ```
    pub fn new(tea: f64) -> Result<Self> {
        if !tea.is_finite() || tea <= 0.0 {
            return Err(QcError::invalid("tea", "must be positive and finite"));
        }
        let x_max = tea / 2.0;
        Ok(Self {
            tea,
            lines: SIGMA_LEVELS
                .iter()
                .map(|&sigma| OpSpecsLine::new(tea, sigma))
                .collect(),
            x_axis: (0.0, x_max),
            y_axis: (0.0, tea),
            x_view: (0.0, x_max * 1.2),
            y_view: (0.0, tea * 1.1),
        })
    }

    /// The chart shared by every normalized test (TEa = 100).
    pub fn normalized() -> Self {
        let x_max = NORMALIZED_SCALE / 2.0;
        Self {
            tea: NORMALIZED_SCALE,
            lines: SIGMA_LEVELS
                .iter()
                .map(|&sigma| OpSpecsLine::new(NORMALIZED_SCALE, sigma))
                .collect(),
            x_axis: (0.0, x_max),
            y_axis: (0.0, NORMALIZED_SCALE),
            x_view: (0.0, x_max * 1.2),
            y_view: (0.0, NORMALIZED_SCALE * 1.1),
        }
    }

    /// The method's point at imprecision `cv` and bias `bias`.
    pub fn operating_point(&self, cv: f64, bias: f64) -> OperatingPoint {
        OperatingPoint {
            cv,
            bias,
            sigma: sigma_metric(self.tea, bias, cv).ok(),
        }
    }
}

/// One test row of a normalized OPSpecs chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedTest {
    /// Test name shown beside the point.
    pub name: String,
    /// Bias (%).
    pub bias: f64,
    /// Imprecision (%CV).
    pub cv: f64,
    /// Total allowable error (%).
    pub tea: f64,
}

impl NormalizedTest {
    pub fn new(name: impl Into<String>, bias: f64, cv: f64, tea: f64) -> Self {
        Self {
            name: name.into(),
            bias,
            cv,
            tea,
        }
    }
}

/// A test placed on the normalized chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub name: String,
    /// `100 * bias / TEa`.
    pub normalized_bias: f64,
    /// `100 * CV / TEa`.
    pub normalized_cv: f64,
    /// `(TEa - bias) / CV`, `None` when bias meets or exceeds TEa.
    pub sigma: Option<f64>,
}

/// Normalized OPSpecs chart with its test points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedOpSpecs {
    pub chart: OpSpecsChart,
    pub points: Vec<NormalizedPoint>,
}

/// Normalizes each test against its own TEa.
///
/// # Errors
///
/// [`QcError::InvalidParameter`] for the first row whose TEa is not
/// positive, whose CV is zero, or with a non-finite value. The reason names
/// the offending test.
///
/// # Examples
///
/// ```
/// use u_iqc::capability::{normalized_opspecs, NormalizedTest};
///
/// let chart = normalized_opspecs(&[NormalizedTest::new("Glucose", 2.0, 2.0, 10.0)]).unwrap();
/// let point = &chart.points[0];
/// assert_eq!(point.normalized_bias, 20.0);
/// assert_eq!(point.normalized_cv, 20.0);
/// assert_eq!(point.sigma, Some(4.0));
/// ```
pub fn normalized_opspecs(tests: &[NormalizedTest]) -> Result<NormalizedOpSpecs> {
    let points = tests
        .iter()
        .map(normalize)
        .collect::<Result<Vec<_>>>()?;
    debug!(tests = points.len(), "normalized OPSpecs");
    Ok(NormalizedOpSpecs {
        chart: OpSpecsChart::normalized(),
        points,
    })
}

fn normalize(test: &NormalizedTest) -> Result<NormalizedPoint> {
    if !test.tea.is_finite() || test.tea <= 0.0 {
        return Err(QcError::invalid(
            "tea",
            format!("test '{}': must be positive and finite", test.name),
        ));
    }
    if !test.bias.is_finite() || !test.cv.is_finite() {
        return Err(QcError::invalid(
            "bias",
            format!("test '{}': bias and CV must be finite", test.name),
        ));
    }
    if test.cv == 0.0 {
        return Err(QcError::invalid(
            "cv",
            format!("test '{}': imprecision cannot be zero", test.name),
        ));
    }
    let sigma = match sigma_metric(test.tea, test.bias, test.cv) {
        Ok(sigma) => Some(sigma),
        Err(QcError::DegenerateMetric { .. }) => None,
        Err(err) => return Err(err),
    };
    if sigma.is_none() {
        warn!(test = %test.name, "bias meets TEa; sigma not defined");
    }
    Ok(NormalizedPoint {
        name: test.name.clone(),
        normalized_bias: NORMALIZED_SCALE * test.bias / test.tea,
        normalized_cv: NORMALIZED_SCALE * test.cv / test.tea,
        sigma,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_lines_for_tea() {
        let chart = OpSpecsChart::new(12.0).expect("valid TEa");
        let x: Vec<f64> = chart.lines.iter().map(|l| l.x_intercept).collect();
        assert_eq!(x, vec![6.0, 4.0, 3.0, 2.4, 2.0]);
        assert!(chart.lines.iter().all(|l| l.y_intercept == 12.0));
        assert_eq!(chart.y_axis, (0.0, 12.0));
    }

    #[test]
    fn test_chart_view_is_padded() {
        let chart = OpSpecsChart::new(10.0).expect("valid TEa");
        assert!((chart.x_view.1 - 6.0).abs() < 1e-12);
        assert!((chart.y_view.1 - 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_label_anchor_matches_line() {
        let chart = OpSpecsChart::new(20.0).expect("valid TEa");
        // sigma 2 line meets x at 10: anchor (5 + 0.5, 10)
        assert_eq!(chart.lines[0].label_anchor, (5.5, 10.0));
    }

    #[test]
    fn test_points_on_line_have_line_sigma() {
        let chart = OpSpecsChart::new(12.0).expect("valid TEa");
        for line in &chart.lines {
            let cv = line.x_intercept / 2.0;
            let bias = line.bias_at(cv);
            let sigma = sigma_metric(12.0, bias, cv).expect("defined");
            assert!((sigma - f64::from(line.sigma)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_invalid_tea_rejected() {
        assert!(OpSpecsChart::new(0.0).is_err());
        assert!(OpSpecsChart::new(-5.0).is_err());
        assert!(OpSpecsChart::new(f64::NAN).is_err());
    }

    #[test]
    fn test_operating_point_sigma() {
        let chart = OpSpecsChart::new(12.0).expect("valid TEa");
        assert_eq!(chart.operating_point(2.0, 2.0).sigma, Some(5.0));
        assert_eq!(chart.operating_point(2.0, 13.0).sigma, None);
        assert_eq!(chart.operating_point(0.0, 1.0).sigma, None);
    }

    #[test]
    fn test_normalized_chart_is_fixed() {
        let chart = OpSpecsChart::normalized();
        let x: Vec<f64> = chart.lines.iter().map(|l| l.x_intercept).collect();
        assert_eq!(x[0], 50.0);
        assert_eq!(x[1], 100.0 / 3.0);
        assert_eq!(x[4], 100.0 / 6.0);
        assert_eq!(chart.x_axis, (0.0, 50.0));
        assert_eq!(chart.y_axis, (0.0, 100.0));
        assert_eq!(chart, OpSpecsChart::new(100.0).expect("valid TEa"));
    }

    #[test]
    fn test_normalized_rows() {
        let result = normalized_opspecs(&[
            NormalizedTest::new("ALT", 3.0, 4.0, 20.0),
            NormalizedTest::new("Na", 1.0, 0.5, 4.0),
        ])
        .expect("valid rows");
        assert_eq!(result.points[0].normalized_bias, 15.0);
        assert_eq!(result.points[0].normalized_cv, 20.0);
        assert_eq!(result.points[0].sigma, Some(4.25));
        assert_eq!(result.points[1].normalized_bias, 25.0);
        assert_eq!(result.points[1].normalized_cv, 12.5);
        assert_eq!(result.points[1].sigma, Some(6.0));
    }

    #[test]
    fn test_normalized_degenerate_row_has_no_sigma() {
        let result = normalized_opspecs(&[NormalizedTest::new("TSH", 12.0, 2.0, 10.0)])
            .expect("degenerate sigma is not an error for plotting");
        assert_eq!(result.points[0].sigma, None);
        assert_eq!(result.points[0].normalized_bias, 120.0);
    }

    #[test]
    fn test_normalized_zero_cv_names_test() {
        let err = normalized_opspecs(&[NormalizedTest::new("K", 1.0, 0.0, 5.0)]).unwrap_err();
        match err {
            QcError::InvalidParameter { name, reason } => {
                assert_eq!(name, "cv");
                assert!(reason.contains("'K'"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_normalized_zero_tea_rejected() {
        assert!(normalized_opspecs(&[NormalizedTest::new("Ca", 1.0, 1.0, 0.0)]).is_err());
    }

    #[test]
    fn test_normalized_empty_table() {
        let result = normalized_opspecs(&[]).expect("empty table is fine");
        assert!(result.points.is_empty());
        assert_eq!(result.chart.lines.len(), 5);
    }
}
