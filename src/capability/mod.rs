//! Analytical performance: sigma-metrics and OPSpecs charts.
//!
//! These calculators take scalar performance figures (bias, imprecision,
//! allowable error, biological variation) and are independent of any
//! control series.
//!
//! # Sigma-metrics
//!
//! - [`sigma_metric`]: `(TEa - bias) / CV`
//! - [`biological_sigma_metric`]: `CVI / CV`
//! - [`SigmaGrade`]: band of a sigma value
//!
//! # OPSpecs
//!
//! - [`OpSpecsChart`]: iso-sigma lines for one TEa
//! - [`normalized_opspecs`]: several tests on one chart normalized to TEa
//!
//! # References
//!
//! - Westgard, J.O. (1992), *Clinical Chemistry* 38(7), pp. 1226-1233.

mod opspecs;
mod sigma_metric;

pub use opspecs::{
    normalized_opspecs, NormalizedOpSpecs, NormalizedPoint, NormalizedTest, OpSpecsChart,
    OpSpecsLine, OperatingPoint, NORMALIZED_SCALE, SIGMA_LEVELS,
};
pub use sigma_metric::{biological_sigma_metric, sigma_metric, SigmaGrade};
