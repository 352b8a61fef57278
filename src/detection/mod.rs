//! Shift detection charts.
//!
//! Algorithms for detecting small sustained shifts of the control mean that
//! the Westgard rules are slow to catch.
//!
//! # Charts
//!
//! - [`Ewma`]: Exponentially Weighted Moving Average chart (Roberts, 1959)
//!   with per-index control limits
//! - [`Cusum`]: tabular Cumulative Sum chart (Page, 1954)
//!
//! # References
//!
//! - Page, E.S. (1954). "Continuous Inspection Schemes",
//!   *Biometrika* 41(1/2), pp. 100-115.
//! - Roberts, S.W. (1959). "Control Chart Tests Based on Geometric Moving Averages",
//!   *Technometrics* 1(3), pp. 239-250.

mod cusum;
mod ewma;

pub use cusum::{Cusum, CusumResult, DEFAULT_H, DEFAULT_K};
pub use ewma::{Ewma, EwmaResult};
