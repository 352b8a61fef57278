//! # u-iqc
//!
//! Internal quality control (IQC) for clinical laboratory measurements:
//! Levey-Jennings charts with Westgard rules, EWMA and CUSUM drift
//! detection, sigma-metrics, and OPSpecs charts.
//!
//! The crate is a pure computation layer. It operates on plain `f64`
//! control values and returns limits, per-point violation masks, chart
//! series, and scalar metrics; rendering and data entry belong to the
//! caller.
//!
//! ## Modules
//!
//! - [`series`]: observations and the prepared value series
//! - [`spc`]: control limits, Westgard rules, performance summary
//! - [`detection`]: EWMA and CUSUM charts
//! - [`capability`]: sigma-metrics and OPSpecs charts
//! - [`config`]: rule toggles and chart parameters
//! - [`analysis`]: one-call evaluation of a control run
//! - [`numeric`]: report rounding and CV helpers
//!
//! ## Example
//!
//! ```
//! use u_iqc::series::Series;
//! use u_iqc::spc::{LimitMode, LimitSet, WestgardRule, WestgardRules};
//!
//! let series = Series::from(vec![100.0, 101.0, 99.0, 100.0, 107.0]);
//! let limits = LimitSet::compute(&series, LimitMode::Custom { mean: 100.0, sd: 2.0 }).unwrap();
//! let mask = WestgardRules::all().evaluate(&series, &limits).unwrap();
//! assert_eq!(mask.flagged(WestgardRule::OneThreeS), vec![4]);
//! ```

pub mod analysis;
pub mod capability;
pub mod config;
pub mod detection;
pub mod error;
pub mod numeric;
pub mod series;
pub mod spc;

pub use error::{QcError, Result};
